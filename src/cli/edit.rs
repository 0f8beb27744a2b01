use std::fs;

use anyhow::{Context, Result, bail};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mpa::process::stream::Stream;

use super::command::{Cli, ConcatArgs, CutArgs, StripArgs, TagsArgs, TrimArgs};
use super::{load_stream, save_stream};
use crate::timestamp::time_str;

pub fn cmd_strip(args: &StripArgs, cli: &Cli) -> Result<()> {
    let mut stream = load_stream(&args.input, cli)?;
    if stream.frame_count() == 0 {
        bail!("No MPEG audio frames found in {}", args.input.display());
    }

    let before = stream.len();
    stream.strip_tags();
    log::info!("Stripped {} bytes of tags", before - stream.len());

    save_stream(stream, &args.output)
}

pub fn cmd_trim(args: &TrimArgs, cli: &Cli) -> Result<()> {
    let mut stream = load_stream(&args.input, cli)?;

    let before = stream.total_duration();
    stream.trim(args.start, args.duration);
    log::info!(
        "Trimmed {} to {}",
        time_str(before),
        time_str(stream.total_duration())
    );

    save_stream(stream, &args.output)
}

pub fn cmd_cut(args: &CutArgs, cli: &Cli) -> Result<()> {
    let mut stream = load_stream(&args.input, cli)?;

    let frames = stream.frame_count();
    let removed = stream.remove_frames(args.index, args.count);
    if removed == 0 {
        let (start, end) = requested_range(args.index, args.count);
        log::warn!("Nothing removed: requested frames {start}..{end}, stream has {frames} frames");
    } else {
        log::info!("Removed {removed} frames");
    }

    save_stream(stream, &args.output)
}

/// Frame range `remove_frames` is asked for, before clamping to the stream.
fn requested_range(index: isize, count: isize) -> (isize, isize) {
    if count < 0 {
        (index.saturating_add(count), index)
    } else {
        (index, index.saturating_add(count))
    }
}

pub fn cmd_concat(args: &ConcatArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let pb = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new(args.inputs.len() as u64));
            pb.set_style(ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?);
            Some(pb)
        }
        None => None,
    };

    let mut output = Stream::new();
    for input in &args.inputs {
        if let Some(pb) = &pb {
            pb.set_message(input.display().to_string());
        }

        let source = load_stream(input, cli)?;
        if output.is_empty() {
            // The first input keeps its tags around the joined frames
            output = source;
        } else {
            let appended = output.append_from(&source, 0, None);
            if appended == 0 {
                log::warn!("{}: no frames to append", input.display());
            }
        }

        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    save_stream(output, &args.output)
}

pub fn cmd_tags(args: &TagsArgs, cli: &Cli) -> Result<()> {
    let mut stream = load_stream(&args.input, cli)?;

    let (Some(leading), Some(trailing)) =
        (stream.leading_tag_bytes(), stream.trailing_tag_bytes())
    else {
        bail!("No MPEG audio frames found in {}", args.input.display());
    };

    println!("Leading tag bytes           {}", leading.len());
    println!("Trailing tag bytes          {}", trailing.len());

    for (path, bytes) in [(&args.leading, &leading), (&args.trailing, &trailing)] {
        if let Some(path) = path {
            fs::write(path, bytes).with_context(|| format!("Cannot write {}", path.display()))?;
            log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
        }
    }

    Ok(())
}
