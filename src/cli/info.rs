use anyhow::{Context, Result};
use mpa::process::stream::Stream;
use mpa::structs::header::FrameHeader;
use serde::Serialize;

use super::command::{Cli, InfoArgs, ReportFormat};
use super::load_stream;
use crate::timestamp::time_str;

pub fn cmd_info(args: &InfoArgs, cli: &Cli) -> Result<()> {
    log::info!("Analyzing MPEG audio stream: {}", args.input.display());

    let mut stream = load_stream(&args.input, cli)?;
    let report = StreamReport::collect(&mut stream, args.frames);

    match args.format {
        ReportFormat::Plain => match &report.format {
            Some(_) => display_report(&report),
            None => {
                println!("No MPEG audio frame sync found in the file.");
                println!("This doesn't appear to be a valid MPEG audio stream.");
            }
        },
        ReportFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(&report).context("Cannot serialize report")?;
            print!("{yaml}");
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct StreamReport {
    size: usize,
    frames: usize,
    duration: f64,
    /// Bits per second over the frame region.
    average_bit_rate: Option<u32>,
    leading_tag_bytes: Option<usize>,
    trailing_tag_bytes: Option<usize>,
    resyncs: usize,
    skipped_bytes: usize,
    format: Option<FormatInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    frame_list: Vec<FrameInfo>,
}

/// Parameters of the first frame.
#[derive(Debug, Serialize)]
struct FormatInfo {
    version: String,
    layer: String,
    bit_rate: u32,
    sample_rate: u32,
    channel_mode: String,
    channels: usize,
    samples_per_frame: usize,
    protected: bool,
    copyright: bool,
    original: bool,
    emphasis: String,
}

#[derive(Debug, Serialize)]
struct FrameInfo {
    index: usize,
    offset: usize,
    length: usize,
    bit_rate: u32,
    start: f64,
}

impl StreamReport {
    fn collect(stream: &mut Stream, with_frames: bool) -> Self {
        let leading = stream.leading_tag_bytes().map(|bytes| bytes.len());
        let trailing = stream.trailing_tag_bytes().map(|bytes| bytes.len());
        let format = stream.frame_header(0).as_ref().map(FormatInfo::from_header);

        let frames = stream.frame_count();
        let duration = stream.total_duration();
        let audio_bytes = stream.len() - leading.unwrap_or(0) - trailing.unwrap_or(0);
        let average_bit_rate =
            (duration > 0.0).then(|| (audio_bytes as f64 * 8.0 / duration).round() as u32);

        let mut frame_list = Vec::new();
        if with_frames {
            let mut starts = vec![0.0];
            starts.extend_from_slice(stream.frame_timings());
            starts.truncate(frames);
            for (index, start) in starts.into_iter().enumerate() {
                let Some(header) = stream.frame_header(index) else {
                    continue;
                };
                frame_list.push(FrameInfo {
                    index,
                    offset: header.offset,
                    length: header.length,
                    bit_rate: header.bit_rate,
                    start,
                });
            }
        }

        Self {
            size: stream.len(),
            frames,
            duration,
            average_bit_rate,
            leading_tag_bytes: leading,
            trailing_tag_bytes: trailing,
            resyncs: stream.resync_count(),
            skipped_bytes: stream.skipped_bytes(),
            format,
            frame_list,
        }
    }
}

impl FormatInfo {
    fn from_header(header: &FrameHeader) -> Self {
        Self {
            version: header.version.to_string(),
            layer: header.layer.to_string(),
            bit_rate: header.bit_rate,
            sample_rate: header.sample_rate,
            channel_mode: header.channel_mode.to_string(),
            channels: header.channels(),
            samples_per_frame: header.samples_per_frame(),
            protected: header.protected,
            copyright: header.copyright,
            original: header.original,
            emphasis: header.emphasis.to_string(),
        }
    }
}

fn display_report(report: &StreamReport) {
    println!();
    println!("MPEG Audio Stream Information");
    println!("=============================");
    println!();

    if let Some(format) = &report.format {
        display_format_info(format);
    }

    println!("Analysis Summary");
    println!("  Frames                    {}", report.frames);
    let size_mb = report.size as f64 / 1_000_000.0;
    println!("  Size                      {size_mb:.2} MB ({} bytes)", report.size);
    println!("  Duration                  {}", time_str(report.duration));
    if let Some(bit_rate) = report.average_bit_rate {
        println!(
            "  Average bit rate          {:.1} kbps",
            bit_rate as f64 / 1000.0
        );
    }
    if let Some(leading) = report.leading_tag_bytes {
        println!("  Leading tag bytes         {leading}");
    }
    if let Some(trailing) = report.trailing_tag_bytes {
        println!("  Trailing tag bytes        {trailing}");
    }
    if report.resyncs > 0 {
        println!(
            "  Resynchronized            {} times, {} bytes skipped",
            report.resyncs, report.skipped_bytes
        );
    }
    println!();

    if !report.frame_list.is_empty() {
        display_frame_list(&report.frame_list);
    }
}

fn display_format_info(format: &FormatInfo) {
    println!("Stream Information");
    println!("  Format                    {} {}", format.version, format.layer);
    println!("  Bit rate                  {} kbps", format.bit_rate / 1000);
    println!("  Sampling rate             {} Hz", format.sample_rate);
    println!("  Channel mode              {}", format.channel_mode);
    println!("  Number of channels        {}", format.channels);
    println!("  Samples per frame         {}", format.samples_per_frame);
    println!("  CRC protected             {}", format.protected);
    println!("  Copyright                 {}", format.copyright);
    println!("  Original                  {}", format.original);
    println!("  Emphasis                  {}", format.emphasis);
    println!();
}

fn display_frame_list(frames: &[FrameInfo]) {
    println!("Frames");
    println!("  {:>8}  {:>10}  {:>6}  {:>8}  Start", "Index", "Offset", "Length", "kbps");
    for frame in frames {
        println!(
            "  {:>8}  {:>10}  {:>6}  {:>8}  {}",
            frame.index,
            frame.offset,
            frame.length,
            frame.bit_rate / 1000,
            time_str(frame.start)
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpa::process::{EXAMPLE_HEADER, synth_stream};

    #[test]
    fn report_counts_tags_and_frames() {
        let mut data = b"ID3 leading".to_vec();
        data.extend(synth_stream(EXAMPLE_HEADER, 10).unwrap());
        data.extend_from_slice(b"TAG trailing");

        let mut stream = Stream::from_bytes(data);
        let report = StreamReport::collect(&mut stream, true);

        assert_eq!(report.frames, 10);
        assert_eq!(report.leading_tag_bytes, Some(11));
        assert_eq!(report.trailing_tag_bytes, Some(12));
        assert_eq!(report.average_bit_rate, Some(128_000));
        assert_eq!(report.frame_list.len(), 10);
        assert_eq!(report.frame_list[1].offset, 11 + 417);
        assert_eq!(report.frame_list[0].start, 0.0);
        assert!((report.frame_list[2].start - 2.0 * 0.026_062_5).abs() < 1e-9);

        let format = report.format.unwrap();
        assert_eq!(format.version, "MPEG-1");
        assert_eq!(format.sample_rate, 44100);
        assert_eq!(format.channels, 2);
    }

    #[test]
    fn report_without_frames() {
        let mut stream = Stream::from_bytes(b"not audio at all".to_vec());
        let report = StreamReport::collect(&mut stream, false);

        assert_eq!(report.frames, 0);
        assert!(report.format.is_none());
        assert_eq!(report.leading_tag_bytes, None);
        assert_eq!(report.average_bit_rate, None);

        let yaml = serde_yaml_ng::to_string(&report).unwrap();
        assert!(yaml.contains("frames: 0"));
        assert!(!yaml.contains("frame_list"));
    }
}
