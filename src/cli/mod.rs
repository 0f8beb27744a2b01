use std::path::Path;

use anyhow::{Result, bail};
use mpa::process::stream::Stream;

use crate::input::InputReader;
use crate::output::OutputWriter;
use crate::timestamp::time_str;
use command::Cli;

pub mod command;
pub mod edit;
pub mod info;

/// Reads a whole input into a [`Stream`] and indexes it.
///
/// With `--strict`, interior resynchronization is an error.
pub fn load_stream(input: &Path, cli: &Cli) -> Result<Stream> {
    let mut reader = InputReader::new(input)?;
    let data = reader.read_all()?;
    let source = if reader.is_pipe() {
        "stdin".to_string()
    } else {
        input.display().to_string()
    };

    let mut stream = Stream::from_bytes(data);
    let frames = stream.frame_count();
    log::info!(
        "Loaded {source}: {} bytes, {frames} frames, {}",
        stream.len(),
        time_str(stream.total_duration())
    );

    check_sync(&mut stream, &source, cli.strict)?;

    Ok(stream)
}

/// Reports interior resynchronization, failing on it when `strict` is set.
fn check_sync(stream: &mut Stream, source: &str, strict: bool) -> Result<()> {
    let resyncs = stream.resync_count();
    if resyncs > 0 {
        let skipped = stream.skipped_bytes();
        if strict {
            bail!("{source}: lost sync {resyncs} times, {skipped} bytes are not audio frames");
        }
        log::warn!("{source}: lost sync {resyncs} times, skipped {skipped} bytes");
    }

    Ok(())
}

/// Closes `stream` and writes its bytes to `output`.
pub fn save_stream(mut stream: Stream, output: &Path) -> Result<()> {
    let frames = stream.frame_count();
    let duration = stream.total_duration();
    let data = stream.close();

    let writer = OutputWriter::new(output)?;
    let target = if writer.is_pipe() {
        "stdout".to_string()
    } else {
        output.display().to_string()
    };
    writer.write_all(&data)?;

    log::info!(
        "Wrote {target}: {} bytes, {frames} frames, {}",
        data.len(),
        time_str(duration)
    );

    Ok(())
}
