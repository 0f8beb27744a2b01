use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Output sink for edited streams: a file, or stdout for "-"
pub struct OutputWriter {
    writer: Box<dyn Write>,
    is_pipe: bool,
}

impl OutputWriter {
    pub fn new<P: AsRef<Path>>(output_path: P) -> Result<Self> {
        let path = output_path.as_ref();
        let is_pipe = path.to_string_lossy() == "-";

        let writer: Box<dyn Write> = if is_pipe {
            Box::new(io::stdout().lock())
        } else {
            let file =
                File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        };

        Ok(Self { writer, is_pipe })
    }

    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }

    /// Write the complete buffer and flush it.
    pub fn write_all(mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        Ok(())
    }
}
