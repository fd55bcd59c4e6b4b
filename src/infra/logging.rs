// ============================================================
// Layer 6 — Log Sink
// ============================================================
// All output goes through `tracing`. The subscriber writes to
// stderr through a `LogSink`; once the trainer knows where the
// run directory is, it calls `attach_file` and every following
// line is mirrored into {save_root}/info.log as well.
//
// The file is attached after the run directory has been reset,
// never before, so the reset cannot delete an open log.

use anyhow::{anyhow, Context, Result};
use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::Path,
    sync::{Arc, Mutex},
};
use tracing_subscriber::{fmt::MakeWriter, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "genre_classifier=info";

/// Cloneable handle to the process-wide log destination.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    file: Arc<Mutex<Option<File>>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror every following log line into `path` (appending).
    pub fn attach_file(&self, path: &Path) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Cannot open log file '{}'", path.display()))?;

        let mut slot = self.file.lock().map_err(|_| anyhow!("log sink lock poisoned"))?;
        *slot = Some(file);
        Ok(())
    }
}

/// Writer handed to the fmt layer for one event.
pub struct SinkWriter {
    file: Arc<Mutex<Option<File>>>,
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Ok(mut slot) = self.file.lock() {
            if let Some(file) = slot.as_mut() {
                file.write_all(buf)?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Ok(mut slot) = self.file.lock() {
            if let Some(file) = slot.as_mut() {
                file.flush()?;
            }
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SinkWriter { file: Arc::clone(&self.file) }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default level.
pub fn init_tracing() -> LogSink {
    let sink = LogSink::new();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(sink.clone())
        .init();

    sink
}
