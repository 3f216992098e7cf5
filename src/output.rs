use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ListResult, ProgressEvent, ProgressSink, SampleResult};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_sample(result: &SampleResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Forwards progress to `tracing` at debug level.
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn event(&self, event: ProgressEvent) {
        tracing::debug!(
            dataset = %event.dataset,
            elapsed_ms = event.elapsed.map(|elapsed| elapsed.as_millis() as u64),
            "{}",
            event.message
        );
    }
}

/// Human-readable progress lines on stderr.
pub struct StderrSink;

impl ProgressSink for StderrSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!(
                "[{}] {} ({:.1}s)",
                event.dataset,
                event.message,
                elapsed.as_secs_f64()
            ),
            None => eprintln!("[{}] {}", event.dataset, event.message),
        }
    }
}
