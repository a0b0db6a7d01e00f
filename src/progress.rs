//! Upload progress reporting.
//!
//! The console holds a percentage for the in-flight upload; reporters make
//! it observable. Progress is emitted on **stderr** so stdout stays
//! parseable for scripts.
//!
//! Granularity is left to the transport. [`HttpBackend`](crate::backend::HttpBackend)
//! sends the multipart body in one piece, so reporters see `0` at the start
//! and `100` once the service has answered.

use std::io::Write;

/// A single progress event for one upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadProgressEvent {
    /// Request is about to be sent.
    Started { file: String, size: u64 },
    /// Percentage of the upload completed.
    Progress { file: String, percent: u8 },
    /// The attempt is over, successfully or not.
    Finished { file: String, ok: bool },
}

/// Reports upload progress. Implementations write to stderr (human or JSON).
pub trait UploadProgressReporter: Send + Sync {
    fn report(&self, event: UploadProgressEvent);
}

/// Human-friendly progress on stderr: "upload report.pdf  42%".
pub struct StderrProgress;

impl UploadProgressReporter for StderrProgress {
    fn report(&self, event: UploadProgressEvent) {
        let line = match &event {
            UploadProgressEvent::Started { file, size } => {
                format!("upload {}  starting ({})\n", file, format_file_size(*size))
            }
            UploadProgressEvent::Progress { file, percent } => {
                format!("upload {}  {}%\n", file, percent)
            }
            UploadProgressEvent::Finished { file, ok } => {
                let outcome = if *ok { "done" } else { "failed" };
                format!("upload {}  {}\n", file, outcome)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl UploadProgressReporter for JsonProgress {
    fn report(&self, event: UploadProgressEvent) {
        let obj = match &event {
            UploadProgressEvent::Started { file, size } => serde_json::json!({
                "event": "upload_started",
                "file": file,
                "size": size
            }),
            UploadProgressEvent::Progress { file, percent } => serde_json::json!({
                "event": "upload_progress",
                "file": file,
                "percent": percent
            }),
            UploadProgressEvent::Finished { file, ok } => serde_json::json!({
                "event": "upload_finished",
                "file": file,
                "ok": ok
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl UploadProgressReporter for NoProgress {
    fn report(&self, _event: UploadProgressEvent) {}
}

/// Render a byte count with base-1024 units, e.g. `1.5 KB`, `20 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn UploadProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }
}
