use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use parking_lot::Mutex;

/// A single captured log entry.
pub struct LogEntry {
    pub level: log::Level,
    pub target: String,
    pub message: String,
    pub timestamp: Instant,
}

/// Ring buffer of captured log entries.
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    max_capacity: usize,
}

impl LogBuffer {
    fn new(max_capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_capacity.min(1024)),
            max_capacity,
        }
    }

    pub fn entries(&self) -> &VecDeque<LogEntry> {
        &self.entries
    }

    fn push(&mut self, entry: LogEntry) {
        if self.entries.len() >= self.max_capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Number of entries at `level` or more severe.
    pub fn count_at_least(&self, level: log::Level) -> usize {
        self.entries.iter().filter(|e| e.level <= level).count()
    }
}

static LOG_BUFFER: OnceLock<Arc<Mutex<LogBuffer>>> = OnceLock::new();

/// Returns the shared log buffer, if [`install`] ran.
pub fn log_buffer() -> Option<Arc<Mutex<LogBuffer>>> {
    LOG_BUFFER.get().cloned()
}

/// Logger that forwards to `env_logger` and keeps a copy of each entry.
struct LogCapture {
    inner: env_logger::Logger,
    buffer: Arc<Mutex<LogBuffer>>,
}

impl log::Log for LogCapture {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            self.inner.log(record);

            self.buffer.lock().push(LogEntry {
                level: record.level(),
                target: record.target().to_owned(),
                message: format!("{}", record.args()),
                timestamp: Instant::now(),
            });
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Installs the capturing logger. `default_filter` applies when `RUST_LOG`
/// is unset.
pub fn install(default_filter: &str, capacity: usize) -> Result<(), String> {
    let buffer = Arc::new(Mutex::new(LogBuffer::new(capacity)));
    LOG_BUFFER
        .set(buffer.clone())
        .map_err(|_| "log capture installed twice".to_string())?;

    let inner =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
            .build();
    let max_level = inner.filter();

    log::set_boxed_logger(Box::new(LogCapture { inner, buffer }))
        .map_err(|e| format!("logger already set: {e}"))?;
    log::set_max_level(max_level);
    Ok(())
}
