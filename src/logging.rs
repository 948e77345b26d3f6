//! Activity logging.
//!
//! Engine code reports what it does through `tracing` events. `init_logging`
//! routes those events to three places: the console (warnings and errors by
//! default), an append-only log file, and an in-memory ring buffer holding
//! the most recent lines for front ends to display.

use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt};

/// Environment variable controlling console verbosity.
pub const LOG_ENV_VAR: &str = "DECLUTTER_LOG";

const DEFAULT_CAPACITY: usize = 100;

static ACTIVITY_LOG: Lazy<Arc<ActivityLog>> =
    Lazy::new(|| Arc::new(ActivityLog::with_capacity(DEFAULT_CAPACITY)));

/// Bounded buffer of the most recent log lines. Oldest lines are dropped
/// once the capacity is reached.
#[derive(Debug)]
pub struct ActivityLog {
    inner: Mutex<Ring>,
}

#[derive(Debug)]
struct Ring {
    capacity: usize,
    entries: VecDeque<String>,
}

impl ActivityLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Ring {
                capacity,
                entries: VecDeque::with_capacity(capacity),
            }),
        }
    }

    pub fn push(&self, line: impl Into<String>) {
        let mut ring = self.lock();
        if ring.capacity == 0 {
            return;
        }
        while ring.entries.len() >= ring.capacity {
            ring.entries.pop_front();
        }
        ring.entries.push_back(line.into());
    }

    /// Copies the buffered lines, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().entries.iter().cloned().collect()
    }

    /// Changes the capacity, dropping the oldest lines if needed.
    pub fn set_capacity(&self, capacity: usize) {
        let mut ring = self.lock();
        ring.capacity = capacity;
        while ring.entries.len() > capacity {
            ring.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Ring> {
        // A panic while holding the lock cannot leave the ring inconsistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The process-wide activity log filled by `init_logging`.
///
/// The `declutter` binary reads history from the log file instead; this and
/// `recent_logs` are for front ends that embed the library and display the
/// latest activity from memory.
pub fn activity_log() -> Arc<ActivityLog> {
    Arc::clone(&ACTIVITY_LOG)
}

/// The most recent lines of the process-wide activity log, oldest first.
pub fn recent_logs() -> Vec<String> {
    ACTIVITY_LOG.snapshot()
}

/// Formats each event as `YYYY-MM-DD HH:MM:SS - message` into an `ActivityLog`.
pub struct RecentLogLayer {
    log: Arc<ActivityLog>,
}

impl RecentLogLayer {
    pub fn new(log: Arc<ActivityLog>) -> Self {
        Self { log }
    }
}

impl<S: Subscriber> Layer<S> for RecentLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        self.log.push(format!("{} - {}", timestamp, visitor.line));
    }
}

#[derive(Default)]
struct MessageVisitor {
    line: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let fields = std::mem::take(&mut self.line);
            self.line = format!("{:?}{}", value, fields);
        } else {
            self.line.push_str(&format!(" {}={:?}", field.name(), value));
        }
    }
}

/// Installs the global subscriber.
///
/// The returned guard flushes the log file when dropped and must be held
/// until the program exits. When the log file cannot be opened, logging
/// continues without it. Calling this twice keeps the first subscriber.
pub fn init_logging(log_file: &Path, recent_capacity: usize) -> Option<WorkerGuard> {
    let log = activity_log();
    log.set_capacity(recent_capacity);

    let console_filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let console_layer = tracing_fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(console_filter);

    let (file_layer, guard) = match open_log_file(log_file) {
        Some((dir, name)) => {
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(LevelFilter::INFO);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(RecentLogLayer::new(log).with_filter(LevelFilter::INFO))
        .try_init();

    guard
}

/// Splits the log path into directory and file name, creating the directory.
fn open_log_file(log_file: &Path) -> Option<(&Path, &std::ffi::OsStr)> {
    let name = log_file.file_name()?;
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if let Err(e) = fs::create_dir_all(dir) {
        eprintln!("Warning: could not create log directory {}: {}", dir.display(), e);
        return None;
    }
    Some((dir, name))
}
