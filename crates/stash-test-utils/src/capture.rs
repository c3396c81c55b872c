//! Per-thread log capture.
//!
//! The first call to [`capture_logs`] installs a process-wide [`log::Log`]
//! that forwards records into a buffer owned by the calling thread. Records
//! from threads that are not capturing are dropped, so tests running in
//! parallel see only their own output.

use std::cell::RefCell;
use std::sync::Once;

use log::{Level, Log, Metadata, Record};

/// One captured log record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedRecord {
    /// Severity.
    pub level: Level,
    /// Module path the record was logged from.
    pub target: String,
    /// The formatted message.
    pub message: String,
}

thread_local! {
    static BUFFER: RefCell<Option<Vec<CapturedRecord>>> = const { RefCell::new(None) };
}

struct ThreadCapture;

impl Log for ThreadCapture {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        // `try_with` so logging during thread teardown is ignored.
        let _ = BUFFER.try_with(|buffer| {
            if let Ok(mut buffer) = buffer.try_borrow_mut() {
                if let Some(records) = buffer.as_mut() {
                    records.push(CapturedRecord {
                        level: record.level(),
                        target: record.target().to_owned(),
                        message: record.args().to_string(),
                    });
                }
            }
        });
    }

    fn flush(&self) {}
}

static LOGGER: ThreadCapture = ThreadCapture;
static INSTALL: Once = Once::new();

/// Run `f` and return its result together with every record logged on this
/// thread while it ran.
///
/// Captures nest: an inner capture takes its records, the outer one resumes
/// afterwards.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<CapturedRecord>) {
    INSTALL.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
    });
    let outer = BUFFER.with(|buffer| buffer.borrow_mut().replace(Vec::new()));
    let result = f();
    let records = BUFFER.with(|buffer| {
        let mut buffer = buffer.borrow_mut();
        let records = buffer.take().unwrap_or_default();
        *buffer = outer;
        records
    });
    (result, records)
}

impl CapturedRecord {
    /// Whether this record is at `level` and its message contains `needle`.
    pub fn matches(&self, level: Level, needle: &str) -> bool {
        self.level == level && self.message.contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_records_from_this_thread() {
        let (value, records) = capture_logs(|| {
            log::warn!("first {}", 1);
            log::info!("second");
            7
        });
        assert_eq!(value, 7);
        assert_eq!(records.len(), 2);
        assert!(records[0].matches(Level::Warn, "first 1"));
        assert!(records[1].matches(Level::Info, "second"));
    }

    #[test]
    fn other_threads_are_not_captured() {
        let ((), records) = capture_logs(|| {
            std::thread::spawn(|| log::error!("elsewhere"))
                .join()
                .unwrap();
        });
        assert!(records.is_empty());
    }

    #[test]
    fn captures_nest() {
        let (inner, outer) = capture_logs(|| {
            log::info!("outer before");
            let ((), inner) = capture_logs(|| log::info!("inner"));
            log::info!("outer after");
            inner
        });
        assert_eq!(inner.len(), 1);
        assert_eq!(outer.len(), 2);
        assert!(outer[1].matches(Level::Info, "outer after"));
    }
}
