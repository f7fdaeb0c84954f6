use std::io::Write;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

const DEFAULT_FILTER: LevelFilter = LevelFilter::Warn;

/// Where log records go
enum Sink {
    Stderr,
    File(Mutex<std::fs::File>),
}

struct QlLogger {
    sink: Sink,
    filter: LevelFilter,
    start: Instant,
}

impl Log for QlLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.start.elapsed().as_secs_f64();
        let line = format!(
            "[{elapsed:.3}s] [{}] {} - {}",
            record.level(),
            record.target(),
            record.args()
        );
        match &self.sink {
            Sink::Stderr => {
                let _ = writeln!(std::io::stderr().lock(), "{line}");
            }
            Sink::File(file) => {
                let _ = writeln!(file.lock(), "{line}");
            }
        }
    }

    fn flush(&self) {
        match &self.sink {
            Sink::Stderr => {
                let _ = std::io::stderr().flush();
            }
            Sink::File(file) => {
                let _ = file.lock().flush();
            }
        }
    }
}

/// Level filter from a `RUST_LOG` value such as `debug`; unset or unparsable
/// values fall back to `warn`.
#[must_use]
pub fn parse_filter(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_FILTER)
}

/// Initialize the global logger, writing to `log_file` or stderr.
///
/// A second call leaves the first logger in place.
pub fn init(log_file: Option<std::fs::File>) {
    let filter = parse_filter(std::env::var("RUST_LOG").ok().as_deref());

    let logger = QlLogger {
        sink: log_file.map_or(Sink::Stderr, |file| Sink::File(Mutex::new(file))),
        filter,
        start: Instant::now(),
    };

    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(filter);
    }
}
