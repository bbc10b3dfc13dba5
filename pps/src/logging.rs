//! Logging glue.
//!
//! The driver only talks to the [log] facade. Hosts that already installed a
//! logger need nothing from here; bare hosts can call [init] with a
//! [LogSink] to get colored, level-tagged lines.
use core::fmt::Arguments;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, set_logger, set_max_level};
use spin::Once;

/// Line-oriented output supplied by the host, e.g. a serial console.
pub trait LogSink: Sync {
    fn write_line(&self, args: Arguments<'_>);
}

pub struct Logger {
    sink: &'static dyn LogSink,
}

impl Log for Logger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let color = match record.level() {
            Level::Error => 31, // Red
            Level::Warn => 93,  // BrightYellow
            Level::Info => 20,  // White
            Level::Debug => 32, // Green
            Level::Trace => 90, // BrightBlack
        };
        self.sink.write_line(format_args!(
            "\u{1B}[{}m[{:}] {}\u{1B}[0m",
            color,
            record.level(),
            record.args(),
        ));
    }

    fn flush(&self) {}
}

static LOGGER: Once<Logger> = Once::new();

/// Install a [Logger] writing to `sink`.
///
/// Fails if the host (or an earlier call) already set a logger.
pub fn init(sink: &'static dyn LogSink) -> Result<(), SetLoggerError> {
    let logger = LOGGER.call_once(|| Logger { sink });
    set_logger(logger)?;
    set_max_level(LevelFilter::Debug);
    Ok(())
}

/// Improved debug macro,
/// only compiled in debug mode.
#[macro_export]
macro_rules! debug_ex {
    // debug!(target: "my_target", key1 = 42, key2 = true; "a {} event", "log")
    // debug!(target: "my_target", "a {} event", "log")
    (target: $target:expr, $($arg:tt)+) => {
        #[cfg(debug_assertions)]
        {
            use log::{log,Level};
            log!(target: $target, Level::Debug, $($arg)+)
        }
    };

    // debug!("a {} event", "log")
    ($($arg:tt)+) => {
        #[cfg(debug_assertions)]
        {
            use log::{log,Level};
            log!(Level::Debug, $($arg)+)
        }
    }
}
