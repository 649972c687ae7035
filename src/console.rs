//! Console and Clock Collaborators
//!
//! The security core writes human-readable lines through a [`LogSink`] and
//! stamps audit records with a [`Clock`]. Both are supplied by the rest of
//! the kernel; default implementations are provided here.
//!
//! # Locking
//! Sinks are only ever called after the caller's component lock has been
//! released, so a sink may take its own lock (e.g. the UART spinlock).

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Destination for formatted diagnostic lines.
pub trait LogSink: Sync {
    /// Write one line. Implementations append the line terminator.
    fn write_line(&self, args: fmt::Arguments<'_>);
}

/// Monotonic timestamp source.
///
/// Read on every audit record, possibly while the hierarchy lock is held.
/// Must not block.
pub trait Clock: Sync {
    /// Current time. Never decreases between calls.
    fn now(&self) -> u64;
}

/// Sink forwarding every line to the `log` facade.
#[derive(Debug, Clone, Copy)]
pub struct LogFacadeSink {
    target: &'static str,
}

impl LogFacadeSink {
    /// Create a sink logging under `target`.
    pub const fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl Default for LogFacadeSink {
    fn default() -> Self {
        Self::new("audit")
    }
}

impl LogSink for LogFacadeSink {
    fn write_line(&self, args: fmt::Arguments<'_>) {
        log::info!(target: self.target, "{}", args);
    }
}

/// Counter clock: each call returns the next tick, starting at 1.
#[derive(Debug, Default)]
pub struct TickClock {
    ticks: AtomicU64,
}

impl TickClock {
    /// Create a clock at tick zero.
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
        }
    }
}

impl Clock for TickClock {
    fn now(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Write a formatted line to a [`LogSink`].
#[macro_export]
macro_rules! sink_line {
    ($sink:expr, $($arg:tt)*) => {
        $crate::console::LogSink::write_line($sink, format_args!($($arg)*))
    };
}
