//! Minimal stderr logger with an explicit level threaded from the CLI.
//!
//! The level is decided once per invocation from the `--verbose` flag and
//! passed down; there is no global mutable logger state.

use std::fmt;

/// Log threshold for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Nothing but the final user-facing message
    Quiet,
    /// Diagnostic output on stderr
    Debug,
}

impl LogLevel {
    /// Map the `--verbose` flag onto a level.
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            LogLevel::Debug
        } else {
            LogLevel::Quiet
        }
    }
}

/// Per-invocation logger handle
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    level: LogLevel,
}

impl Logger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// Diagnostic message, only shown when verbose.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        if self.level >= LogLevel::Debug {
            eprintln!("[debug] {}", args);
        }
    }

    /// Full error detail, only shown when verbose. The user-facing summary
    /// goes through the normal output contract instead.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        if self.level >= LogLevel::Debug {
            eprintln!("[error] {}", args);
        }
    }
}

/// Log a debug message through a [`Logger`].
#[macro_export]
macro_rules! debug_log {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format_args!($($arg)*))
    };
}

/// Log an error detail through a [`Logger`].
#[macro_export]
macro_rules! error_log {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_verbose() {
        assert_eq!(LogLevel::from_verbose(false), LogLevel::Quiet);
        assert_eq!(LogLevel::from_verbose(true), LogLevel::Debug);
    }

    #[test]
    fn test_quiet_is_below_debug() {
        assert!(LogLevel::Quiet < LogLevel::Debug);
    }
}
