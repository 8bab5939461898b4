//! The capability a test host hands to every assertion.
//!
//! Attest never decides how a failure is signalled. It logs one message
//! through [`TestingT::log`] and then asks the host to either stop the
//! test ([`TestingT::fail_now`]) or mark it failed and carry on
//! ([`TestingT::fail`]).

// ============================================================================
// CAPABILITY
// ============================================================================

use std::io::Write;

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// The subset of a test context used by assertions.
pub trait TestingT {
    /// Fails the test and stops its execution.
    fn fail_now(&mut self);
    /// Marks the test as failed and lets it continue.
    fn fail(&mut self);
    /// Records a diagnostic message.
    fn log(&mut self, message: &str);
}

impl<T: TestingT + ?Sized> TestingT for &mut T {
    fn fail_now(&mut self) {
        (**self).fail_now()
    }
    fn fail(&mut self) {
        (**self).fail()
    }
    fn log(&mut self, message: &str) {
        (**self).log(message)
    }
}

// ============================================================================
// RECORDER: captures everything, signals nothing
// ============================================================================

/// Records logged messages and failure flags instead of acting on them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Recorder {
    pub logs: Vec<String>,
    pub failed: bool,
    pub failed_now: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// All logged messages, one per line.
    pub fn output(&self) -> String {
        self.logs.join("\n")
    }

    pub fn last_log(&self) -> Option<&str> {
        self.logs.last().map(String::as_str)
    }
}

impl TestingT for Recorder {
    fn fail_now(&mut self) {
        self.failed_now = true;
        self.failed = true;
    }
    fn fail(&mut self) {
        self.failed = true;
    }
    fn log(&mut self, message: &str) {
        self.logs.push(message.to_string());
    }
}

// ============================================================================
// CONSOLE: a host for plain `#[test]` functions
// ============================================================================

/// Logs to stderr and turns failures into panics, so it can be used from
/// an ordinary `#[test]`.
///
/// `fail_now` panics immediately with the last logged message. `fail`
/// only marks the test; the panic is deferred until the value is dropped.
pub struct Console {
    stream: StandardStream,
    last: Option<String>,
    failed: bool,
}

impl Console {
    pub fn new() -> Self {
        Self {
            stream: StandardStream::stderr(ColorChoice::Auto),
            last: None,
            failed: false,
        }
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    fn write_colored(&mut self, message: &str) -> std::io::Result<()> {
        for line in message.lines() {
            let color = match line.chars().next() {
                Some('+') if !line.starts_with("+++") => Some(Color::Green),
                Some('-') if !line.starts_with("---") => Some(Color::Red),
                Some('@') => Some(Color::Cyan),
                _ if line.starts_with("assertion failed") => Some(Color::Yellow),
                _ => None,
            };
            self.stream.set_color(ColorSpec::new().set_fg(color))?;
            writeln!(self.stream, "{line}")?;
        }
        self.stream.reset()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

impl TestingT for Console {
    fn fail_now(&mut self) {
        self.failed = true;
        let message = self.last.take().unwrap_or_else(|| "test failed".to_string());
        panic!("{message}");
    }

    fn fail(&mut self) {
        self.failed = true;
    }

    fn log(&mut self, message: &str) {
        if self.write_colored(message).is_err() {
            eprintln!("{message}");
        }
        self.last = Some(message.to_string());
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        if self.failed && !std::thread::panicking() {
            panic!("test marked as failed by a previous check");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_tracks_flags() {
        let mut t = Recorder::new();
        t.log("first");
        t.fail();
        assert!(t.failed);
        assert!(!t.failed_now);
        t.log("second");
        t.fail_now();
        assert!(t.failed_now);
        assert_eq!(t.output(), "first\nsecond");
        assert_eq!(t.last_log(), Some("second"));
    }

    #[test]
    #[should_panic(expected = "assertion failed: boom")]
    fn test_console_fail_now_panics_with_last_message() {
        let mut t = Console::new();
        t.log("assertion failed: boom");
        t.fail_now();
    }

    #[test]
    #[should_panic(expected = "test marked as failed")]
    fn test_console_fail_panics_on_drop() {
        let mut t = Console::new();
        t.fail();
        assert!(t.failed());
    }
}
