//! Logging sink handed to the render core
//!
//! The core reports recoverable problems here instead of returning them past
//! the frame boundary.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use log::Level;

pub trait LogSink {
    fn log(&self, level: Level, message: &str);
}

/// Forwards to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: "softraster", level, "{}", message);
    }
}

/// Keeps every entry in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: RefCell<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(_, msg)| msg.contains(needle))
            .count()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}

impl<S: LogSink + ?Sized> LogSink for Rc<S> {
    fn log(&self, level: Level, message: &str) {
        (**self).log(level, message);
    }
}

/// Sink wrapper that suppresses repeats of the same key
pub struct Logger {
    sink: Box<dyn LogSink>,
    seen: HashSet<String>,
}

impl Logger {
    pub fn new(sink: Box<dyn LogSink>) -> Self {
        Self {
            sink,
            seen: HashSet::new(),
        }
    }

    pub fn warn(&self, message: &str) {
        self.sink.log(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.sink.log(Level::Error, message);
    }

    pub fn info(&self, message: &str) {
        self.sink.log(Level::Info, message);
    }

    /// Log only the first time `key` is seen
    pub fn warn_once(&mut self, key: &str, message: &str) {
        if self.seen.insert(key.to_string()) {
            self.sink.log(Level::Warn, message);
        }
    }
}
