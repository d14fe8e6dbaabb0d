//! Log event builder emitting through `tracing`.
//!
//! A `LogEvent` is a deferred `tracing` event: level, message and fields are
//! collected first and only emitted by `log()`. The neutral event is a
//! builder that ignores everything and emits nothing, so suppressed call
//! sites can keep chaining without paying for field formatting.
//!
//! `tracing` needs event levels and field names at compile time. Levels are
//! dispatched over the five static levels; fields are rendered into one
//! `fields` value as space-separated `key=value` pairs.

use crate::application::filter_result::FilterResult;
use crate::application::ports::Neutral;
use std::borrow::Cow;
use std::fmt;
use tracing::Level;

macro_rules! emit {
    ($level:expr, $message:expr, $fields:expr) => {
        if $fields.is_empty() {
            tracing::event!($level, "{}", $message)
        } else {
            tracing::event!($level, fields = %$fields, "{}", $message)
        }
    };
}

#[derive(Debug, Clone, PartialEq)]
struct EventData {
    level: Level,
    message: Cow<'static, str>,
    fields: Vec<(Cow<'static, str>, String)>,
}

/// A log event waiting to be emitted, or the neutral event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    data: Option<EventData>,
}

impl LogEvent {
    /// Create an event at `level` with an empty message.
    pub fn new(level: Level) -> Self {
        Self {
            data: Some(EventData {
                level,
                message: Cow::Borrowed(""),
                fields: Vec::new(),
            }),
        }
    }

    /// The neutral event. Every builder call is ignored and `log` is a no-op.
    pub const fn nop() -> Self {
        Self { data: None }
    }

    /// Check if this is the neutral event.
    pub fn is_nop(&self) -> bool {
        self.data.is_none()
    }

    /// Level the event will be emitted at, `None` for the neutral event.
    pub fn level(&self) -> Option<Level> {
        self.data.as_ref().map(|data| data.level)
    }

    /// Message text, `None` for the neutral event.
    pub fn message_text(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.message.as_ref())
    }

    /// Recorded fields in insertion order.
    pub fn fields(&self) -> &[(Cow<'static, str>, String)] {
        self.data
            .as_ref()
            .map(|data| data.fields.as_slice())
            .unwrap_or_default()
    }

    /// Set the message.
    pub fn message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        if let Some(data) = self.data.as_mut() {
            data.message = message.into();
        }
        self
    }

    /// Append a field. The value is formatted only for non-neutral events.
    pub fn field(mut self, key: impl Into<Cow<'static, str>>, value: impl fmt::Display) -> Self {
        if let Some(data) = self.data.as_mut() {
            data.fields.push((key.into(), value.to_string()));
        }
        self
    }

    /// Emit the event. Does nothing for the neutral event.
    pub fn log(&self) {
        let Some(data) = &self.data else {
            return;
        };

        let fields = RenderedFields(&data.fields);
        match data.level {
            Level::ERROR => emit!(Level::ERROR, data.message, fields),
            Level::WARN => emit!(Level::WARN, data.message, fields),
            Level::INFO => emit!(Level::INFO, data.message, fields),
            Level::DEBUG => emit!(Level::DEBUG, data.message, fields),
            _ => emit!(Level::TRACE, data.message, fields),
        }
    }
}

struct RenderedFields<'a>(&'a [(Cow<'static, str>, String)]);

impl RenderedFields<'_> {
    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RenderedFields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

impl Neutral for LogEvent {
    fn neutral() -> Self {
        Self::nop()
    }
}

impl Default for LogEvent {
    fn default() -> Self {
        Self::nop()
    }
}

/// Entry points creating fresh events at a fixed level.
#[derive(Debug, Clone, Copy)]
pub struct Log;

impl Log {
    pub fn error() -> LogEvent {
        LogEvent::new(Level::ERROR)
    }

    pub fn warn() -> LogEvent {
        LogEvent::new(Level::WARN)
    }

    pub fn info() -> LogEvent {
        LogEvent::new(Level::INFO)
    }

    pub fn debug() -> LogEvent {
        LogEvent::new(Level::DEBUG)
    }

    pub fn trace() -> LogEvent {
        LogEvent::new(Level::TRACE)
    }

    pub fn at(level: Level) -> LogEvent {
        LogEvent::new(level)
    }
}

impl<C> FilterResult<C, LogEvent> {
    /// Emit the produced event as is.
    pub fn log(self) {
        self.result().log();
    }

    /// Adjust the produced event with the context, then emit it.
    ///
    /// `adjust` also runs for neutral events, where its builder calls are
    /// ignored.
    pub fn log_with<F>(self, adjust: F)
    where
        F: FnOnce(&C, LogEvent) -> LogEvent,
    {
        let (context, event) = self.into_parts();
        adjust(&context, event).log();
    }
}
