//! Structural render events
//!
//! Templates never build text directly. They emit [`RenderEvent`]s into an
//! [`EventSink`]; the sink decides what the events become. [`CodeWriter`]
//! turns them into source text and [`EventLog`] records them with their
//! nesting depth.
//!
//! [`CodeWriter`]: crate::writer::CodeWriter

/// One step of a rendered file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// Inner doc line of the file (`//!`)
    FileDoc(String),
    /// Path to import at the top of the file
    Import(String),
    /// Line at the current depth
    Line(String),
    /// Line opening a block; later lines nest one level deeper
    Open(String),
    /// Line closing the innermost block
    Close(String),
    /// Empty separator line
    Blank,
}

/// Receiver of render events
pub trait EventSink {
    /// Accept one event
    fn emit(&mut self, event: RenderEvent);

    /// Emit a line
    fn line(&mut self, text: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(RenderEvent::Line(text.into()));
    }

    /// Emit a block opener
    fn open(&mut self, text: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(RenderEvent::Open(text.into()));
    }

    /// Emit a block closer
    fn close(&mut self, text: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(RenderEvent::Close(text.into()));
    }

    /// Emit a separator
    fn blank(&mut self)
    where
        Self: Sized,
    {
        self.emit(RenderEvent::Blank);
    }

    /// Request an import
    fn import(&mut self, path: impl Into<String>)
    where
        Self: Sized,
    {
        self.emit(RenderEvent::Import(path.into()));
    }
}

/// Sink recording each event with the depth it was emitted at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<(RenderEvent, usize)>,
    depth: usize,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self { Self::default() }

    /// Recorded events in emission order
    pub fn events(&self) -> &[(RenderEvent, usize)] { &self.events }

    /// Whether every opened block was closed
    pub fn is_balanced(&self) -> bool { self.depth == 0 }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: RenderEvent) {
        match event {
            RenderEvent::Open(_) => {
                self.events.push((event, self.depth));
                self.depth += 1;
            }
            RenderEvent::Close(_) => {
                self.depth = self.depth.saturating_sub(1);
                self.events.push((event, self.depth));
            }
            other => self.events.push((other, self.depth)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_tracks_depth() {
        let mut log = EventLog::new();
        log.open("impl Pet {");
        log.line("const A: u8 = 1;");
        log.close("}");
        assert!(log.is_balanced());
        let depths: Vec<usize> = log.events().iter().map(|(_, d)| *d).collect();
        assert_eq!(depths, vec![0, 1, 0]);
    }
}
