//! Lifecycle signals.
//!
//! Listeners observe the pipeline as a side channel: they receive a
//! read-only [`Event`] and cannot influence control flow. The engine
//! behaves identically with zero listeners attached.

use super::types::Element;
use std::fmt;

/// Named lifecycle signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Population replaced by fresh random elements.
    Initiated,
    /// An update step completed.
    Updated,
    /// Elements appended (possibly none).
    Expanded,
    /// A batch was evaluated and the population ranked.
    Evaluated,
    /// Population truncated to its target size.
    Sieved,
    /// One advance completed and the step counter moved.
    Advanced,
    /// Step statistics recorded.
    Analyzed,
    /// A run terminated.
    Finished,
}

/// Payload delivered with every signal.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    /// Step counter at emission time (`-1` before the first advance completes).
    pub step: i64,
    /// Current population (ranked once evaluated).
    pub population: &'a [Element],
    /// The evaluated subset, only for [`Signal::Evaluated`].
    pub evaluated: Option<&'a [Element]>,
}

type Listener = Box<dyn FnMut(Signal, &Event<'_>) + Send>;

/// Registered listeners.
#[derive(Default)]
pub struct Signals {
    listeners: Vec<Listener>,
}

impl Signals {
    /// Registers a listener for every signal.
    pub fn on<F>(&mut self, listener: F)
    where
        F: FnMut(Signal, &Event<'_>) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Delivers `signal` to all listeners in registration order.
    pub fn emit(&mut self, signal: Signal, event: &Event<'_>) {
        for listener in &mut self.listeners {
            listener(signal, event);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for Signals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signals")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
