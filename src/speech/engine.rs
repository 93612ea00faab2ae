//! Speech engine boundary.
//!
//! # Overview
//!
//! [`SpeechEngine`] is the narration capability the controller drives. It
//! narrates at most one [`Utterance`] at a time and exposes no per-utterance
//! cancel: [`cancel`](SpeechEngine::cancel) stops everything.
//!
//! Lifecycle notifications do not come back as return values. Each engine is
//! constructed with an [`EventSender`] and reports [`EngineEvent`]s on it,
//! tagged with the [`UtteranceId`] they belong to, whenever the platform says
//! so. The receiving side decides whether an event is still relevant.
//!
//! [`MockSpeechEngine`] (available under `#[cfg(test)]`) records every call
//! so controller tests can assert exact call sequences.

use thiserror::Error;
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Utterance
// ---------------------------------------------------------------------------

/// Generation number identifying one submitted utterance.
///
/// Assigned by the controller, strictly increasing, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtteranceId(pub u64);

impl std::fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One narration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
}

// ---------------------------------------------------------------------------
// EngineEvent
// ---------------------------------------------------------------------------

/// What happened to an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEventKind {
    /// Narration actually began.
    Started,
    /// Narration ran to completion.
    Ended,
    /// Narration failed; the reason comes from the platform.
    Error(String),
}

/// An asynchronous notification from the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub utterance: UtteranceId,
    pub kind: EngineEventKind,
}

impl EngineEvent {
    pub fn started(utterance: UtteranceId) -> Self {
        Self {
            utterance,
            kind: EngineEventKind::Started,
        }
    }

    pub fn ended(utterance: UtteranceId) -> Self {
        Self {
            utterance,
            kind: EngineEventKind::Ended,
        }
    }

    pub fn error(utterance: UtteranceId, reason: impl Into<String>) -> Self {
        Self {
            utterance,
            kind: EngineEventKind::Error(reason.into()),
        }
    }
}

/// Sending half handed to an engine at construction.
pub type EventSender = mpsc::UnboundedSender<EngineEvent>;

/// Receiving half drained by whoever owns the controller.
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Create the event channel an engine reports on.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// A synchronous failure at the engine boundary.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The utterance could not be submitted.
    #[error("could not start narration: {0}")]
    Spawn(String),

    /// The engine cannot perform this operation on this platform.
    #[error("{0} is not supported by this speech engine")]
    Unsupported(&'static str),

    /// Pausing or resuming the running narration failed.
    #[error("could not control narration: {0}")]
    Control(String),
}

// ---------------------------------------------------------------------------
// SpeechEngine trait
// ---------------------------------------------------------------------------

/// A single, non-reentrant narration capability.
///
/// # Contract
///
/// - `speak` submits one utterance; `Started`, then exactly one of `Ended` or
///   `Error`, are reported on the engine's event channel.
/// - `cancel` stops all narration. Events for cancelled utterances may or may
///   not still arrive.
/// - `pause` / `resume` act on whatever is currently being narrated.
pub trait SpeechEngine: Send {
    fn speak(&mut self, utterance: Utterance) -> Result<(), EngineError>;

    fn pause(&mut self) -> Result<(), EngineError>;

    fn resume(&mut self) -> Result<(), EngineError>;

    fn cancel(&mut self);
}

// Compile-time assertion: Box<dyn SpeechEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechEngine>) {}
};

// ---------------------------------------------------------------------------
// MockSpeechEngine  (test-only)
// ---------------------------------------------------------------------------

/// One recorded call on [`MockSpeechEngine`].
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Speak(Utterance),
    Pause,
    Resume,
    Cancel,
}

/// A test double that records calls instead of narrating.
///
/// The call log is shared, so it stays readable after the engine has been
/// moved into a controller.
#[cfg(test)]
pub struct MockSpeechEngine {
    calls: std::sync::Arc<std::sync::Mutex<Vec<EngineCall>>>,
    fail_speak: bool,
}

#[cfg(test)]
impl MockSpeechEngine {
    /// A mock whose operations all succeed, plus a handle to its call log.
    pub fn new() -> (Self, std::sync::Arc<std::sync::Mutex<Vec<EngineCall>>>) {
        let calls = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        (
            Self {
                calls: std::sync::Arc::clone(&calls),
                fail_speak: false,
            },
            calls,
        )
    }

    /// A mock whose `speak` always fails.
    pub fn failing() -> (Self, std::sync::Arc<std::sync::Mutex<Vec<EngineCall>>>) {
        let (mut engine, calls) = Self::new();
        engine.fail_speak = true;
        (engine, calls)
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[cfg(test)]
impl SpeechEngine for MockSpeechEngine {
    fn speak(&mut self, utterance: Utterance) -> Result<(), EngineError> {
        self.record(EngineCall::Speak(utterance));
        if self.fail_speak {
            return Err(EngineError::Spawn("mock refuses to speak".into()));
        }
        Ok(())
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.record(EngineCall::Pause);
        Ok(())
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        self.record(EngineCall::Resume);
        Ok(())
    }

    fn cancel(&mut self) {
        self.record(EngineCall::Cancel);
    }
}
