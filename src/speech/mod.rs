//! Text-to-speech playback.
//!
//! # Architecture
//!
//! ```text
//!   play / pause / stop (track)          EngineEvent (mpsc)
//!              │                                ▲
//!              ▼                                │
//!   ┌──────────────────────┐   speak/pause/   ┌─┴──────────────────┐
//!   │  SpeechController    │──resume/cancel──▶│ dyn SpeechEngine   │
//!   │  FullText │ Summary  │                  │  (CommandEngine)   │
//!   └──────────▲───────────┘                  └────────────────────┘
//!              │ handle_event(EngineEvent)
//!              └──────── owner drains the event channel
//! ```
//!
//! The controller is the only holder of the engine. Whoever owns the
//! controller also owns the receiving end of the event channel and feeds
//! events back in, so every engine access is serialised through one place.

pub mod command;
pub mod controller;
pub mod engine;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use command::{find_program, CommandEngine};
pub use controller::{PlaybackSnapshot, PlaybackState, SpeechController, SpeechError, Track};
pub use engine::{
    event_channel, EngineError, EngineEvent, EngineEventKind, EventReceiver, EventSender,
    SpeechEngine, Utterance, UtteranceId,
};

#[cfg(test)]
pub use engine::{EngineCall, MockSpeechEngine};
