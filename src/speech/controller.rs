//! Dual-track speech controller.
//!
//! Two texts can be narrated, the full document text and its summary, but
//! the engine narrates one utterance at a time and can only cancel globally.
//! [`SpeechController`] is the one place that owns the engine handle and
//! arbitrates between the tracks.
//!
//! Per track the state machine is:
//!
//! ```text
//! Idle ──play──▶ (pending) ──Started──▶ Speaking ──Ended / Error──▶ Idle
//!                                        │    ▲
//!                                   pause│    │play (resume)
//!                                        ▼    │
//!                                        Paused ──stop──▶ Idle
//! ```
//!
//! Across tracks: at most one track is `Speaking` or `Paused`, and at most
//! one holds a live utterance. `play` on one track forces the other to
//! `Idle` first; `stop` on either track resets both, because the engine's
//! cancel is global.

use thiserror::Error;

use super::engine::{EngineEvent, EngineEventKind, SpeechEngine, Utterance, UtteranceId};

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

/// One of the two narratable texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Track {
    /// The full text extracted from the document.
    FullText,
    /// The document's summary.
    Summary,
}

impl Track {
    pub const ALL: [Track; 2] = [Track::FullText, Track::Summary];

    /// The sibling track.
    pub fn other(self) -> Track {
        match self {
            Track::FullText => Track::Summary,
            Track::Summary => Track::FullText,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Track::FullText => "full text",
            Track::Summary => "summary",
        }
    }

    fn index(self) -> usize {
        match self {
            Track::FullText => 0,
            Track::Summary => 1,
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// PlaybackState
// ---------------------------------------------------------------------------

/// Playback state of one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Speaking,
    Paused,
}

impl PlaybackState {
    /// `true` for `Speaking` and `Paused`.
    ///
    /// ```
    /// use doc_studio::speech::PlaybackState;
    ///
    /// assert!(!PlaybackState::Idle.is_active());
    /// assert!(PlaybackState::Speaking.is_active());
    /// assert!(PlaybackState::Paused.is_active());
    /// ```
    pub fn is_active(self) -> bool {
        !matches!(self, PlaybackState::Idle)
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Speaking => "Speaking",
            PlaybackState::Paused => "Paused",
        }
    }
}

/// Both track states at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackSnapshot {
    pub full_text: PlaybackState,
    pub summary: PlaybackState,
}

impl PlaybackSnapshot {
    pub fn get(&self, track: Track) -> PlaybackState {
        match track {
            Track::FullText => self.full_text,
            Track::Summary => self.summary,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Narration failures reported to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    /// The engine refused an operation or reported an error mid-utterance.
    #[error("could not play {track} audio: {reason}")]
    Engine { track: Track, reason: String },

    /// `play` was called with nothing to say.
    #[error("there is no text to narrate")]
    EmptyText,

    /// No speech engine is available in this environment.
    #[error("text-to-speech is not supported in this environment")]
    Unsupported,
}

// ---------------------------------------------------------------------------
// SpeechController
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
struct Slot {
    state: PlaybackState,
    /// The utterance this track is waiting on or narrating.
    utterance: Option<UtteranceId>,
}

impl Slot {
    fn is_live(&self) -> bool {
        self.state.is_active() || self.utterance.is_some()
    }

    fn reset(&mut self) {
        *self = Slot::default();
    }
}

/// Owns the speech engine and arbitrates the two tracks.
///
/// With no engine (capability absent) every operation is an inert no-op and
/// both tracks stay `Idle`.
pub struct SpeechController {
    engine: Option<Box<dyn SpeechEngine>>,
    slots: [Slot; 2],
    last_id: u64,
    unsupported_reported: bool,
}

impl SpeechController {
    /// Create a controller around `engine`; `None` means narration is not
    /// available here.
    pub fn new(engine: Option<Box<dyn SpeechEngine>>) -> Self {
        if engine.is_none() {
            log::warn!("speech: no engine available, playback disabled");
        }
        Self {
            engine,
            slots: [Slot::default(); 2],
            last_id: 0,
            unsupported_reported: false,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.engine.is_some()
    }

    /// Returns [`SpeechError::Unsupported`] the first time it is called on a
    /// controller without an engine, and `None` on every later call.
    pub fn take_unsupported_notice(&mut self) -> Option<SpeechError> {
        if self.engine.is_some() || self.unsupported_reported {
            return None;
        }
        self.unsupported_reported = true;
        Some(SpeechError::Unsupported)
    }

    pub fn state(&self, track: Track) -> PlaybackState {
        self.slots[track.index()].state
    }

    /// The utterance `track` currently holds, if any.
    pub fn utterance(&self, track: Track) -> Option<UtteranceId> {
        self.slots[track.index()].utterance
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            full_text: self.state(Track::FullText),
            summary: self.state(Track::Summary),
        }
    }

    /// Start or resume narration of `track`.
    ///
    /// If the other track is active or waiting on an utterance it is forced
    /// to `Idle` (engine cancelled, reference cleared) before anything is
    /// submitted. A `Paused` track resumes its existing utterance; otherwise
    /// a fresh utterance is submitted and the track becomes `Speaking` when
    /// the engine reports `Started`.
    pub fn play(&mut self, track: Track, text: &str) -> Result<(), SpeechError> {
        let Some(engine) = self.engine.as_mut() else {
            log::debug!("speech: play({track}) ignored, no engine");
            return Ok(());
        };
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let other = track.other();
        if self.slots[other.index()].is_live() {
            log::info!("speech: stopping {other} before playing {track}");
            engine.cancel();
            self.slots[other.index()].reset();
        }

        let slot = &mut self.slots[track.index()];

        if slot.state == PlaybackState::Paused && slot.utterance.is_some() {
            engine.resume().map_err(|e| SpeechError::Engine {
                track,
                reason: e.to_string(),
            })?;
            slot.state = PlaybackState::Speaking;
            log::info!("speech: resumed {track}");
            return Ok(());
        }

        if slot.is_live() {
            engine.cancel();
            slot.reset();
        }

        self.last_id += 1;
        let id = UtteranceId(self.last_id);
        slot.utterance = Some(id);

        let utterance = Utterance {
            id,
            text: text.to_string(),
        };
        if let Err(e) = engine.speak(utterance) {
            slot.reset();
            log::warn!("speech: {track} utterance {id} rejected: {e}");
            return Err(SpeechError::Engine {
                track,
                reason: e.to_string(),
            });
        }

        log::info!("speech: submitted {track} utterance {id} ({} chars)", text.len());
        Ok(())
    }

    /// Pause `track`. Only effective while it is `Speaking`; otherwise the
    /// state is left unchanged.
    pub fn pause(&mut self, track: Track) -> Result<(), SpeechError> {
        let Some(engine) = self.engine.as_mut() else {
            return Ok(());
        };
        let slot = &mut self.slots[track.index()];
        if slot.state != PlaybackState::Speaking {
            log::debug!("speech: pause({track}) ignored in state {}", slot.state.label());
            return Ok(());
        }

        engine.pause().map_err(|e| SpeechError::Engine {
            track,
            reason: e.to_string(),
        })?;
        slot.state = PlaybackState::Paused;
        log::info!("speech: paused {track}");
        Ok(())
    }

    /// Stop `track`.
    ///
    /// The engine can only cancel everything, so this also forces the other
    /// track to `Idle`. Calling it again is harmless.
    pub fn stop(&mut self, track: Track) {
        if self.engine.is_none() {
            return;
        }
        log::info!("speech: stop({track})");
        self.cancel_everything();
    }

    /// Cancel the engine and reset both tracks to `Idle`.
    ///
    /// Call before starting an AI flow (the text being narrated is about to
    /// be replaced) and on teardown.
    pub fn stop_all(&mut self) {
        if self.engine.is_none() {
            return;
        }
        log::debug!("speech: stop_all");
        self.cancel_everything();
    }

    fn cancel_everything(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.cancel();
        }
        for slot in &mut self.slots {
            slot.reset();
        }
    }

    /// Apply an engine notification.
    ///
    /// Events for utterances no track holds any more (cancelled, superseded,
    /// already finished) are discarded. Returns the error to report when the
    /// engine failed mid-utterance; the failing track returns to `Idle`.
    pub fn handle_event(&mut self, event: EngineEvent) -> Option<SpeechError> {
        let Some(track) = Track::ALL
            .into_iter()
            .find(|t| self.slots[t.index()].utterance == Some(event.utterance))
        else {
            log::debug!("speech: discarding stale event for {}", event.utterance);
            return None;
        };

        let slot = &mut self.slots[track.index()];
        match event.kind {
            EngineEventKind::Started => {
                if slot.state == PlaybackState::Idle {
                    slot.state = PlaybackState::Speaking;
                }
                None
            }
            EngineEventKind::Ended => {
                log::info!("speech: {track} finished");
                slot.reset();
                None
            }
            EngineEventKind::Error(reason) => {
                log::warn!("speech: {track} failed: {reason}");
                slot.reset();
                Some(SpeechError::Engine { track, reason })
            }
        }
    }
}

impl Drop for SpeechController {
    fn drop(&mut self) {
        if self.slots.iter().any(Slot::is_live) {
            self.cancel_everything();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::speech::engine::{EngineCall, MockSpeechEngine};

    use super::PlaybackState::{Idle, Paused, Speaking};
    use super::Track::{FullText, Summary};

    type CallLog = Arc<Mutex<Vec<EngineCall>>>;

    fn controller() -> (SpeechController, CallLog) {
        let (engine, calls) = MockSpeechEngine::new();
        (SpeechController::new(Some(Box::new(engine))), calls)
    }

    fn calls(log: &CallLog) -> Vec<EngineCall> {
        log.lock().unwrap().clone()
    }

    fn speak(id: u64, text: &str) -> EngineCall {
        EngineCall::Speak(Utterance {
            id: UtteranceId(id),
            text: text.into(),
        })
    }

    /// Play `track` and confirm the engine started it.
    fn start(ctl: &mut SpeechController, track: Track, text: &str) -> UtteranceId {
        ctl.play(track, text).unwrap();
        let id = ctl.utterance(track).expect("utterance submitted");
        assert!(ctl.handle_event(EngineEvent::started(id)).is_none());
        id
    }

    fn assert_exclusive(ctl: &SpeechController) {
        let live: Vec<_> = Track::ALL
            .into_iter()
            .filter(|t| ctl.state(*t).is_active() || ctl.utterance(*t).is_some())
            .collect();
        assert!(live.len() <= 1, "both tracks live: {:?}", ctl.snapshot());
    }

    // ---- play / events ---

    #[test]
    fn play_start_end_cycle() {
        let (mut ctl, log) = controller();

        ctl.play(FullText, "hello").unwrap();
        assert_eq!(ctl.state(FullText), Idle, "speaking only once the engine confirms");
        let id = ctl.utterance(FullText).unwrap();

        ctl.handle_event(EngineEvent::started(id));
        assert_eq!(
            ctl.snapshot(),
            PlaybackSnapshot {
                full_text: Speaking,
                summary: Idle
            }
        );

        ctl.handle_event(EngineEvent::ended(id));
        assert_eq!(ctl.snapshot(), PlaybackSnapshot::default());
        assert!(ctl.utterance(FullText).is_none());
        assert_eq!(calls(&log), vec![speak(1, "hello")]);
    }

    #[test]
    fn play_other_track_stops_speaking_sibling_before_submitting() {
        let (mut ctl, log) = controller();
        start(&mut ctl, FullText, "hello");

        ctl.play(Summary, "world").unwrap();

        assert_eq!(ctl.state(FullText), Idle);
        assert!(ctl.utterance(FullText).is_none());
        assert_eq!(
            calls(&log),
            vec![speak(1, "hello"), EngineCall::Cancel, speak(2, "world")]
        );
    }

    #[test]
    fn play_other_track_stops_paused_sibling() {
        let (mut ctl, log) = controller();
        start(&mut ctl, Summary, "world");
        ctl.pause(Summary).unwrap();

        ctl.play(FullText, "hello").unwrap();

        assert_eq!(ctl.state(Summary), Idle);
        assert!(ctl.utterance(Summary).is_none());
        assert_eq!(
            calls(&log),
            vec![
                speak(1, "world"),
                EngineCall::Pause,
                EngineCall::Cancel,
                speak(2, "hello")
            ]
        );
    }

    #[test]
    fn immediate_switch_before_start_confirms_new_track() {
        let (mut ctl, log) = controller();

        ctl.play(FullText, "hello").unwrap();
        let first = ctl.utterance(FullText).unwrap();
        ctl.play(Summary, "world").unwrap();
        let second = ctl.utterance(Summary).unwrap();

        assert!(ctl.utterance(FullText).is_none());
        assert_eq!(
            calls(&log),
            vec![speak(1, "hello"), EngineCall::Cancel, speak(2, "world")]
        );

        // The superseded utterance's late start is ignored.
        ctl.handle_event(EngineEvent::started(first));
        assert_eq!(ctl.state(FullText), Idle);

        ctl.handle_event(EngineEvent::started(second));
        assert_eq!(
            ctl.snapshot(),
            PlaybackSnapshot {
                full_text: Idle,
                summary: Speaking
            }
        );
    }

    #[test]
    fn resume_reuses_the_paused_utterance() {
        let (mut ctl, log) = controller();
        let id = start(&mut ctl, FullText, "hello");
        ctl.pause(FullText).unwrap();

        ctl.play(FullText, "hello").unwrap();

        assert_eq!(ctl.state(FullText), Speaking);
        assert_eq!(ctl.utterance(FullText), Some(id));
        assert_eq!(
            calls(&log),
            vec![speak(1, "hello"), EngineCall::Pause, EngineCall::Resume]
        );
    }

    #[test]
    fn play_from_idle_always_builds_a_fresh_utterance() {
        let (mut ctl, log) = controller();
        let first = start(&mut ctl, Summary, "world");
        ctl.handle_event(EngineEvent::ended(first));

        let second = start(&mut ctl, Summary, "world");

        assert_ne!(first, second);
        assert!(second > first);
        assert_eq!(calls(&log), vec![speak(1, "world"), speak(2, "world")]);
    }

    #[test]
    fn replaying_a_speaking_track_cancels_the_old_utterance() {
        let (mut ctl, log) = controller();
        start(&mut ctl, FullText, "hello");

        ctl.play(FullText, "hello again").unwrap();

        assert_eq!(ctl.state(FullText), Idle);
        assert_eq!(ctl.utterance(FullText), Some(UtteranceId(2)));
        assert_eq!(
            calls(&log),
            vec![speak(1, "hello"), EngineCall::Cancel, speak(2, "hello again")]
        );
    }

    #[test]
    fn empty_text_is_rejected_without_touching_the_engine() {
        let (mut ctl, log) = controller();
        assert_eq!(ctl.play(FullText, "  \n"), Err(SpeechError::EmptyText));
        assert!(calls(&log).is_empty());
    }

    #[test]
    fn rejected_speak_leaves_track_idle() {
        let (engine, _log) = MockSpeechEngine::failing();
        let mut ctl = SpeechController::new(Some(Box::new(engine)));

        let err = ctl.play(Summary, "world").unwrap_err();

        assert!(matches!(err, SpeechError::Engine { track: Summary, .. }));
        assert_eq!(ctl.snapshot(), PlaybackSnapshot::default());
        assert!(ctl.utterance(Summary).is_none());
    }

    // ---- pause ---

    #[test]
    fn pause_only_acts_on_speaking_track() {
        let (mut ctl, log) = controller();

        ctl.pause(FullText).unwrap();
        assert_eq!(ctl.state(FullText), Idle);

        ctl.play(FullText, "hello").unwrap();
        ctl.pause(FullText).unwrap(); // pending, not yet speaking
        assert_eq!(ctl.state(FullText), Idle);

        let id = ctl.utterance(FullText).unwrap();
        ctl.handle_event(EngineEvent::started(id));
        ctl.pause(FullText).unwrap();
        assert_eq!(ctl.state(FullText), Paused);

        ctl.pause(FullText).unwrap();
        assert_eq!(ctl.state(FullText), Paused);

        ctl.pause(Summary).unwrap();
        assert_eq!(ctl.state(Summary), Idle);

        let pauses = calls(&log)
            .into_iter()
            .filter(|c| *c == EngineCall::Pause)
            .count();
        assert_eq!(pauses, 1);
    }

    // ---- stop ---

    #[test]
    fn stop_either_track_resets_both() {
        let (mut ctl, log) = controller();
        start(&mut ctl, Summary, "world");

        ctl.stop(FullText);

        assert_eq!(ctl.snapshot(), PlaybackSnapshot::default());
        assert!(ctl.utterance(Summary).is_none());
        assert_eq!(calls(&log).last(), Some(&EngineCall::Cancel));
    }

    #[test]
    fn stop_twice_matches_stop_once() {
        let (mut ctl, _log) = controller();
        start(&mut ctl, FullText, "hello");
        ctl.pause(FullText).unwrap();

        ctl.stop(FullText);
        let once = (ctl.snapshot(), ctl.utterance(FullText), ctl.utterance(Summary));
        ctl.stop(FullText);
        let twice = (ctl.snapshot(), ctl.utterance(FullText), ctl.utterance(Summary));

        assert_eq!(once, twice);
        assert_eq!(once.0, PlaybackSnapshot::default());
    }

    #[test]
    fn stop_all_clears_every_prior_state() {
        for setup in 0..4 {
            let (mut ctl, _log) = controller();
            match setup {
                0 => {}
                1 => {
                    ctl.play(FullText, "pending").unwrap();
                }
                2 => {
                    start(&mut ctl, Summary, "speaking");
                }
                _ => {
                    start(&mut ctl, FullText, "paused");
                    ctl.pause(FullText).unwrap();
                }
            }

            ctl.stop_all();

            assert_eq!(ctl.snapshot(), PlaybackSnapshot::default(), "setup {setup}");
            assert!(ctl.utterance(FullText).is_none());
            assert!(ctl.utterance(Summary).is_none());
        }
    }

    #[test]
    fn events_after_stop_are_stale() {
        let (mut ctl, _log) = controller();
        let id = start(&mut ctl, FullText, "hello");
        ctl.stop(FullText);

        assert!(ctl
            .handle_event(EngineEvent::error(id, "interrupted"))
            .is_none());
        ctl.handle_event(EngineEvent::started(id));
        assert_eq!(ctl.snapshot(), PlaybackSnapshot::default());
    }

    // ---- errors ---

    #[test]
    fn engine_error_idles_only_the_failing_track_and_is_reported() {
        let (mut ctl, log) = controller();
        let id = start(&mut ctl, Summary, "world");
        let before = calls(&log).len();

        let err = ctl.handle_event(EngineEvent::error(id, "synthesis-failed"));

        assert_eq!(
            err,
            Some(SpeechError::Engine {
                track: Summary,
                reason: "synthesis-failed".into()
            })
        );
        assert_eq!(ctl.snapshot(), PlaybackSnapshot::default());
        assert!(ctl.utterance(Summary).is_none());
        assert_eq!(calls(&log).len(), before, "no extra engine calls");

        // A second terminal event for the same utterance is ignored.
        assert!(ctl.handle_event(EngineEvent::ended(id)).is_none());
    }

    // ---- invariant under a mixed sequence ---

    #[test]
    fn at_most_one_track_is_ever_live() {
        let (mut ctl, _log) = controller();

        let step = |ctl: &mut SpeechController, op: u8| {
            match op {
                0 => {
                    let _ = ctl.play(FullText, "full");
                }
                1 => {
                    let _ = ctl.play(Summary, "sum");
                }
                2 => {
                    let _ = ctl.pause(FullText);
                }
                3 => {
                    let _ = ctl.pause(Summary);
                }
                4 => ctl.stop(Summary),
                _ => {
                    for t in Track::ALL {
                        if let Some(id) = ctl.utterance(t) {
                            ctl.handle_event(EngineEvent::started(id));
                        }
                    }
                }
            }
            assert_exclusive(ctl);
        };

        let script = [0, 5, 1, 5, 3, 0, 1, 5, 2, 3, 0, 5, 2, 1, 0, 4, 1, 5, 3, 1, 5, 0];
        for op in script {
            step(&mut ctl, op);
        }
    }

    // ---- unsupported ---

    #[test]
    fn without_engine_everything_is_inert() {
        let mut ctl = SpeechController::new(None);
        assert!(!ctl.is_supported());

        assert!(ctl.play(FullText, "hello").is_ok());
        assert!(ctl.pause(FullText).is_ok());
        ctl.stop(Summary);
        ctl.stop_all();

        assert_eq!(ctl.snapshot(), PlaybackSnapshot::default());
        assert!(ctl.utterance(FullText).is_none());
    }

    #[test]
    fn unsupported_notice_is_reported_once() {
        let mut ctl = SpeechController::new(None);
        assert_eq!(ctl.take_unsupported_notice(), Some(SpeechError::Unsupported));
        assert_eq!(ctl.take_unsupported_notice(), None);

        let (mut supported, _log) = controller();
        assert_eq!(supported.take_unsupported_notice(), None);
    }

    #[test]
    fn drop_cancels_live_narration() {
        let (mut ctl, log) = controller();
        start(&mut ctl, FullText, "hello");
        drop(ctl);
        assert_eq!(calls(&log).last(), Some(&EngineCall::Cancel));

        let (idle, log) = controller();
        drop(idle);
        assert!(calls(&log).is_empty());
    }

    // ---- labels ---

    #[test]
    fn track_other_and_labels() {
        assert_eq!(FullText.other(), Summary);
        assert_eq!(Summary.other(), FullText);
        assert_eq!(Summary.to_string(), "summary");
        assert_eq!(Paused.label(), "Paused");
    }
}
