//! `CommandEngine` — narration through an external TTS program.
//!
//! Each utterance runs the configured program (`espeak-ng`, `say`,
//! `spd-say -w`, …) with the text as its last argument. The child process
//! *is* the utterance:
//!
//! * spawn succeeded → `Started`
//! * exit status 0   → `Ended`
//! * any other exit  → `Error` (stderr, or the exit status)
//! * `cancel`        → child killed, no event
//! * `pause`/`resume` → `SIGSTOP` / `SIGCONT` (Unix only)
//!
//! Supervision runs on the tokio runtime, so `speak` must be called from
//! within one.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::oneshot;

use crate::config::SpeechConfig;

use super::engine::{EngineError, EngineEvent, EventSender, SpeechEngine, Utterance, UtteranceId};

// ---------------------------------------------------------------------------
// Program lookup
// ---------------------------------------------------------------------------

/// Resolve `program` to an executable path.
///
/// Names containing a path separator are checked as given; bare names are
/// searched for on `PATH`.
pub fn find_program(program: &str) -> Option<PathBuf> {
    let as_path = Path::new(program);
    if as_path.components().count() > 1 {
        return as_path.is_file().then(|| as_path.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = candidate.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

// ---------------------------------------------------------------------------
// CommandEngine
// ---------------------------------------------------------------------------

/// The utterance currently owned by the engine.
struct Running {
    id: UtteranceId,
    pid: Option<u32>,
    /// Set by the supervisor, under the lock, before the child is reaped.
    /// Signals are sent under the same lock, so `pid` cannot have been
    /// recycled while it reads `false`.
    reaped: Arc<Mutex<bool>>,
    kill: oneshot::Sender<()>,
}

fn lock_flag(flag: &Mutex<bool>) -> MutexGuard<'_, bool> {
    flag.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// [`SpeechEngine`] backed by a child process per utterance.
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
    events: EventSender,
    current: Option<Running>,
}

impl std::fmt::Debug for CommandEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEngine")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("current", &self.current.as_ref().map(|r| r.id))
            .finish()
    }
}

impl CommandEngine {
    pub fn new(program: PathBuf, args: Vec<String>, events: EventSender) -> Self {
        Self {
            program,
            args,
            events,
            current: None,
        }
    }

    /// Detect the narration capability described by `config`.
    ///
    /// Returns `None` when speech is disabled or the program cannot be found;
    /// callers treat that as "unsupported" for the rest of the session.
    pub fn detect(config: &SpeechConfig, events: EventSender) -> Option<Self> {
        if !config.enabled {
            log::info!("speech disabled in settings");
            return None;
        }
        match find_program(&config.program) {
            Some(program) => {
                log::info!("speech engine: {}", program.display());
                Some(Self::new(program, config.args.clone(), events))
            }
            None => {
                log::warn!("speech program `{}` not found on PATH", config.program);
                None
            }
        }
    }

    /// Send `sig` to the running child, if it has not been reaped yet.
    fn signal_current(&self, sig: Signal) -> Result<(), EngineError> {
        let Some(running) = &self.current else {
            return Ok(());
        };
        let Some(pid) = running.pid else {
            return Ok(());
        };
        let reaped = lock_flag(&running.reaped);
        if *reaped {
            return Ok(());
        }
        signal(pid, sig)
    }
}

impl SpeechEngine for CommandEngine {
    fn speak(&mut self, utterance: Utterance) -> Result<(), EngineError> {
        // One utterance at a time.
        self.cancel();

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(&utterance.text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Spawn(format!("{}: {e}", self.program.display())))?;

        let id = utterance.id;
        let pid = child.id();
        let reaped = Arc::new(Mutex::new(false));
        let (kill_tx, kill_rx) = oneshot::channel();

        log::debug!("speech: utterance {id} running as pid {pid:?}");
        let _ = self.events.send(EngineEvent::started(id));

        tokio::spawn(supervise(
            child,
            id,
            self.events.clone(),
            Arc::clone(&reaped),
            kill_rx,
        ));

        self.current = Some(Running {
            id,
            pid,
            reaped,
            kill: kill_tx,
        });
        Ok(())
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.signal_current(Signal::Stop)
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        self.signal_current(Signal::Continue)
    }

    fn cancel(&mut self) {
        if let Some(running) = self.current.take() {
            log::debug!("speech: cancelling utterance {}", running.id);
            let _ = running.kill.send(());
        }
    }
}

/// Wait for the child, or kill it when asked; report the outcome.
async fn supervise(
    mut child: Child,
    id: UtteranceId,
    events: EventSender,
    reaped: Arc<Mutex<bool>>,
    mut kill: oneshot::Receiver<()>,
) {
    let stderr = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        if let Some(mut pipe) = stderr {
            let _ = pipe.read_to_string(&mut buf).await;
        }
        buf
    });

    tokio::select! {
        status = reap(&mut child, &reaped) => {
            let event = match status {
                Ok(s) if s.success() => EngineEvent::ended(id),
                Ok(s) => {
                    let stderr = stderr_task.await.unwrap_or_default();
                    let reason = stderr.trim();
                    if reason.is_empty() {
                        EngineEvent::error(id, s.to_string())
                    } else {
                        EngineEvent::error(id, reason)
                    }
                }
                Err(e) => EngineEvent::error(id, e.to_string()),
            };
            let _ = events.send(event);
        }
        // Resolves on an explicit kill and when the engine is dropped.
        _ = &mut kill => {
            *lock_flag(&reaped) = true;
            if let Err(e) = child.kill().await {
                log::debug!("speech: kill of utterance {id} failed: {e}");
            }
        }
    }
}

/// Wait for the child to exit, mark it reaped, then collect its status.
async fn reap(child: &mut Child, reaped: &Mutex<bool>) -> std::io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            wait_exited(pid).await;
        }
    }
    *lock_flag(reaped) = true;
    child.wait().await
}

/// Block (off the runtime) until `pid` has exited, leaving it waitable.
#[cfg(unix)]
async fn wait_exited(pid: u32) {
    let waited = tokio::task::spawn_blocking(move || loop {
        // SAFETY: siginfo_t is plain data; waitid only writes into it.
        let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
        // WNOWAIT keeps the child unreaped; `child.wait()` reaps it.
        let rc = unsafe {
            libc::waitid(
                libc::P_PID,
                pid as libc::id_t,
                &mut info,
                libc::WEXITED | libc::WNOWAIT,
            )
        };
        if rc == 0 {
            return;
        }
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            log::debug!("speech: waitid({pid}) failed: {err}");
            return;
        }
    })
    .await;
    if let Err(e) = waited {
        log::debug!("speech: exit watcher for pid {pid} failed: {e}");
    }
}

// ---------------------------------------------------------------------------
// Job-control signals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Signal {
    Stop,
    Continue,
}

#[cfg(unix)]
fn signal(pid: u32, sig: Signal) -> Result<(), EngineError> {
    let signo = match sig {
        Signal::Stop => libc::SIGSTOP,
        Signal::Continue => libc::SIGCONT,
    };
    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(pid as libc::pid_t, signo) };
    if rc != 0 {
        return Err(EngineError::Control(
            std::io::Error::last_os_error().to_string(),
        ));
    }
    Ok(())
}

#[cfg(not(unix))]
fn signal(_pid: u32, sig: Signal) -> Result<(), EngineError> {
    Err(EngineError::Unsupported(match sig {
        Signal::Stop => "pause",
        Signal::Continue => "resume",
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_program_is_not_found() {
        assert!(find_program("definitely-not-a-tts-program-7f3a").is_none());
        assert!(find_program("/nonexistent/dir/espeak-ng").is_none());
    }

    #[test]
    fn disabled_speech_is_not_detected() {
        let (tx, _rx) = crate::speech::event_channel();
        let config = SpeechConfig {
            enabled: false,
            ..SpeechConfig::default()
        };
        assert!(CommandEngine::detect(&config, tx).is_none());
    }

    #[cfg(unix)]
    mod unix {
        use std::time::Duration;
        use std::path::PathBuf;

        use super::super::{find_program, lock_flag, CommandEngine};
        use crate::config::SpeechConfig;
        use crate::speech::engine::{
            EngineError, EngineEvent, EngineEventKind, EventSender, SpeechEngine, Utterance,
            UtteranceId,
        };
        use crate::speech::event_channel;

        /// `sh -c <script> sh <text>`: the script sees the text as `$1`.
        fn shell_engine(script: &str, events: EventSender) -> CommandEngine {
            let sh = find_program("sh").expect("sh on PATH");
            CommandEngine::new(sh, vec!["-c".into(), script.into(), "sh".into()], events)
        }

        fn utterance(id: u64) -> Utterance {
            Utterance {
                id: UtteranceId(id),
                text: "hello".into(),
            }
        }

        #[test]
        fn sh_is_detected() {
            let (tx, _rx) = event_channel();
            let config = SpeechConfig {
                enabled: true,
                program: "sh".into(),
                args: Vec::new(),
            };
            assert!(CommandEngine::detect(&config, tx).is_some());
        }

        #[tokio::test]
        async fn successful_run_reports_started_then_ended() {
            let (tx, mut rx) = event_channel();
            let mut engine = shell_engine("test \"$1\" = hello", tx);

            engine.speak(utterance(1)).unwrap();

            assert_eq!(rx.recv().await, Some(EngineEvent::started(UtteranceId(1))));
            assert_eq!(rx.recv().await, Some(EngineEvent::ended(UtteranceId(1))));
        }

        #[tokio::test]
        async fn failing_run_reports_stderr() {
            let (tx, mut rx) = event_channel();
            let mut engine = shell_engine("echo 'no audio device' >&2; exit 3", tx);

            engine.speak(utterance(1)).unwrap();

            assert_eq!(rx.recv().await, Some(EngineEvent::started(UtteranceId(1))));
            let event = rx.recv().await.unwrap();
            assert_eq!(
                event.kind,
                EngineEventKind::Error("no audio device".into())
            );
        }

        #[tokio::test]
        async fn cancelled_run_reports_nothing_more() {
            let (tx, mut rx) = event_channel();
            let mut engine = shell_engine("sleep 5", tx);

            engine.speak(utterance(1)).unwrap();
            assert_eq!(rx.recv().await, Some(EngineEvent::started(UtteranceId(1))));

            engine.cancel();

            let next = tokio::time::timeout(Duration::from_millis(300), rx.recv()).await;
            assert!(next.is_err(), "unexpected event after cancel: {next:?}");
        }

        #[tokio::test]
        async fn pause_and_resume_signal_the_child() {
            let (tx, mut rx) = event_channel();
            let mut engine = shell_engine("sleep 0.2", tx);

            engine.speak(utterance(1)).unwrap();
            assert_eq!(rx.recv().await, Some(EngineEvent::started(UtteranceId(1))));

            engine.pause().unwrap();
            let paused = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
            assert!(paused.is_err(), "stopped child must not finish");

            engine.resume().unwrap();
            let ended = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("child finishes after resume");
            assert_eq!(ended, Some(EngineEvent::ended(UtteranceId(1))));
        }

        #[tokio::test]
        async fn exited_child_is_not_signalled() {
            let (tx, mut rx) = event_channel();
            let mut engine = shell_engine("exit 0", tx);

            engine.speak(utterance(1)).unwrap();
            assert_eq!(rx.recv().await, Some(EngineEvent::started(UtteranceId(1))));
            assert_eq!(rx.recv().await, Some(EngineEvent::ended(UtteranceId(1))));

            let running = engine.current.as_ref().expect("utterance still held");
            assert!(*lock_flag(&running.reaped));
            assert!(engine.pause().is_ok());
            assert!(engine.resume().is_ok());
        }

        #[tokio::test]
        async fn missing_program_fails_to_spawn() {
            let (tx, _rx) = event_channel();
            let mut engine =
                CommandEngine::new(PathBuf::from("/nonexistent/tts"), Vec::new(), tx);

            let err = engine.speak(utterance(1)).unwrap_err();
            assert!(matches!(err, EngineError::Spawn(_)));
        }

        #[tokio::test]
        async fn pause_without_utterance_is_a_no_op() {
            let (tx, _rx) = event_channel();
            let mut engine = shell_engine("exit 0", tx);
            assert!(engine.pause().is_ok());
            assert!(engine.resume().is_ok());
        }
    }
}
