//! Application entry point: Doc Studio shell.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (writes the defaults on first run).
//! 3. Build the AI flow client ([`ApiFlowClient`]) from config.
//! 4. Create the engine event channel and detect the speech program.
//! 5. Build the two sessions ([`PdfStudio`], [`PhotoAnalyzer`]).
//! 6. Run the command loop until `quit` or end of input, then stop
//!    narration.

use std::sync::Arc;

use doc_studio::{
    ai::{AiFlows, ApiFlowClient},
    config::AppConfig,
    shell::{ShellCommand, HELP},
    speech::{event_channel, CommandEngine, EventReceiver, SpeechController, SpeechEngine, Track},
    studio::{Notice, PdfStudio, PhotoAnalyzer, StudioError},
};
use tokio::io::{AsyncBufReadExt, BufReader};

// ---------------------------------------------------------------------------
// Command loop
// ---------------------------------------------------------------------------

struct Shell {
    pdf: PdfStudio,
    photo: PhotoAnalyzer,
}

impl Shell {
    /// Run one command. Returns `false` when the shell should exit.
    async fn dispatch(&mut self, command: ShellCommand) -> bool {
        let outcome: Result<Option<Notice>, StudioError> = match command {
            ShellCommand::Open(path) => self.pdf.select_file(&path).map(Some),
            ShellCommand::Summary => {
                let result = self.pdf.request_summary().await;
                if let Some(summary) = self.pdf.summary() {
                    println!("\n{summary}\n");
                }
                result.map(Some)
            }
            ShellCommand::Prepare => {
                let result = self.pdf.request_speech_prep().await;
                if let Some(text) = self.pdf.extracted_text() {
                    println!("\n{}\n", preview(text, 400));
                }
                result.map(Some)
            }
            ShellCommand::Play(track) => self.pdf.play(track).map(|()| None),
            ShellCommand::Pause(track) => self.pdf.pause(track).map(|()| None),
            ShellCommand::Stop(Some(track)) => {
                self.pdf.stop(track);
                Ok(None)
            }
            ShellCommand::Stop(None) => {
                self.pdf.stop_all();
                Ok(None)
            }
            ShellCommand::Photo(path) => self.analyze_photo(&path).await,
            ShellCommand::Status => {
                self.print_status();
                Ok(None)
            }
            ShellCommand::Help => {
                println!("{HELP}");
                Ok(None)
            }
            ShellCommand::Quit => return false,
        };

        match outcome {
            Ok(Some(notice)) => println!("{notice}"),
            Ok(None) => {}
            Err(e) => {
                log::debug!("command failed: {e:?}");
                println!("{}", Notice::from(&e));
            }
        }
        true
    }

    async fn analyze_photo(
        &mut self,
        path: &std::path::Path,
    ) -> Result<Option<Notice>, StudioError> {
        self.photo.select_file(path)?;
        let notice = self.photo.analyze().await?;
        if let Some(objects) = self.photo.describe() {
            println!("\n{objects}\n");
        }
        Ok(Some(notice))
    }

    fn print_status(&self) {
        match self.pdf.file() {
            Some(f) => println!("pdf:      {}", f.name()),
            None => println!("pdf:      (none)"),
        }
        let summary = match (self.pdf.summary(), self.pdf.summary_error()) {
            (Some(s), _) => format!("{} chars", s.chars().count()),
            (None, Some(e)) => format!("failed: {e}"),
            (None, None) => "-".to_string(),
        };
        let text = match (self.pdf.extracted_text(), self.pdf.extraction_error()) {
            (Some(t), _) => format!("{} chars", t.chars().count()),
            (None, Some(e)) => format!("failed: {e}"),
            (None, None) => "-".to_string(),
        };
        println!("summary:  {summary}");
        println!("text:     {text}");

        if !self.pdf.speech_supported() {
            println!("speech:   unsupported");
        } else {
            let playback = self.pdf.playback();
            for track in Track::ALL {
                let c = self.pdf.controls(track);
                println!(
                    "{:<9} {:<9} [play:{} pause:{} resume:{} stop:{}]",
                    format!("{track}:"),
                    playback.get(track).label(),
                    flag(c.can_play),
                    flag(c.can_pause),
                    flag(c.can_resume),
                    flag(c.can_stop),
                );
            }
        }

        match self.photo.file() {
            Some(f) => println!("photo:    {}", f.name()),
            None => println!("photo:    (none)"),
        }
        let objects = match (self.photo.objects(), self.photo.error()) {
            (Some(o), _) => format!("{} found", o.len()),
            (None, Some(e)) => format!("failed: {e}"),
            (None, None) => "-".to_string(),
        };
        println!("objects:  {objects}");
    }
}

fn flag(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// First `max` characters of `text`, marked when cut.
fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

async fn run(mut shell: Shell, mut events: EventReceiver) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if let Some(notice) = shell.pdf.take_startup_notice() {
        println!("{notice}");
    }
    println!("Doc Studio. Type `help` for commands.");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    log::debug!("end of input");
                    break;
                };
                match ShellCommand::parse(&line) {
                    Ok(Some(command)) => {
                        if !shell.dispatch(command).await {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{e}"),
                }
            }
            Some(event) = events.recv() => {
                if let Some(notice) = shell.pdf.handle_engine_event(event) {
                    println!("{notice}");
                }
            }
        }
    }

    shell.pdf.stop_all();
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Doc Studio starting up");

    // 2. Configuration
    let config = AppConfig::load_or_init().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. AI flows
    let flows: Arc<dyn AiFlows> = Arc::new(ApiFlowClient::from_config(&config.ai));

    // 4. Speech engine. A sender is kept here so the receiver stays open
    //    even when no engine was found.
    let (event_tx, event_rx) = event_channel();
    let engine = CommandEngine::detect(&config.speech, event_tx.clone())
        .map(|e| Box::new(e) as Box<dyn SpeechEngine>);
    let speech = SpeechController::new(engine);

    // 5. Sessions
    let shell = Shell {
        pdf: PdfStudio::new(Arc::clone(&flows), speech, &config.files),
        photo: PhotoAnalyzer::new(flows, &config.files),
    };

    // 6. Command loop
    let result = run(shell, event_rx).await;
    drop(event_tx);
    log::info!("Doc Studio shutting down");
    result
}
