use anyhow::{Context, Result};
use std::fmt::Write as _;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::events::{EventPayload, EventType, SessionEvent};
use crate::gate::QuizPhase;
use crate::session::{Overlay, SessionHandle, ShellView};
use crate::utils::format_duration;

pub const HELP: &str = "\
commands:
  p            play / pause
  s <secs>     seek
  m            mute / unmute
  v <0-1>      volume
  f            fullscreen
  c            mark complete
  1..9         choose a quiz option
  a            submit the chosen option
  <enter>      show status
  h            help
  q            quit
";

/// A parsed line of learner input.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalCommand {
    TogglePlay,
    Seek(f64),
    ToggleMute,
    Volume(f64),
    Fullscreen,
    Complete,
    /// Zero-based index into the options of the open quiz.
    Choose(usize),
    Submit,
    Status,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<TerminalCommand, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(TerminalCommand::Status);
    };
    let argument = words.next();

    let number = |name: &str| -> Result<f64, String> {
        argument
            .ok_or_else(|| format!("'{}' needs a number", name))?
            .parse::<f64>()
            .map_err(|_| format!("'{}' needs a number", name))
    };

    match word {
        "p" | "play" | "pause" => Ok(TerminalCommand::TogglePlay),
        "s" | "seek" => Ok(TerminalCommand::Seek(number("s")?)),
        "m" | "mute" => Ok(TerminalCommand::ToggleMute),
        "v" | "volume" => Ok(TerminalCommand::Volume(number("v")?)),
        "f" | "fullscreen" => Ok(TerminalCommand::Fullscreen),
        "c" | "complete" => Ok(TerminalCommand::Complete),
        "a" | "submit" => Ok(TerminalCommand::Submit),
        "h" | "help" | "?" => Ok(TerminalCommand::Help),
        "q" | "quit" | "exit" => Ok(TerminalCommand::Quit),
        other => match other.parse::<usize>() {
            Ok(choice) if choice >= 1 => Ok(TerminalCommand::Choose(choice - 1)),
            _ => Err(format!("unknown command '{}' (h for help)", other)),
        },
    }
}

/// One status line, plus the quiz card when one is open.
pub fn render_view(view: &ShellView) -> String {
    let mut out = String::new();
    let playback = &view.playback;
    let state = if playback.is_playing { ">" } else { "||" };
    let _ = write!(
        out,
        "[{}] {} {} / {} (unlocked to {})",
        state,
        view.title,
        format_duration(playback.current_time),
        format_duration(playback.duration),
        format_duration(view.seek_ceiling.min(view.max_watched)),
    );
    if playback.is_muted {
        out.push_str(" muted");
    } else {
        let _ = write!(out, " vol {:.0}%", playback.volume * 100.0);
    }
    if playback.is_fullscreen {
        out.push_str(" fullscreen");
    }
    if view.completed {
        out.push_str(" completed");
    }

    if !view.markers.is_empty() {
        let markers: Vec<String> = view
            .markers
            .iter()
            .map(|m| {
                let check = if m.answered { "x" } else { " " };
                format!("[{}] {}", check, format_duration(m.time))
            })
            .collect();
        let _ = write!(out, "\n  checkpoints: {}", markers.join(" "));
    }

    match &view.overlay {
        Overlay::Loading => out.push_str("\n  loading..."),
        Overlay::None => {}
        Overlay::Fallback { message } => {
            let _ = write!(out, "\n  !! {}", message);
        }
        Overlay::Quiz(quiz) => {
            let _ = write!(out, "\n  QUIZ: {}", quiz.question);
            for (index, option) in quiz.options.iter().enumerate() {
                let marker = if quiz.selected.as_ref() == Some(&option.id) {
                    "*"
                } else {
                    " "
                };
                let _ = write!(out, "\n   {}{}. {}", marker, index + 1, option.text);
            }
            match quiz.phase {
                QuizPhase::Submitting => out.push_str("\n  checking..."),
                QuizPhase::Resolved(verdict) => {
                    let _ = write!(out, "\n  {:?}!", verdict);
                }
                QuizPhase::Presenting | QuizPhase::Idle => {}
            }
            if let Some(note) = &quiz.error_note {
                let _ = write!(out, "\n  {}", note);
            }
        }
    }
    out
}

/// Coarse fingerprint of a view; a change is worth printing unprompted.
fn headline(view: &ShellView) -> String {
    let overlay = match &view.overlay {
        Overlay::Loading => "loading".to_string(),
        Overlay::None => "none".to_string(),
        Overlay::Fallback { .. } => "fallback".to_string(),
        Overlay::Quiz(quiz) => format!(
            "quiz:{}:{:?}:{:?}:{}",
            quiz.checkpoint_id,
            quiz.phase,
            quiz.selected,
            quiz.error_note.is_some()
        ),
    };
    format!("{}|{}|{}", overlay, view.completed, view.playback.is_playing)
}

/// Events worth a log line of their own.
const NOTICE_TYPES: [EventType; 4] = [
    EventType::QuizResolved,
    EventType::SubmissionFailed,
    EventType::SessionFallback,
    EventType::PlaybackCompleted,
];

pub fn render_notice(event: &SessionEvent) -> Option<String> {
    let detail = match (&event.event_type, &event.payload) {
        (
            EventType::QuizResolved,
            EventPayload::Quiz {
                checkpoint_id,
                verdict: Some(verdict),
                ..
            },
        ) => format!("{} answered: {:?}", checkpoint_id, verdict),
        (EventType::SubmissionFailed | EventType::SessionFallback, EventPayload::Error { message }) => {
            message.clone()
        }
        (EventType::PlaybackCompleted, _) => format!("{} completed", event.video_id),
        _ => return None,
    };
    Some(format!(
        "{} {}: {}",
        event.timestamp.format("%H:%M:%S"),
        event.event_type.as_str(),
        detail
    ))
}

/// Line-oriented front-end over a running session.
pub struct TerminalApp {
    handle: SessionHandle,
}

impl TerminalApp {
    pub fn new(handle: SessionHandle) -> Self {
        Self { handle }
    }

    /// Read commands from `input` until quit or end of input.
    pub async fn run<R, W>(self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut views = self.handle.watch();
        let mut notices = self
            .handle
            .events()
            .subscribe_to_types(NOTICE_TYPES.to_vec());
        let mut last_headline = String::new();

        output.write_all(HELP.as_bytes()).await?;

        loop {
            tokio::select! {
                biased;

                changed = views.changed() => {
                    if changed.is_err() {
                        debug!("Session ended");
                        break;
                    }
                    let view = views.borrow_and_update().clone();
                    let current = headline(&view);
                    if current != last_headline {
                        last_headline = current;
                        write_line(&mut output, &render_view(&view)).await?;
                    }
                }
                event = notices.recv() => {
                    let event = event.context("Event stream closed")?;
                    if let Some(notice) = render_notice(&event) {
                        write_line(&mut output, &notice).await?;
                    }
                }
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read input")? else {
                        break;
                    };
                    match parse_command(&line) {
                        Ok(TerminalCommand::Quit) => break,
                        Ok(command) => {
                            let reply = self.execute(command).await;
                            write_line(&mut output, &reply).await?;
                        }
                        Err(message) => write_line(&mut output, &message).await?,
                    }
                }
            }
        }

        if let Err(e) = self.handle.shutdown().await {
            debug!("Session already stopped: {}", e);
        }
        Ok(())
    }

    async fn execute(&self, command: TerminalCommand) -> String {
        let handle = &self.handle;
        let result = match command {
            TerminalCommand::TogglePlay => handle.toggle_play().await.map(|_| String::new()),
            TerminalCommand::Seek(target) => handle.seek(target).await.map(|decision| {
                if decision.clamped {
                    format!(
                        "seek limited to {} (not watched yet)",
                        format_duration(decision.target)
                    )
                } else {
                    format!("seek to {}", format_duration(decision.target))
                }
            }),
            TerminalCommand::ToggleMute => handle
                .toggle_mute()
                .await
                .map(|muted| if muted { "muted" } else { "unmuted" }.to_string()),
            TerminalCommand::Volume(volume) => handle
                .set_volume(volume)
                .await
                .map(|_| format!("volume {:.0}%", volume.clamp(0.0, 1.0) * 100.0)),
            TerminalCommand::Fullscreen => handle
                .toggle_fullscreen()
                .await
                .map(|on| if on { "fullscreen" } else { "windowed" }.to_string()),
            TerminalCommand::Complete => handle
                .mark_complete()
                .await
                .map(|_| "marked complete".to_string()),
            TerminalCommand::Choose(index) => {
                let option = handle
                    .view()
                    .quiz()
                    .and_then(|quiz| quiz.options.get(index))
                    .map(|option| option.id.clone());
                match option {
                    Some(option) => handle.select_option(option).await.map(|_| String::new()),
                    None => return "no such option".to_string(),
                }
            }
            TerminalCommand::Submit => handle.submit_answer().await.map(|_| String::new()),
            TerminalCommand::Status => handle.current_view().await.map(|view| render_view(&view)),
            TerminalCommand::Help => Ok(HELP.trim_end().to_string()),
            TerminalCommand::Quit => Ok(String::new()),
        };
        match result {
            Ok(reply) => reply,
            Err(e) => format!("! {}", e),
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> Result<()> {
    if line.is_empty() {
        return Ok(());
    }
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}
