use futures::future::OptionFuture;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::shell::{FullscreenControl, Overlay, ShellView, controls_visible};
use crate::api::{ApiError, LessonApi};
use crate::config::{AnswerValidation, Config};
use crate::events::{EventBus, EventPayload, EventType};
use crate::gate::{
    CheckpointScheduler, GatedSeekPolicy, QuizEngine, QuizPhase, SeekDecision, Selection, Verdict,
};
use crate::models::{Checkpoint, CheckpointId, Lesson, OptionId, PlaybackState, ResumePoint, VideoId};
use crate::player::{BackendFactory, SourceEvent, TickMode, TimeSource, create_source};
use crate::utils::errors::PlayerError;
use crate::workers::ProgressReporter;

/// Failures while assembling a session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Lesson backend error: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Player(#[from] PlayerError),
}

/// Commands that can be sent to a lesson session
#[derive(Debug)]
pub enum SessionCommand {
    Play {
        respond_to: oneshot::Sender<Result<(), PlayerError>>,
    },
    Pause {
        respond_to: oneshot::Sender<Result<(), PlayerError>>,
    },
    TogglePlay {
        respond_to: oneshot::Sender<Result<(), PlayerError>>,
    },
    /// Learner seek, subject to the gate
    Seek {
        target: f64,
        respond_to: oneshot::Sender<Result<SeekDecision, PlayerError>>,
    },
    /// Set volume (0.0 to 1.0)
    SetVolume {
        volume: f64,
        respond_to: oneshot::Sender<Result<(), PlayerError>>,
    },
    ToggleMute {
        respond_to: oneshot::Sender<Result<bool, PlayerError>>,
    },
    ToggleFullscreen {
        respond_to: oneshot::Sender<Result<bool, PlayerError>>,
    },
    /// Pointer entered or left the player surface
    SetPointerInside { inside: bool },
    SelectOption {
        option: OptionId,
        respond_to: oneshot::Sender<Result<Selection, PlayerError>>,
    },
    SubmitAnswer {
        respond_to: oneshot::Sender<Result<(), PlayerError>>,
    },
    MarkComplete {
        respond_to: oneshot::Sender<Result<(), PlayerError>>,
    },
    GetView {
        respond_to: oneshot::Sender<ShellView>,
    },
    Shutdown {
        respond_to: oneshot::Sender<()>,
    },
}

/// Everything a session needs, gathered before playback starts.
pub struct SessionSetup {
    pub lesson: Lesson,
    pub checkpoints: Vec<Checkpoint>,
    pub resume: ResumePoint,
    pub source: Box<dyn TimeSource>,
    pub api: Arc<dyn LessonApi>,
    pub config: Config,
    pub fullscreen: Box<dyn FullscreenControl>,
    pub events: EventBus,
}

/// A resolved quiz waiting out its feedback delay.
struct PendingResolution {
    deadline: Instant,
    checkpoint: Checkpoint,
    verdict: Verdict,
}

/// Ticks are ignored until the backend reports a position near `target`
/// or `until` passes.
struct SeekSettle {
    target: f64,
    until: Instant,
}

type VerdictResult = (CheckpointId, Result<bool, ApiError>);

/// Single task owning all playback state of one lesson.
pub struct LessonSession {
    video_id: VideoId,
    title: String,
    config: Config,
    api: Arc<dyn LessonApi>,
    source: Box<dyn TimeSource>,
    tick_mode: TickMode,
    duration_hint: f64,
    resume: ResumePoint,

    scheduler: CheckpointScheduler,
    seek_policy: GatedSeekPolicy,
    quiz: QuizEngine,
    reporter: ProgressReporter,
    fullscreen: Box<dyn FullscreenControl>,

    playback: PlaybackState,
    ready: bool,
    fallback: Option<PlayerError>,
    completed: bool,
    pointer_inside: bool,
    source_closed: bool,

    pending: Option<PendingResolution>,
    ready_deadline: Option<Instant>,
    settle: Option<SeekSettle>,

    receiver: mpsc::UnboundedReceiver<SessionCommand>,
    verdict_tx: mpsc::UnboundedSender<VerdictResult>,
    verdict_rx: mpsc::UnboundedReceiver<VerdictResult>,
    view_tx: watch::Sender<ShellView>,
    events: EventBus,
    shutdown: CancellationToken,
}

impl LessonSession {
    pub fn new(setup: SessionSetup) -> (SessionHandle, LessonSession) {
        let SessionSetup {
            lesson,
            checkpoints,
            resume,
            source,
            api,
            config,
            fullscreen,
            events,
        } = setup;

        let require_answer_key = config.quiz.answer_validation == AnswerValidation::Client;
        let scheduler = CheckpointScheduler::new(checkpoints, require_answer_key);

        let mut seek_policy = GatedSeekPolicy::new();
        let mut reporter = ProgressReporter::new(
            Arc::clone(&api),
            lesson.id.clone(),
            config.progress.report_interval_secs,
        );
        if resume.completed {
            seek_policy.unlock();
            reporter = reporter.with_completion_recorded();
        }

        let tick_mode = source.tick_mode();
        let (sender, receiver) = mpsc::unbounded_channel();
        let (verdict_tx, verdict_rx) = mpsc::unbounded_channel();
        let mut initial_view = ShellView::loading(
            lesson.id.clone(),
            lesson.title.clone(),
            config.playback.default_volume,
        );
        initial_view.completed = resume.completed;
        let (view_tx, view_rx) = watch::channel(initial_view);
        let shutdown = CancellationToken::new();

        let session = LessonSession {
            video_id: lesson.id.clone(),
            title: lesson.title.clone(),
            quiz: QuizEngine::new(config.quiz.auto_submit),
            playback: PlaybackState::new(config.playback.default_volume),
            config,
            api,
            source,
            tick_mode,
            duration_hint: lesson.duration,
            resume,
            scheduler,
            seek_policy,
            reporter,
            fullscreen,
            ready: false,
            fallback: None,
            completed: resume.completed,
            pointer_inside: false,
            source_closed: false,
            pending: None,
            ready_deadline: None,
            settle: None,
            receiver,
            verdict_tx,
            verdict_rx,
            view_tx,
            events: events.clone(),
            shutdown: shutdown.clone(),
        };
        let handle = SessionHandle {
            sender,
            view: view_rx,
            events,
            shutdown,
        };

        (handle, session)
    }

    /// Run the session event loop until shutdown or until every handle is gone.
    pub async fn run(mut self) {
        info!("Session for video {} started", self.video_id);

        let start_at = if self.resume.completed {
            0.0
        } else {
            self.resume.current_time.max(0.0)
        };
        self.ready_deadline = Some(Instant::now() + self.config.playback.ready_timeout());
        if let Err(e) = self.source.load(start_at).await {
            self.enter_fallback(e).await;
        }
        self.publish_view();

        loop {
            let pending_deadline: OptionFuture<_> =
                self.pending.as_ref().map(|p| sleep_until(p.deadline)).into();
            let ready_deadline: OptionFuture<_> = self.ready_deadline.map(sleep_until).into();

            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    debug!("Session cancelled");
                    break;
                }
                Some(()) = pending_deadline => {
                    self.finish_resolution().await;
                }
                Some(()) = ready_deadline => {
                    let timeout = self.config.playback.ready_timeout();
                    warn!("Backend not ready after {:?}", timeout);
                    self.enter_fallback(PlayerError::ReadyTimeout(timeout)).await;
                }
                event = self.source.next_event(), if !self.source_closed => {
                    match event {
                        Some(event) => self.handle_source_event(event).await,
                        None => self.handle_source_closed().await,
                    }
                }
                Some((checkpoint_id, result)) = self.verdict_rx.recv() => {
                    self.handle_verdict(checkpoint_id, result).await;
                }
                command = self.receiver.recv() => {
                    match command {
                        Some(SessionCommand::Shutdown { respond_to }) => {
                            self.close().await;
                            let _ = respond_to.send(());
                            return;
                        }
                        Some(command) => self.handle_command(command).await,
                        None => {
                            debug!("All session handles dropped");
                            break;
                        }
                    }
                }
            }
        }

        self.close().await;
    }

    async fn close(&mut self) {
        self.source.teardown().await;
        self.source_closed = true;
        self.pending = None;
        self.ready_deadline = None;
        self.events
            .emit(EventType::SessionClosed, &self.video_id, EventPayload::None)
            .await;
        info!("Session for video {} closed", self.video_id);
    }

    fn tolerance(&self) -> f64 {
        self.config.playback.tolerance_for(self.tick_mode)
    }

    fn seek_ceiling(&self) -> f64 {
        self.scheduler.seek_ceiling(self.playback.duration)
    }

    fn view(&self) -> ShellView {
        let overlay = if let Some(error) = &self.fallback {
            Overlay::Fallback {
                message: error.fallback_message(),
            }
        } else if !self.ready {
            Overlay::Loading
        } else if let Some(quiz) = self.quiz.view() {
            Overlay::Quiz(quiz)
        } else {
            Overlay::None
        };

        ShellView {
            video_id: self.video_id.clone(),
            title: self.title.clone(),
            playback: self.playback.clone(),
            max_watched: self.seek_policy.max_watched(),
            seek_ceiling: self.seek_ceiling(),
            markers: self.scheduler.markers(),
            controls_visible: controls_visible(
                &overlay,
                self.pointer_inside,
                self.playback.is_playing,
            ),
            overlay,
            completed: self.completed,
        }
    }

    fn publish_view(&self) {
        self.view_tx.send_replace(self.view());
    }

    /// Learner controls are inert during quizzes and after a fatal error.
    fn guard_controls(&self) -> Result<(), PlayerError> {
        if let Some(error) = &self.fallback {
            return Err(error.clone());
        }
        if !self.ready {
            return Err(PlayerError::NotReady);
        }
        if self.quiz.is_active() || self.pending.is_some() {
            return Err(PlayerError::QuizActive);
        }
        Ok(())
    }

    async fn handle_source_event(&mut self, event: SourceEvent) {
        if self.fallback.is_some() {
            return;
        }

        match event {
            SourceEvent::Ready { duration } => self.handle_ready(duration).await,
            SourceEvent::Tick { time } => self.handle_tick(time).await,
            SourceEvent::Playing => {
                if self.quiz.is_active() {
                    // the embedded engine can be started from its own surface
                    debug!("Backend started playing during a quiz; pausing again");
                    if let Err(e) = self.source.pause().await {
                        warn!("Failed to pause backend: {}", e);
                    }
                    return;
                }
                self.playback.is_playing = true;
                self.events
                    .emit_playback(
                        EventType::PlaybackStarted,
                        &self.video_id,
                        self.playback.current_time,
                        self.playback.duration,
                    )
                    .await;
                self.publish_view();
            }
            SourceEvent::Paused => {
                self.playback.is_playing = false;
                self.events
                    .emit_playback(
                        EventType::PlaybackPaused,
                        &self.video_id,
                        self.playback.current_time,
                        self.playback.duration,
                    )
                    .await;
                self.publish_view();
            }
            SourceEvent::Ended => {
                self.playback.is_playing = false;
                if self.playback.duration > 0.0 {
                    self.playback.current_time = self.playback.duration;
                    self.seek_policy.observe(self.playback.duration);
                }
                info!("Playback of {} reached the end", self.video_id);
                self.complete().await;
                self.publish_view();
            }
            SourceEvent::Error(error) => {
                if error.is_fatal() {
                    self.enter_fallback(error).await;
                } else {
                    warn!("Backend reported a recoverable error: {}", error);
                }
            }
        }
    }

    async fn handle_ready(&mut self, duration: f64) {
        if self.ready {
            return;
        }
        self.ready = true;
        self.ready_deadline = None;
        self.playback.duration = if duration > 0.0 {
            duration
        } else {
            self.duration_hint.max(0.0)
        };
        self.playback.current_time = self.source.current_time();
        // the resume point counts as watched before any tick arrives
        self.seek_policy.observe(self.playback.current_time);

        // the embedded engine does not report volume, so push ours
        if let Err(e) = self.source.set_volume(self.playback.volume).await {
            warn!("Failed to apply volume: {}", e);
        }
        if let Err(e) = self.source.set_muted(self.playback.is_muted).await {
            warn!("Failed to apply mute state: {}", e);
        }

        info!(
            "Video {} ready ({:.1}s, {} checkpoint(s))",
            self.video_id,
            self.playback.duration,
            self.scheduler.checkpoints().len()
        );
        self.events
            .emit(
                EventType::SessionReady,
                &self.video_id,
                EventPayload::Lesson {
                    title: self.title.clone(),
                    duration: self.playback.duration,
                    checkpoint_count: self.scheduler.checkpoints().len(),
                    resume_at: self.playback.current_time,
                },
            )
            .await;
        self.publish_view();
    }

    async fn handle_tick(&mut self, time: f64) {
        if !self.ready || !time.is_finite() {
            return;
        }
        trace!("tick {:.2}", time);

        self.playback.current_time = time;
        self.seek_policy.observe(time);
        let duration = self.source.duration();
        if duration > self.playback.duration {
            self.playback.duration = duration;
        }
        self.reporter.on_tick(time);

        if let Some(settle) = &self.settle {
            let near = (time - settle.target).abs() < self.tolerance().max(1.0);
            if near || Instant::now() >= settle.until {
                self.settle = None;
            } else {
                trace!("Ignoring stale tick {:.2} (seeking to {:.2})", time, settle.target);
                self.publish_view();
                return;
            }
        }

        if !self.quiz.is_active() && self.pending.is_none() {
            if let Some(checkpoint) = self.scheduler.due(time, self.tolerance()).cloned() {
                self.activate(checkpoint).await;
                return;
            }
        }

        self.publish_view();
    }

    async fn activate(&mut self, checkpoint: Checkpoint) {
        info!(
            "Checkpoint {} reached at {:.2}s",
            checkpoint.id, self.playback.current_time
        );
        if let Err(e) = self.quiz.present(checkpoint.clone()) {
            warn!("Could not present checkpoint {}: {}", checkpoint.id, e);
            return;
        }
        self.playback.is_playing = false;
        self.publish_view();

        if let Err(e) = self.source.pause().await {
            warn!("Failed to pause for checkpoint: {}", e);
        }
        self.events
            .emit_quiz_presented(&self.video_id, &checkpoint)
            .await;
    }

    async fn handle_source_closed(&mut self) {
        self.source_closed = true;
        if !self.ready && self.fallback.is_none() {
            self.enter_fallback(PlayerError::MediaLoad(
                "backend closed before becoming ready".to_string(),
            ))
            .await;
        } else {
            debug!("Backend event stream closed");
        }
    }

    async fn enter_fallback(&mut self, error: PlayerError) {
        if self.fallback.is_some() {
            return;
        }
        error!("Video {} unavailable: {}", self.video_id, error);

        self.ready_deadline = None;
        self.pending = None;
        self.settle = None;
        self.quiz.finish();
        self.playback.is_playing = false;
        self.source.teardown().await;
        self.source_closed = true;

        let message = error.fallback_message();
        self.fallback = Some(error);
        self.events
            .emit(
                EventType::SessionFallback,
                &self.video_id,
                EventPayload::Error { message },
            )
            .await;
        self.publish_view();
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Play { respond_to } => {
                let result = self.play().await;
                let _ = respond_to.send(result);
            }
            SessionCommand::Pause { respond_to } => {
                let result = self.pause().await;
                let _ = respond_to.send(result);
            }
            SessionCommand::TogglePlay { respond_to } => {
                let result = if self.playback.is_playing {
                    self.pause().await
                } else {
                    self.play().await
                };
                let _ = respond_to.send(result);
            }
            SessionCommand::Seek { target, respond_to } => {
                let result = self.seek(target).await;
                let _ = respond_to.send(result);
            }
            SessionCommand::SetVolume { volume, respond_to } => {
                let result = self.set_volume(volume).await;
                let _ = respond_to.send(result);
            }
            SessionCommand::ToggleMute { respond_to } => {
                let result = self.toggle_mute().await;
                let _ = respond_to.send(result);
            }
            SessionCommand::ToggleFullscreen { respond_to } => {
                let result = self.toggle_fullscreen();
                let _ = respond_to.send(result);
            }
            SessionCommand::SetPointerInside { inside } => {
                self.pointer_inside = inside;
                self.publish_view();
            }
            SessionCommand::SelectOption { option, respond_to } => {
                let result = self.select_option(&option).await;
                let _ = respond_to.send(result);
            }
            SessionCommand::SubmitAnswer { respond_to } => {
                let result = self.submit_answer().await;
                let _ = respond_to.send(result);
            }
            SessionCommand::MarkComplete { respond_to } => {
                let result = match self.guard_controls() {
                    Ok(()) => {
                        self.complete().await;
                        self.publish_view();
                        Ok(())
                    }
                    Err(e) => Err(e),
                };
                let _ = respond_to.send(result);
            }
            SessionCommand::GetView { respond_to } => {
                let _ = respond_to.send(self.view());
            }
            SessionCommand::Shutdown { respond_to } => {
                // handled by the event loop
                let _ = respond_to.send(());
            }
        }
    }

    async fn play(&mut self) -> Result<(), PlayerError> {
        self.guard_controls()?;
        trace!("Starting playback");
        self.source.play().await
    }

    async fn pause(&mut self) -> Result<(), PlayerError> {
        self.guard_controls()?;
        trace!("Pausing playback");
        self.source.pause().await
    }

    async fn seek(&mut self, requested: f64) -> Result<SeekDecision, PlayerError> {
        self.guard_controls()?;

        let decision =
            self.seek_policy
                .clamp(requested, self.seek_ceiling(), self.playback.duration);
        if decision.clamped {
            debug!(
                "Seek to {:.2}s clamped to {:.2}s",
                decision.requested, decision.target
            );
        }
        self.seek_to(decision.target).await?;

        if decision.clamped {
            self.events
                .emit(
                    EventType::SeekClamped,
                    &self.video_id,
                    EventPayload::Seek {
                        requested: decision.requested,
                        target: decision.target,
                    },
                )
                .await;
        }
        self.publish_view();
        Ok(decision)
    }

    /// Move the backend and ignore ticks from before the move.
    async fn seek_to(&mut self, target: f64) -> Result<(), PlayerError> {
        self.source.seek(target).await?;
        self.playback.current_time = target;
        let settle_window = Duration::from_secs_f64(self.config.playback.seek_settle_secs);
        self.settle = Some(SeekSettle {
            target,
            until: Instant::now() + settle_window,
        });
        Ok(())
    }

    async fn set_volume(&mut self, volume: f64) -> Result<(), PlayerError> {
        if let Some(error) = &self.fallback {
            return Err(error.clone());
        }
        let volume = volume.clamp(0.0, 1.0);
        self.playback.volume = volume;
        self.playback.is_muted = volume == 0.0;
        if self.ready {
            self.source.set_volume(volume).await?;
            self.source.set_muted(self.playback.is_muted).await?;
        }
        self.publish_view();
        Ok(())
    }

    async fn toggle_mute(&mut self) -> Result<bool, PlayerError> {
        if let Some(error) = &self.fallback {
            return Err(error.clone());
        }
        let muted = !self.playback.is_muted;
        if self.ready {
            self.source.set_muted(muted).await?;
        }
        self.playback.is_muted = muted;
        self.publish_view();
        Ok(muted)
    }

    fn toggle_fullscreen(&mut self) -> Result<bool, PlayerError> {
        self.guard_controls()?;
        let fullscreen = !self.playback.is_fullscreen;
        if fullscreen {
            self.fullscreen.enter()?;
        } else {
            self.fullscreen.exit()?;
        }
        self.playback.is_fullscreen = fullscreen;
        self.publish_view();
        Ok(fullscreen)
    }

    async fn select_option(&mut self, option: &OptionId) -> Result<Selection, PlayerError> {
        if let Some(error) = &self.fallback {
            return Err(error.clone());
        }
        let selection = self.quiz.select(option)?;
        match &selection {
            Selection::Submitted(option) => self.begin_submission(option.clone()).await,
            Selection::Selected => self.publish_view(),
        }
        Ok(selection)
    }

    async fn submit_answer(&mut self) -> Result<(), PlayerError> {
        if let Some(error) = &self.fallback {
            return Err(error.clone());
        }
        let option = self.quiz.submit()?;
        self.begin_submission(option).await;
        Ok(())
    }

    async fn begin_submission(&mut self, option: OptionId) {
        let Some(checkpoint) = self.quiz.checkpoint().cloned() else {
            return;
        };
        debug!("Submitting option {} for checkpoint {}", option, checkpoint.id);
        self.publish_view();

        match self.config.quiz.answer_validation {
            AnswerValidation::Client => {
                let verdict = Verdict::from_correct(checkpoint.is_correct(&option));
                self.apply_verdict(verdict).await;
            }
            AnswerValidation::Server => {
                let api = Arc::clone(&self.api);
                let verdict_tx = self.verdict_tx.clone();
                tokio::spawn(async move {
                    let result = api.submit_answer(&checkpoint.id, &option).await;
                    let _ = verdict_tx.send((checkpoint.id, result));
                });
            }
        }
    }

    async fn handle_verdict(&mut self, checkpoint_id: CheckpointId, result: Result<bool, ApiError>) {
        let awaiting = self.quiz.phase() == QuizPhase::Submitting
            && self.quiz.checkpoint().is_some_and(|c| c.id == checkpoint_id);
        if !awaiting {
            debug!("Discarding stale verdict for checkpoint {}", checkpoint_id);
            return;
        }

        match result {
            Ok(is_correct) => self.apply_verdict(Verdict::from_correct(is_correct)).await,
            Err(e) => {
                warn!("Answer submission for {} failed: {}", checkpoint_id, e);
                let note = PlayerError::Submission(e.to_string()).to_string();
                if let Err(e) = self.quiz.reopen(note.clone()) {
                    warn!("Could not reopen quiz: {}", e);
                }
                self.events
                    .emit(
                        EventType::SubmissionFailed,
                        &self.video_id,
                        EventPayload::Error { message: note },
                    )
                    .await;
                self.publish_view();
            }
        }
    }

    async fn apply_verdict(&mut self, verdict: Verdict) {
        if let Err(e) = self.quiz.resolve(verdict) {
            warn!("Could not resolve quiz: {}", e);
            return;
        }
        let Some(checkpoint) = self.quiz.checkpoint().cloned() else {
            return;
        };

        let delay = match verdict {
            Verdict::Correct => {
                self.scheduler.mark_answered(&checkpoint.id);
                self.config.quiz.correct_delay()
            }
            Verdict::Incorrect => self.config.quiz.incorrect_delay(),
        };
        info!("Checkpoint {} answered: {:?}", checkpoint.id, verdict);

        self.events
            .emit_quiz_resolved(&self.video_id, &checkpoint, verdict)
            .await;
        self.pending = Some(PendingResolution {
            deadline: Instant::now() + delay,
            checkpoint,
            verdict,
        });
        self.publish_view();
    }

    /// Leave the quiz and move playback to where the verdict sends it.
    async fn finish_resolution(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        self.quiz.finish();

        let target = match pending.verdict {
            Verdict::Correct => {
                let margin = self.config.playback.resume_margin_for(self.tick_mode);
                let target = pending.checkpoint.trigger_time + margin;
                if self.playback.duration > 0.0 {
                    target.min(self.playback.duration)
                } else {
                    target
                }
            }
            Verdict::Incorrect => self.scheduler.rewind_target(&pending.checkpoint.id),
        };
        debug!(
            "Resuming at {:.2}s after {:?} answer to {}",
            target, pending.verdict, pending.checkpoint.id
        );

        if let Err(e) = self.seek_to(target).await {
            warn!("Failed to seek after quiz: {}", e);
        }
        self.playback.is_playing = true;
        if let Err(e) = self.source.play().await {
            warn!("Failed to resume after quiz: {}", e);
        }

        self.events
            .emit_playback(
                EventType::PlaybackResumed,
                &self.video_id,
                target,
                self.playback.duration,
            )
            .await;
        self.publish_view();
    }

    async fn complete(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.seek_policy.unlock();
        self.reporter.mark_completed();
        self.events
            .emit(EventType::PlaybackCompleted, &self.video_id, EventPayload::None)
            .await;
    }
}

/// Cloneable handle for driving a running session
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::UnboundedSender<SessionCommand>,
    view: watch::Receiver<ShellView>,
    events: EventBus,
    shutdown: CancellationToken,
}

impl SessionHandle {
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, PlayerError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(command(respond_to))
            .map_err(|_| PlayerError::Disconnected)?;
        response.await.map_err(|_| PlayerError::Disconnected)
    }

    pub async fn play(&self) -> Result<(), PlayerError> {
        self.request(|respond_to| SessionCommand::Play { respond_to })
            .await?
    }

    pub async fn pause(&self) -> Result<(), PlayerError> {
        self.request(|respond_to| SessionCommand::Pause { respond_to })
            .await?
    }

    pub async fn toggle_play(&self) -> Result<(), PlayerError> {
        self.request(|respond_to| SessionCommand::TogglePlay { respond_to })
            .await?
    }

    pub async fn seek(&self, target: f64) -> Result<SeekDecision, PlayerError> {
        self.request(|respond_to| SessionCommand::Seek { target, respond_to })
            .await?
    }

    pub async fn set_volume(&self, volume: f64) -> Result<(), PlayerError> {
        self.request(|respond_to| SessionCommand::SetVolume { volume, respond_to })
            .await?
    }

    pub async fn toggle_mute(&self) -> Result<bool, PlayerError> {
        self.request(|respond_to| SessionCommand::ToggleMute { respond_to })
            .await?
    }

    pub async fn toggle_fullscreen(&self) -> Result<bool, PlayerError> {
        self.request(|respond_to| SessionCommand::ToggleFullscreen { respond_to })
            .await?
    }

    pub fn set_pointer_inside(&self, inside: bool) -> Result<(), PlayerError> {
        self.sender
            .send(SessionCommand::SetPointerInside { inside })
            .map_err(|_| PlayerError::Disconnected)
    }

    pub async fn select_option(&self, option: impl Into<OptionId>) -> Result<Selection, PlayerError> {
        let option = option.into();
        self.request(|respond_to| SessionCommand::SelectOption { option, respond_to })
            .await?
    }

    pub async fn submit_answer(&self) -> Result<(), PlayerError> {
        self.request(|respond_to| SessionCommand::SubmitAnswer { respond_to })
            .await?
    }

    pub async fn mark_complete(&self) -> Result<(), PlayerError> {
        self.request(|respond_to| SessionCommand::MarkComplete { respond_to })
            .await?
    }

    /// Current view, after every event already queued has been handled.
    pub async fn current_view(&self) -> Result<ShellView, PlayerError> {
        self.request(|respond_to| SessionCommand::GetView { respond_to })
            .await
    }

    /// Latest published view without a round trip.
    pub fn view(&self) -> ShellView {
        self.view.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<ShellView> {
        self.view.clone()
    }

    /// Wait until a published view satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&ShellView) -> bool,
    ) -> Result<ShellView, PlayerError> {
        let mut view = self.view.clone();
        let matched = view
            .wait_for(predicate)
            .await
            .map_err(|_| PlayerError::Disconnected)?;
        Ok(matched.clone())
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub async fn shutdown(&self) -> Result<(), PlayerError> {
        self.request(|respond_to| SessionCommand::Shutdown { respond_to })
            .await
    }

    /// Stop the session without waiting for it.
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }
}

/// Fetch everything a lesson needs and start its session on a new task.
pub async fn open(
    api: Arc<dyn LessonApi>,
    config: Config,
    video_id: &VideoId,
    factory: &dyn BackendFactory,
    fullscreen: Box<dyn FullscreenControl>,
) -> Result<(SessionHandle, JoinHandle<()>), SessionError> {
    let lesson = api.fetch_lesson(video_id).await?;
    let checkpoints = api.fetch_checkpoints(video_id).await?;
    let resume = match api.fetch_resume(video_id).await {
        Ok(resume) => resume,
        Err(e) => {
            warn!("Could not fetch resume point for {}: {}", video_id, e);
            ResumePoint::default()
        }
    };

    let base_url = url::Url::parse(&config.api.base_url).ok();
    let media = lesson.media_source(base_url.as_ref())?;
    let source = create_source(factory, &media, lesson.duration)?;

    info!(
        "Opening lesson '{}' ({} checkpoint(s), resume at {:.1}s)",
        lesson.title,
        checkpoints.len(),
        resume.current_time
    );

    let (handle, session) = LessonSession::new(SessionSetup {
        lesson,
        checkpoints,
        resume,
        source,
        api,
        config,
        fullscreen,
        events: EventBus::default(),
    });
    let task = tokio::spawn(session.run());
    Ok((handle, task))
}
