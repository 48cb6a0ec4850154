use crate::common::fixtures::Fixtures;
use crate::common::mocks::MockLessonApi;
use crate::common::wait_for_view;
use quizgate::api::{DEMO_EMBEDDED_VIDEO_ID, DemoLessonApi};
use quizgate::config::Config;
use quizgate::gate::{QuizPhase, Verdict};
use quizgate::models::{ResumePoint, VideoId};
use quizgate::player::SimulatedBackendFactory;
use quizgate::session::{self, HeadlessFullscreen, Overlay};
use quizgate::utils::PlayerError;
use std::sync::Arc;
use std::time::Duration;

const LONG: Duration = Duration::from_secs(900);

fn factory() -> SimulatedBackendFactory {
    SimulatedBackendFactory::new(Duration::from_millis(500))
}

fn quiz_open(id: &'static str) -> impl FnMut(&quizgate::ShellView) -> bool {
    move |view| {
        view.quiz()
            .is_some_and(|q| q.checkpoint_id.as_str() == id && q.phase == QuizPhase::Presenting)
    }
}

fn resumed(view: &quizgate::ShellView) -> bool {
    view.overlay == Overlay::None && view.playback.is_playing
}

#[tokio::test(start_paused = true)]
async fn test_full_lecture_scenario() {
    let api = Arc::new(MockLessonApi::new(
        Fixtures::lecture(),
        Fixtures::lecture_checkpoints(),
    ));
    let (handle, task) = session::open(
        api.clone(),
        Config::default(),
        &VideoId::from("lecture-1"),
        &factory(),
        Box::new(HeadlessFullscreen),
    )
    .await
    .unwrap();

    let view = wait_for_view(&handle, LONG, |v| v.overlay == Overlay::None).await;
    assert_eq!(view.playback.duration, 600.0);
    assert_eq!(view.seek_ceiling, 120.0);
    assert_eq!(view.markers.len(), 2);

    handle.play().await.unwrap();

    // first checkpoint interrupts playback
    let view = wait_for_view(&handle, LONG, quiz_open("q-120")).await;
    assert!(!view.playback.is_playing);
    assert!((119.5..120.5).contains(&view.playback.current_time));
    assert!(view.max_watched < 120.5);
    assert_eq!(handle.seek(500.0).await, Err(PlayerError::QuizActive));

    handle.select_option("opt-a").await.unwrap();
    handle.submit_answer().await.unwrap();
    let view = handle.current_view().await.unwrap();
    assert_eq!(
        view.quiz().map(|q| q.phase),
        Some(QuizPhase::Resolved(Verdict::Correct))
    );

    let view = wait_for_view(&handle, LONG, resumed).await;
    assert!((121.0..=123.0).contains(&view.playback.current_time));
    assert_eq!(view.seek_ceiling, 300.0);
    assert!(view.markers[0].answered);

    // forward seeks stop at what has been watched
    let decision = handle.seek(500.0).await.unwrap();
    assert!(decision.clamped);
    assert!(decision.target <= 124.0);

    // wrong answer at the second checkpoint rewinds to the first
    wait_for_view(&handle, LONG, quiz_open("q-300")).await;
    handle.select_option("opt-b").await.unwrap();
    handle.submit_answer().await.unwrap();
    let view = wait_for_view(&handle, LONG, resumed).await;
    assert!((120.0..121.0).contains(&view.playback.current_time));

    // the answered checkpoint stays quiet, the second one returns
    let view = wait_for_view(&handle, LONG, |v| {
        v.quiz().is_some() || v.playback.current_time > 200.0
    })
    .await;
    assert!(view.quiz().is_none());

    wait_for_view(&handle, LONG, quiz_open("q-300")).await;
    handle.select_option("opt-c").await.unwrap();
    handle.submit_answer().await.unwrap();
    wait_for_view(&handle, LONG, resumed).await;

    let view = wait_for_view(&handle, LONG, |v| v.completed).await;
    assert!(view.markers.iter().all(|m| m.answered));

    // completion lifts the gate entirely
    let decision = handle.seek(600.0).await.unwrap();
    assert_eq!(decision.target, 600.0);
    assert!(!decision.clamped);
    handle.mark_complete().await.unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(api.completion_reports(), 1);
    assert!(api.reports().iter().any(|r| r.current_time.is_some()));

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_resume_point_is_applied() {
    let api = Arc::new(
        MockLessonApi::new(Fixtures::lecture(), Fixtures::lecture_checkpoints()).with_resume(
            ResumePoint {
                current_time: 95.0,
                completed: false,
            },
        ),
    );
    let (handle, _task) = session::open(
        api,
        Config::default(),
        &VideoId::from("lecture-1"),
        &factory(),
        Box::new(HeadlessFullscreen),
    )
    .await
    .unwrap();

    let view = wait_for_view(&handle, LONG, |v| v.overlay == Overlay::None).await;
    assert_eq!(view.playback.current_time, 95.0);
    assert_eq!(view.max_watched, 95.0);

    // territory up to the resume point is free to scrub
    let decision = handle.seek(50.0).await.unwrap();
    assert_eq!(decision.target, 50.0);
    assert!(!decision.clamped);
    let decision = handle.seek(110.0).await.unwrap();
    assert_eq!(decision.target, 95.0);
    assert!(decision.clamped);

    handle.play().await.unwrap();
    let view = wait_for_view(&handle, LONG, quiz_open("q-120")).await;
    assert!(view.playback.current_time > 119.0);
}

#[tokio::test(start_paused = true)]
async fn test_embedded_lesson_polls_and_gates() {
    let (handle, _task) = session::open(
        Arc::new(DemoLessonApi::new()),
        Config::default(),
        &VideoId::from(DEMO_EMBEDDED_VIDEO_ID),
        &factory(),
        Box::new(HeadlessFullscreen),
    )
    .await
    .unwrap();

    wait_for_view(&handle, LONG, |v| v.overlay == Overlay::None).await;
    handle.play().await.unwrap();

    let view = wait_for_view(&handle, LONG, quiz_open("demo-q1")).await;
    assert!((4.0..6.0).contains(&view.playback.current_time));

    handle.select_option("demo-q1-a").await.unwrap();
    handle.submit_answer().await.unwrap();
    let view = wait_for_view(&handle, LONG, resumed).await;
    assert!(view.playback.current_time >= 7.0);
}

#[tokio::test(start_paused = true)]
async fn test_load_failure_shows_fallback() {
    let api = Arc::new(MockLessonApi::new(
        Fixtures::lecture(),
        Fixtures::lecture_checkpoints(),
    ));
    let (handle, _task) = session::open(
        api,
        Config::default(),
        &VideoId::from("lecture-1"),
        &factory().failing("404 Not Found"),
        Box::new(HeadlessFullscreen),
    )
    .await
    .unwrap();

    let view = wait_for_view(&handle, LONG, |v| v.is_fallback()).await;
    assert!(!view.controls_visible);
    assert!(matches!(handle.play().await, Err(PlayerError::MediaLoad(_))));
}

#[tokio::test]
async fn test_unknown_lesson_fails_to_open() {
    let api = Arc::new(MockLessonApi::new(
        Fixtures::lecture(),
        Fixtures::lecture_checkpoints(),
    ));
    let result = session::open(
        api,
        Config::default(),
        &VideoId::from("missing"),
        &factory(),
        Box::new(HeadlessFullscreen),
    )
    .await;
    assert!(matches!(
        result,
        Err(session::SessionError::Api(quizgate::api::ApiError::NotFound(_)))
    ));
}
