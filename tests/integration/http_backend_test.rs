use crate::common::fixtures::Fixtures;
use crate::common::wait_for_view;
use mockito::{Matcher, Server};
use quizgate::api::LessonApiClient;
use quizgate::config::Config;
use quizgate::models::VideoId;
use quizgate::player::SimulatedBackendFactory;
use quizgate::session::{self, HeadlessFullscreen, Overlay};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_session_over_http_backend() {
    let mut server = Server::new_async().await;
    let lesson_mock = server
        .mock("GET", "/api/videos/http-lesson")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(Fixtures::lesson_json("http-lesson", 60.0).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/api/videos/http-lesson/quizzes")
        .with_status(200)
        .with_body(Fixtures::quizzes_json().to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/api/progress/http-lesson")
        .with_status(200)
        .with_body(json!({"currentTime": 14.6, "completed": false}).to_string())
        .create_async()
        .await;
    let report_mock = server
        .mock("POST", "/api/progress/update")
        .match_body(Matcher::PartialJson(json!({"videoId": "http-lesson"})))
        .with_status(200)
        .expect_at_least(1)
        .create_async()
        .await;

    let mut config = Config::default();
    config.api.base_url = server.url();
    let api = Arc::new(LessonApiClient::new(&config.api).unwrap());
    let factory = SimulatedBackendFactory::new(config.playback.poll_interval());

    let (handle, _task) = session::open(
        api,
        config,
        &VideoId::from("http-lesson"),
        &factory,
        Box::new(HeadlessFullscreen),
    )
    .await
    .unwrap();
    lesson_mock.assert_async().await;

    let view = wait_for_view(&handle, Duration::from_secs(5), |v| {
        v.overlay == Overlay::None
    })
    .await;
    // the one-option checkpoint is dropped
    assert_eq!(view.markers.len(), 1);
    assert_eq!(view.seek_ceiling, 30.0);
    assert!((view.playback.current_time - 14.6).abs() < 1e-9);

    handle.play().await.unwrap();
    wait_for_view(&handle, Duration::from_secs(5), |v| {
        v.playback.current_time >= 15.5
    })
    .await;

    for _ in 0..50 {
        if report_mock.matched_async().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    report_mock.assert_async().await;

    handle.shutdown().await.unwrap();
}
