pub mod fixtures;
pub mod mocks;

use quizgate::session::ShellView;
use quizgate::SessionHandle;
use std::time::Duration;

/// Wait for a published view matching `predicate`, failing the test after
/// `limit` of (virtual) time.
pub async fn wait_for_view(
    handle: &SessionHandle,
    limit: Duration,
    predicate: impl FnMut(&ShellView) -> bool,
) -> ShellView {
    tokio::time::timeout(limit, handle.wait_for(predicate))
        .await
        .expect("timed out waiting for view")
        .expect("session stopped")
}
