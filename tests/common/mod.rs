use std::sync::Once;

use coach_session::BoardEvent;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::EnvFilter;

/// Position after 1. e4 e5, white to move.
pub const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

static TRACING: Once = Once::new();

/// Install the log subscriber once per test binary. `RUST_LOG` controls
/// verbosity as usual.
pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .compact()
            .init();
    });
}

/// Let spawned board tasks reach their next await point.
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// Everything currently queued on an event stream.
pub fn drain(rx: &mut UnboundedReceiver<BoardEvent>) -> Vec<BoardEvent> {
    std::iter::from_fn(|| rx.try_recv().ok()).collect()
}
