pub mod builders;
pub mod fake_deps;
pub mod fake_release;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::fmt;
use ytdlp_runner::logging::{filter_from_env, LOG_ENV_VAR};

static INIT: Once = Once::new();

/// Per-test upper bound; engine tests spawn real processes.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Initialise tracing for tests, with output captured per test.
///
/// The filter comes from `YTDLP_RUNNER_LOG` like the binary's, e.g.
/// `YTDLP_RUNNER_LOG=ytdlp_runner=trace cargo test -- --nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = filter_from_env(std::env::var(LOG_ENV_VAR).ok().as_deref());
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .unwrap_or_else(|_| panic!("test timed out after {TEST_TIMEOUT:?}"))
}
