//! Shared application state for the triage server.

use std::sync::Arc;
use std::time::Duration;

use triage::io::config::TriageConfig;
use triage::ward::Ward;

use crate::feed::LiveFeed;

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub ward: Arc<Ward>,
    pub config: Arc<TriageConfig>,
    /// Registration handle for the live display sweep.
    pub feed: LiveFeed,
}

impl AppState {
    /// Wrap `ward` and start the live feed sweep. Must run inside a Tokio runtime.
    pub fn new(ward: Ward, config: TriageConfig) -> Self {
        let ward = Arc::new(ward);
        let feed = LiveFeed::spawn(
            Arc::clone(&ward),
            Duration::from_millis(config.live_tick_ms),
            config.subscriber_buffer,
        );
        Self {
            ward,
            config: Arc::new(config),
            feed,
        }
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.config.keep_alive_secs)
    }

    pub fn live_tick(&self) -> Duration {
        Duration::from_millis(self.config.live_tick_ms)
    }
}

#[cfg(test)]
pub(crate) const TEST_BUFFER: usize = 2;

/// Fresh ward in a temp dir on a manual clock, with a fast live tick.
#[cfg(test)]
pub(crate) fn test_state() -> (
    tempfile::TempDir,
    triage::test_support::ManualClock,
    AppState,
) {
    use triage::io::init::{InitOptions, init_triage};
    use triage::test_support::{ManualClock, t0};

    let temp = tempfile::tempdir().expect("tempdir");
    let paths = init_triage(temp.path(), &InitOptions { force: false }).expect("init");
    let clock = ManualClock::new(t0());
    let ward = Ward::open(&paths, Box::new(clock.clone())).expect("open ward");
    let config = TriageConfig {
        live_tick_ms: 5,
        subscriber_buffer: TEST_BUFFER,
        ..TriageConfig::default()
    };
    (temp, clock, AppState::new(ward, config))
}
