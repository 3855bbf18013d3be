#![allow(dead_code)]
//! Shared integration test utilities.

use std::{rc::Rc, sync::Once};

use proptest::prelude::ProptestConfig;
use settle::{EventLoop, task::EnterGuard};
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

const DEFAULT_FILTER: &str =
    "settle=trace,settle_core=trace,settle_util=trace,settle_combinators=trace";

/// Initialize test logging once per process. `RUST_LOG` overrides the
/// default filter.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_ansi(false)
            .try_init();
    });
}

/// A manual-clock loop entered as the current scheduler.
pub fn manual_loop() -> (Rc<EventLoop>, EnterGuard) {
    init_test_logging();
    let event_loop = Rc::new(EventLoop::builder().manual_clock().build());
    let guard = event_loop.enter();
    (event_loop, guard)
}

pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    ProptestConfig::with_cases(cases)
}
