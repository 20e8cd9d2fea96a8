use env_logger::Builder;
use log::LevelFilter;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize test logging with appropriate log level
///
/// Logs default to Error level to keep test output quiet; set LOG_LEVEL to
/// see more. Call at the beginning of each test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let level_filter = match std::env::var("LOG_LEVEL").as_deref() {
            Ok("warn") => LevelFilter::Warn,
            Ok("info") => LevelFilter::Info,
            Ok("debug") => LevelFilter::Debug,
            Ok("trace") => LevelFilter::Trace,
            _ => LevelFilter::Error,
        };

        Builder::from_default_env()
            .filter_level(level_filter)
            .is_test(true)
            .init();
    });
}
