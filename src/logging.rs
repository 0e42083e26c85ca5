//! Logger bootstrap for binaries.
//!
//! The library only talks to the `log` facade. Binaries call [`init`] once
//! at startup; `RUST_LOG` overrides the default `info` filter.

/// Install `env_logger` as the global logger. Safe to call more than once.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

/// Logger for unit tests: captured by the test harness, debug level.
#[cfg(test)]
pub(crate) fn init_for_tests() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}
