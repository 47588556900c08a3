//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with an explicit filter such as `"info"`
/// or `"exhibit_engine::scene=debug"`.
///
/// `RUST_LOG`, when set, takes precedence. Calling this twice is harmless;
/// the second call leaves the first logger in place.
pub fn init_with_filter(filter: &str) {
    let env = env_logger::Env::default().default_filter_or(filter);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized; keeping existing configuration");
    }
}
