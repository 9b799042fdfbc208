//! Logging utilities

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
