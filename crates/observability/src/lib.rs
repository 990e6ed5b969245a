//! Tracing and logging setup shared by messagely binaries.

pub mod tracing;

pub use tracing::{LogFormat, init_for_tests};

/// Initialize process-wide logging from the environment (`RUST_LOG`,
/// `LOG_FORMAT`). Safe to call more than once.
pub fn init() {
    tracing::init(LogFormat::from_env());
}
