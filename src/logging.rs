//! Logging bootstrap for binaries and tests that embed the pipeline.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! a subscriber is installed, either here or by the host application.

use tracing_subscriber::EnvFilter;

/// Install a compact stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (e.g. `"villagemap=info"`)
/// is used. Returns `false` if a global subscriber was already installed.
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_noop() {
        let _ = init_logging("villagemap=debug");
        assert!(!init_logging("villagemap=debug"));
    }
}
