//! Logging setup for liferpgctl
//!
//! Diagnostics go to stderr so they never mix with menu or JSON output.
//! `RUST_LOG` wins, then `--verbose`, then `[logging] level` from the config.

use tracing_subscriber::EnvFilter;

/// Filter directive used when RUST_LOG is not set
pub fn default_directive(verbose: bool, config_level: &str) -> String {
    if verbose {
        "debug".to_string()
    } else {
        config_level.to_string()
    }
}

pub fn init(verbose: bool, config_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, config_level)));

    // A subscriber may already be installed (tests); keep the first one
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_overrides_config() {
        assert_eq!(default_directive(true, "warn"), "debug");
        assert_eq!(default_directive(false, "info"), "info");
    }
}
