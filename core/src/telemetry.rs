//! Log subscriber setup.
//!
//! The level follows the configuration flags unless `RUST_LOG` is set:
//! `debug` when debugging is enabled, `info` when logging is enabled,
//! `warn` otherwise.

use tracing_subscriber::EnvFilter;

use crate::config::Config;

pub fn default_directive(config: &Config) -> &'static str {
    if config.debug_enabled {
        "debug"
    } else if config.logging_enabled {
        "info"
    } else {
        "warn"
    }
}

/// Install a global fmt subscriber. Returns `false` if one was already set.
pub fn init(config: &Config) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_follows_flags() {
        let mut config = Config::default();
        assert_eq!(default_directive(&config), "warn");
        config.logging_enabled = true;
        assert_eq!(default_directive(&config), "info");
        config.debug_enabled = true;
        assert_eq!(default_directive(&config), "debug");
    }
}
