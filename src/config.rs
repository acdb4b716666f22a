use std::sync::Once;

/// Default limit on nested script calls before a "stack overflow" runtime
/// error is raised.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;

static TRACING_INIT: Once = Once::new();

/// Runtime knobs for one interpreter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_call_depth: usize,
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            color: true,
        }
    }
}

impl Config {
    /// Reads `BROOK_MAX_CALL_DEPTH` and `NO_COLOR`. Unparsable values keep
    /// the default. Colour is also off when stderr is not a terminal.
    pub fn from_env() -> Self {
        let mut config = Self::from_vars(|key| std::env::var(key).ok());
        if !std::io::IsTerminal::is_terminal(&std::io::stderr()) {
            config.color = false;
        }
        config
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        if let Some(depth) = get("BROOK_MAX_CALL_DEPTH") {
            match depth.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_call_depth = depth,
                _ => tracing::warn!(%depth, "ignoring invalid BROOK_MAX_CALL_DEPTH"),
            }
        }
        if get("NO_COLOR").is_some_and(|value| !value.is_empty()) {
            config.color = false;
        }
        config
    }
}

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=brook=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_without_vars() {
        let config = Config::from_vars(|_| None);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_reads_depth_and_no_color() {
        let config = Config::from_vars(|key| match key {
            "BROOK_MAX_CALL_DEPTH" => Some("64".to_string()),
            "NO_COLOR" => Some("1".to_string()),
            _ => None,
        });
        assert_eq!(config.max_call_depth, 64);
        assert!(!config.color);
    }

    #[test]
    fn test_invalid_depth_keeps_default() {
        let config = Config::from_vars(|key| match key {
            "BROOK_MAX_CALL_DEPTH" => Some("lots".to_string()),
            _ => None,
        });
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
    }
}
