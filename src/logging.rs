//! Logging setup
//!
//! Everything goes to stderr through `tracing`. `RUST_LOG` overrides the
//! level chosen on the command line.

use tracing_subscriber::{fmt, EnvFilter};

/// Level used when `RUST_LOG` is unset
pub fn default_level(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "warn";
    }
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the subscriber for the operator CLI
///
/// Calling it twice is harmless; the second call is ignored.
pub fn init_logging(verbosity: u8, quiet: bool) {
    install(default_level(verbosity, quiet));
}

/// Install the subscriber for the remote agent
///
/// stdout carries protocol replies, so only warnings and errors are logged,
/// and those go to stderr.
pub fn init_agent_logging() {
    install("warn");
}

fn install(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(0, false), "info");
        assert_eq!(default_level(1, false), "debug");
        assert_eq!(default_level(5, false), "trace");
        assert_eq!(default_level(2, true), "warn");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging(0, true);
        init_agent_logging();
    }
}
