//! Log subscriber setup.
//!
//! `RUST_LOG` decides what is logged unless `-v` is given, in which case
//! the verbosity count wins.

use tracing_subscriber::EnvFilter;

use crate::error::{CliError, Result};

/// Level directive for a `-v` count.
#[must_use]
pub const fn level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Filter for a `-v` count, falling back to `RUST_LOG` and then `info`.
#[must_use]
pub fn filter(verbose: u8) -> EnvFilter {
    if verbose > 0 {
        return EnvFilter::new(level(verbose));
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level(0)))
}

/// Install the global subscriber, writing to stderr.
///
/// # Errors
///
/// Returns [`CliError::Logging`] when a subscriber is already installed.
pub fn init(verbose: u8) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| CliError::Logging(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "info")]
    #[case(1, "debug")]
    #[case(2, "trace")]
    #[case(7, "trace")]
    fn verbosity_maps_to_levels(#[case] verbose: u8, #[case] expected: &str) {
        assert_eq!(level(verbose), expected);
    }
}
