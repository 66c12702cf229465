//! Tracing subscriber setup for the command line.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//! `HEICWALL_LOG` takes precedence over `RUST_LOG`; without either, only
//! warnings are shown unless `--verbose` is passed.

use tracing_subscriber::EnvFilter;

use crate::constants::LOG_ENV_VAR;

/// Default filter when no environment variable is set.
const DEFAULT_DIRECTIVE: &str = "warn";

/// Default filter with `--verbose`.
const VERBOSE_DIRECTIVE: &str = "heicwall_lib=debug,heicwall=debug,info";

/// Picks the filter directives from the environment or the verbosity flag.
///
/// Empty environment values are ignored.
#[must_use]
pub fn filter_directives(heicwall_log: Option<&str>, rust_log: Option<&str>, verbose: bool) -> String {
    [heicwall_log, rust_log]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map_or_else(
            || if verbose { VERBOSE_DIRECTIVE } else { DEFAULT_DIRECTIVE }.to_string(),
            str::to_string,
        )
}

/// Installs the global fmt subscriber.
///
/// Invalid directives fall back to the default filter. Calling this twice is
/// harmless; the second subscriber is ignored.
pub fn init(verbose: bool) {
    let heicwall_log = std::env::var(LOG_ENV_VAR).ok();
    let rust_log = std::env::var("RUST_LOG").ok();
    let directives = filter_directives(heicwall_log.as_deref(), rust_log.as_deref(), verbose);

    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|err| {
        eprintln!("heicwall: invalid log filter '{directives}': {err}");
        EnvFilter::new(DEFAULT_DIRECTIVE)
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
