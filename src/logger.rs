use env_logger::{Builder, Env};
use log::LevelFilter;

/// Environment variable holding the log filter, `RUST_LOG` syntax.
pub const LOG_ENV: &str = "RUST_LOG";

/// Initialize `env_logger`.
///
/// `RUST_LOG` controls the filter unless `verbose` is set, in which case
/// everything from this crate at `debug` and above is shown. Calling this
/// more than once is harmless.
pub fn init(verbose: bool) {
    let mut builder = Builder::from_env(Env::default().filter_or(LOG_ENV, "warn"));
    if verbose {
        builder.filter_module("starter_config", LevelFilter::Debug);
    }
    builder.format_timestamp(None).try_init().ok();
}
