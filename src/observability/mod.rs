//! Observability and logging.

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise the crate logs at
/// `debug` when `verbose` is requested and `info` otherwise. Safe to call
/// more than once; later calls are no-ops.
pub fn init(verbose: bool) {
    let default_directives = if verbose {
        "swapwatch=debug,info"
    } else {
        "swapwatch=info,warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init(false);
        init(true);
    }
}
