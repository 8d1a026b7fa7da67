use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install the global subscriber once. `RUST_LOG` wins unless `verbose`
/// asks for debug output. Logs go to stderr so reports on stdout stay clean.
pub fn init_logging(verbose: bool) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    INIT.call_once(|| {
        let filter = if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging(false);
        init_logging(true);
        assert!(tracing::dispatcher::has_been_set());
    }
}
