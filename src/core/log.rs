use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// The watcher reports only through logs, so `info` is on unless `RUST_LOG` says otherwise.
pub fn init_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (app_filter, env_filter) = filters(verbose, rust_log.as_deref());

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(app_filter)
        .with(env_filter)
        .init();
}

/// `RUST_LOG` replaces the built-in levels entirely; without it the crate logs at
/// `info` (`debug` when verbose) and everything else at `warn`.
fn filters(verbose: bool, rust_log: Option<&str>) -> (Option<Targets>, EnvFilter) {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return (None, EnvFilter::new(directives));
    }

    let (level_filter, level) = if verbose {
        (LevelFilter::DEBUG, "debug")
    } else {
        (LevelFilter::INFO, "info")
    };
    let app_filter = Targets::new()
        .with_target("ratewatch", level_filter)
        .with_default(LevelFilter::WARN);
    (Some(app_filter), EnvFilter::new(level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_default_levels() {
        let (targets, _) = filters(false, None);
        let targets = targets.unwrap();
        assert!(targets.would_enable("ratewatch", &Level::INFO));
        assert!(!targets.would_enable("ratewatch", &Level::DEBUG));
        assert!(!targets.would_enable("hyper", &Level::INFO));

        let (targets, _) = filters(true, None);
        assert!(targets.unwrap().would_enable("ratewatch", &Level::DEBUG));
    }

    #[test]
    fn test_rust_log_overrides_builtin_levels() {
        let (targets, env_filter) = filters(false, Some("ratewatch=debug"));
        assert!(targets.is_none());
        assert!(env_filter.to_string().contains("ratewatch=debug"));
    }

    #[test]
    fn test_blank_rust_log_is_ignored() {
        let (targets, _) = filters(false, Some("  "));
        assert!(targets.is_some());
    }
}
