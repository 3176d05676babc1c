use std::io;
use tracing_subscriber::fmt::{self, format};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type StderrLayer<S> = fmt::Layer<S, format::DefaultFields, format::Format, fn() -> io::Stderr>;

/// Filter used when `RUST_LOG` is not set.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "horizon_scan=debug,info"
    } else {
        "horizon_scan=info"
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

// stdout carries the `list` report, so logs go to stderr.
fn stderr_layer<S>() -> StderrLayer<S> {
    fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(io::stderr as fn() -> io::Stderr)
}

pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(stderr_layer().compact())
        .init();
}

/// JSON lines on stderr, for batch jobs whose logs are collected by a scheduler.
pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(env_filter(false))
        .with(stderr_layer().json())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(false), "horizon_scan=info");
        assert!(default_directives(true).starts_with("horizon_scan=debug"));
        assert!(default_directives(true).parse::<EnvFilter>().is_ok());
    }
}
