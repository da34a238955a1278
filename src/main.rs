//! crossrun CLI entry point

fn main() {
    // Structured logging to stderr with env-based filter, defaulting to info; stdout carries the report
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    crossrun::cli::run();
}
