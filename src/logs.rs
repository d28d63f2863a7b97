use {
    super::*, tracing_appender::non_blocking::WorkerGuard,
    tracing_subscriber::filter::LevelFilter,
};

fn filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives.unwrap_or_default())
}

/// Installs the global subscriber: `RUST_LOG` filtered, written to stderr off
/// the hashing threads. Logs are flushed when the guard is dropped.
pub(crate) fn init() -> WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    let directives = env::var("RUST_LOG").ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(writer)
                .with_filter(filter(directives.as_deref())),
        )
        .init();

    guard
}
