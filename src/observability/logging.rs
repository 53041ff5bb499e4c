use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

const DEFAULT_DIRECTIVES: &str = "ollama_client=info";

/// Installs a stderr `fmt` subscriber for the crate's spans and events.
///
/// `RUST_LOG` overrides the default `ollama_client=info`. Request and
/// response bodies are only logged at `debug`. Does nothing if a global
/// subscriber is already set.
pub fn init_default_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::builder().parse_lossy(DEFAULT_DIRECTIVES));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE);

    let _ = Registry::default().with(filter).with(fmt_layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        init_default_tracing();
        init_default_tracing();
    }
}
