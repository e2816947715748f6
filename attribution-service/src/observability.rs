use tracing_subscriber::{filter::Directive, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "attribution_service=info";

/// `RUST_LOG` directives plus the service default. An unparsable `RUST_LOG`
/// is ignored rather than silencing everything.
pub fn build_filter(rust_log: Option<&str>) -> EnvFilter {
    let base = rust_log
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_default();
    match DEFAULT_DIRECTIVE.parse::<Directive>() {
        Ok(directive) => base.add_directive(directive),
        Err(_) => base,
    }
}

/// Installs the fmt subscriber. A second call (tests, several bins sharing a
/// process) keeps the first subscriber.
pub fn init_tracing() {
    let rust_log = std::env::var("RUST_LOG").ok();
    let installed = tracing_subscriber::fmt()
        .with_env_filter(build_filter(rust_log.as_deref()))
        .with_target(false)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directive_is_always_present() {
        assert!(build_filter(None).to_string().to_lowercase().contains(DEFAULT_DIRECTIVE));

        let filter = build_filter(Some("grid_client=debug")).to_string().to_lowercase();
        assert!(filter.contains("grid_client=debug"));
        assert!(filter.contains(DEFAULT_DIRECTIVE));
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_tracing();
        init_tracing();
    }
}
