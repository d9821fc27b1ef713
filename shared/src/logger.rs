//! Tracing setup shared by the gateway binary and integration tests.

/// Initializes the global tracing subscriber from `RUST_LOG`
/// (default `info`), JSON-formatted outside debug builds.
pub fn init_logger() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if cfg!(debug_assertions) {
        builder.init();
    } else {
        builder.json().init();
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn default_filter_parses() {
        assert!(tracing_subscriber::EnvFilter::try_new("info").is_ok());
    }
}
