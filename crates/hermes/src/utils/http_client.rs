use std::{sync::OnceLock, time::Duration};

use reqwest::Client;
use tracing::debug;

/// Default request timeout for channels that do not set their own.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Build the client shared by all HTTP-based channels.
pub fn build_client() -> Client {
    install_rustls_provider();
    Client::builder()
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .user_agent(concat!("hermes/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}
