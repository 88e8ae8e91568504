use crate::config::Config;
use isahc::config::RedirectPolicy;
use isahc::prelude::*;
use isahc::HttpClient;
use std::sync::OnceLock;
use std::time::Duration;

static CLIENT: OnceLock<HttpClient> = OnceLock::new();

/// Shared isahc client for the Telegram gateways and the translation service.
pub fn client() -> &'static HttpClient {
    CLIENT.get_or_init(|| {
        HttpClient::builder()
            .redirect_policy(RedirectPolicy::Limit(5))
            .timeout(Duration::from_secs(Config::request_timeout_in_seconds()))
            .build()
            .unwrap()
    })
}
