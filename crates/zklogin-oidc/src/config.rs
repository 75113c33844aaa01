//! OpenID provider configuration

use serde::{Deserialize, Serialize};
use zklogin_core::OpenIdProvider;

/// Authorization settings for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which provider this is
    pub provider: OpenIdProvider,

    /// OAuth client ID registered with the provider
    pub client_id: String,

    /// Authorization endpoint URL
    pub authorization_endpoint: String,

    /// Provider-specific query parameters appended to the redirect
    pub extra_params: Vec<(String, String)>,
}

impl ProviderConfig {
    /// Default endpoint and parameters for a provider
    pub fn for_provider(provider: OpenIdProvider, client_id: impl Into<String>) -> Self {
        let (endpoint, extra): (&str, &[(&str, &str)]) = match provider {
            OpenIdProvider::Google => ("https://accounts.google.com/o/oauth2/v2/auth", &[]),
            OpenIdProvider::Twitch => (
                "https://id.twitch.tv/oauth2/authorize",
                &[("force_verify", "true"), ("lang", "en"), ("login_type", "login")],
            ),
            OpenIdProvider::Facebook => ("https://www.facebook.com/v19.0/dialog/oauth", &[]),
        };

        Self {
            provider,
            client_id: client_id.into(),
            authorization_endpoint: endpoint.to_string(),
            extra_params: extra
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Override the authorization endpoint (test providers, proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.authorization_endpoint = endpoint.into();
        self
    }
}
