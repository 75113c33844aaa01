//! Authorization redirect

use url::Url;

use crate::config::ProviderConfig;
use crate::token::TokenError;

/// Helper to build implicit-flow authorization URLs
pub struct AuthorizationUrlBuilder {
    endpoint: String,
    client_id: String,
    redirect_uri: String,
    scopes: Vec<String>,
    nonce: Option<String>,
    extra_params: Vec<(String, String)>,
}

impl AuthorizationUrlBuilder {
    pub fn new(
        authorization_endpoint: impl Into<String>,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: authorization_endpoint.into(),
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scopes: vec!["openid".to_string()],
            nonce: None,
            extra_params: Vec::new(),
        }
    }

    /// Add a scope
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    /// Set nonce parameter
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Append a provider-specific parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_params.push((key.into(), value.into()));
        self
    }

    /// Build the authorization URL
    pub fn build(self) -> Result<Url, TokenError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| TokenError::InvalidEndpoint(format!("{}: {}", self.endpoint, e)))?;

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.client_id)
                .append_pair("redirect_uri", &self.redirect_uri)
                .append_pair("response_type", "id_token")
                .append_pair("scope", &self.scopes.join(" "));

            if let Some(nonce) = &self.nonce {
                query.append_pair("nonce", nonce);
            }

            for (key, value) in &self.extra_params {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

/// Build the redirect URL for a provider with the session's bound nonce
pub fn build_auth_url(
    provider: &ProviderConfig,
    redirect_uri: &str,
    nonce: &str,
) -> Result<Url, TokenError> {
    provider
        .extra_params
        .iter()
        .fold(
            AuthorizationUrlBuilder::new(
                &provider.authorization_endpoint,
                &provider.client_id,
                redirect_uri,
            )
            .nonce(nonce),
            |builder, (key, value)| builder.param(key, value),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use zklogin_core::OpenIdProvider;

    fn query_map(url: &Url) -> HashMap<String, String> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_google_auth_url() {
        let provider = ProviderConfig::for_provider(OpenIdProvider::Google, "client-123");
        let url = build_auth_url(&provider, "http://localhost:3000", "abc_nonce").unwrap();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        let query = query_map(&url);
        assert_eq!(query["client_id"], "client-123");
        assert_eq!(query["redirect_uri"], "http://localhost:3000");
        assert_eq!(query["response_type"], "id_token");
        assert_eq!(query["scope"], "openid");
        assert_eq!(query["nonce"], "abc_nonce");
    }

    #[test]
    fn test_twitch_auth_url_has_extras() {
        let provider = ProviderConfig::for_provider(OpenIdProvider::Twitch, "tw");
        let url = build_auth_url(&provider, "http://localhost:3000", "n").unwrap();
        let query = query_map(&url);
        assert_eq!(query["login_type"], "login");
        assert_eq!(query["lang"], "en");
    }

    #[test]
    fn test_invalid_endpoint() {
        let provider =
            ProviderConfig::for_provider(OpenIdProvider::Google, "c").with_endpoint("not a url");
        assert!(matches!(
            build_auth_url(&provider, "http://localhost", "n"),
            Err(TokenError::InvalidEndpoint(_))
        ));
    }
}
