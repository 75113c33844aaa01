//! Provider callback processing
//!
//! Runs on every page load, because the page load after the provider
//! redirect is the only way back into the flow:
//!
//! ```text
//! AwaitingRedirect ──id_token──▶ TokenExtracted ──claims ok──▶ TokenValidated
//!        ▲                              │
//!        └── no id_token (no-op)        └──missing claims──▶ Aborted
//! ```

use url::Url;

use crate::token::{IdentityToken, TokenError, ValidatedClaims};

/// Fragment parameter carrying the identity token
pub const ID_TOKEN_PARAM: &str = "id_token";

/// Callback processing states
#[derive(Debug)]
pub enum CallbackState {
    /// No token on this page load; the normal case
    AwaitingRedirect,

    /// Token found and scrubbed from the location
    TokenExtracted(IdentityToken),

    /// Token carries the claims address derivation needs
    TokenValidated {
        token: IdentityToken,
        claims: ValidatedClaims,
    },

    /// The flow ends here
    Aborted(TokenError),
}

impl CallbackState {
    /// Whether no further callback step applies
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CallbackState::TokenExtracted(_))
    }
}

/// Turns the redirect location into validated claims
pub struct CallbackProcessor;

impl CallbackProcessor {
    /// Look for an identity token in the fragment.
    ///
    /// When one is found the fragment and query are removed from `location`
    /// before anything else happens, so the token does not linger in
    /// history or leak through a referrer. Without a token `location` is
    /// left untouched.
    pub fn extract(location: &mut Url) -> CallbackState {
        let token = location.fragment().and_then(|fragment| {
            url::form_urlencoded::parse(fragment.as_bytes())
                .find(|(key, value)| key == ID_TOKEN_PARAM && !value.is_empty())
                .map(|(_, value)| IdentityToken::new(value.into_owned()))
        });

        match token {
            Some(token) => {
                location.set_fragment(None);
                location.set_query(None);
                tracing::debug!("Identity token extracted from callback");
                CallbackState::TokenExtracted(token)
            }
            None => CallbackState::AwaitingRedirect,
        }
    }

    /// Advance `TokenExtracted` by decoding and checking claims; other
    /// states are returned unchanged
    pub fn validate(state: CallbackState) -> CallbackState {
        let token = match state {
            CallbackState::TokenExtracted(token) => token,
            other => return other,
        };

        match token.decode_claims().and_then(|claims| claims.validate()) {
            Ok(claims) => CallbackState::TokenValidated { token, claims },
            Err(err) => {
                tracing::warn!("Callback aborted: {}", err);
                CallbackState::Aborted(err)
            }
        }
    }

    /// Extract and validate in one go
    pub fn process(location: &mut Url) -> CallbackState {
        Self::validate(Self::extract(location))
    }
}
