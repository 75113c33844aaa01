//! zkLogin OIDC
//!
//! The identity-provider side of the flow: building the authorization
//! redirect and turning the provider's callback into validated claims.

pub mod authorize;
pub mod callback;
pub mod config;
pub mod token;

pub use authorize::{build_auth_url, AuthorizationUrlBuilder};
pub use callback::{CallbackProcessor, CallbackState};
pub use config::ProviderConfig;
pub use token::{IdTokenClaims, IdentityToken, TokenError, ValidatedClaims};
