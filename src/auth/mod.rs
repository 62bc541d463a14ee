//! OAuth1 authentication against Hatena
//!
//! - `oauth1`: request signing
//! - `oauth_client`: the out-of-band three-legged handshake
//! - `credential_manager`: cached access token with expiry and transparent refresh

pub mod credential_manager;
pub mod oauth1;
pub mod oauth_client;

pub use credential_manager::{
    AccessTokenSource, AuthState, CredentialManager, Credentials, TokenPair,
};
pub use oauth1::OAuthSigner;
pub use oauth_client::{OAuthClient, OAuthEndpoints, VerifierPrompt};
