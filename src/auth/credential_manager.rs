use super::oauth1::OAuthSigner;
use crate::config::ACCESS_TOKEN_LIFETIME_DAYS;
use crate::config_store::{to_toml_datetime, ConfigStore};
use crate::error::{errors, HatenaResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

pub const KEY_API_KEY: &str = "auth:api_key";
pub const KEY_API_SECRET: &str = "auth:api_secret";
pub const KEY_ACCESS_TOKEN: &str = "auth:access_token";
pub const KEY_ACCESS_SECRET: &str = "auth:access_secret";
pub const KEY_EXPIRES: &str = "auth:expires";

/// A token and its secret, as returned by either handshake step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub token: String,
    pub secret: String,
}

/// OAuth1 credentials used to sign every API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
    pub expires: DateTime<Utc>,
}

impl Credentials {
    pub fn from_config(store: &ConfigStore) -> HatenaResult<Self> {
        Ok(Self {
            consumer_key: store.get_str(KEY_API_KEY)?,
            consumer_secret: store.get_str(KEY_API_SECRET)?,
            access_token: store.get_str(KEY_ACCESS_TOKEN)?,
            access_secret: store.get_str(KEY_ACCESS_SECRET)?,
            expires: store.get_datetime(KEY_EXPIRES)?,
        })
    }

    /// Empty token/secret or a passed expiry make the credentials unusable.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && !self.access_secret.is_empty() && now < self.expires
    }

    pub fn signer(&self) -> OAuthSigner {
        OAuthSigner::new(&self.consumer_key, &self.consumer_secret)
            .with_token(&self.access_token, &self.access_secret)
    }
}

/// Whether the cached access token can be used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated { expires_at: DateTime<Utc> },
}

/// Runs the three-legged handshake and returns a long-lived access token.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn obtain_access_token(
        &self,
        consumer_key: &str,
        consumer_secret: &str,
    ) -> HatenaResult<TokenPair>;
}

/// Hands out valid credentials, re-running the handshake when the cached
/// token is missing or expired.
pub struct CredentialManager<S> {
    source: S,
}

impl<S: AccessTokenSource> CredentialManager<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn state(&self, store: &ConfigStore, now: DateTime<Utc>) -> HatenaResult<AuthState> {
        let credentials = Credentials::from_config(store)?;
        if credentials.is_valid_at(now) {
            Ok(AuthState::Authenticated {
                expires_at: credentials.expires,
            })
        } else {
            Ok(AuthState::Unauthenticated)
        }
    }

    /// The only place access tokens are read for use.
    pub async fn ensure_valid(&self, store: &mut ConfigStore) -> HatenaResult<Credentials> {
        self.ensure_valid_at(store, Utc::now()).await
    }

    pub async fn ensure_valid_at(
        &self,
        store: &mut ConfigStore,
        now: DateTime<Utc>,
    ) -> HatenaResult<Credentials> {
        let mut credentials = Credentials::from_config(store)?;
        if credentials.is_valid_at(now) {
            debug!("Cached access token valid until {}", credentials.expires);
            return Ok(credentials);
        }

        if credentials.consumer_key.is_empty() || credentials.consumer_secret.is_empty() {
            return Err(errors::config_error(
                "auth:api_key and auth:api_secret are required. Run `hatena config init` first.",
            ));
        }

        info!("Access token missing or expired, starting OAuth handshake");
        let pair = self
            .source
            .obtain_access_token(&credentials.consumer_key, &credentials.consumer_secret)
            .await?;

        credentials.access_token = pair.token;
        credentials.access_secret = pair.secret;
        credentials.expires = now + Duration::days(ACCESS_TOKEN_LIFETIME_DAYS);

        store.set(KEY_ACCESS_TOKEN, credentials.access_token.as_str())?;
        store.set(KEY_ACCESS_SECRET, credentials.access_secret.as_str())?;
        store.set(KEY_EXPIRES, to_toml_datetime(credentials.expires))?;
        store.save()?;
        info!("Stored new access token, expires {}", credentials.expires);

        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::utils::ConfigPaths;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AccessTokenSource for CountingSource {
        async fn obtain_access_token(
            &self,
            consumer_key: &str,
            _consumer_secret: &str,
        ) -> HatenaResult<TokenPair> {
            assert_eq!(consumer_key, "ck");
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TokenPair {
                token: "fresh-token".into(),
                secret: "fresh-secret".into(),
            })
        }
    }

    fn store_with(dir: &TempDir, token: &str, expires: DateTime<Utc>) -> ConfigStore {
        let mut store = ConfigStore::open(ConfigPaths::in_dir(dir.path())).unwrap();
        store.set(KEY_API_KEY, "ck").unwrap();
        store.set(KEY_API_SECRET, "cs").unwrap();
        store.set(KEY_ACCESS_TOKEN, token).unwrap();
        store.set(KEY_ACCESS_SECRET, token).unwrap();
        store.set(KEY_EXPIRES, to_toml_datetime(expires)).unwrap();
        store
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn valid_token_skips_handshake() {
        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, "cached", now() + Duration::days(1));
        let manager = CredentialManager::new(CountingSource::default());

        let creds = manager.ensure_valid_at(&mut store, now()).await.unwrap();

        assert_eq!(creds.access_token, "cached");
        assert_eq!(manager.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted() {
        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, "stale", now());
        let manager = CredentialManager::new(CountingSource::default());

        let creds = manager.ensure_valid_at(&mut store, now()).await.unwrap();

        assert_eq!(manager.source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(creds.access_token, "fresh-token");
        assert_eq!(creds.expires, now() + Duration::days(60));

        let reloaded = ConfigStore::open(ConfigPaths::in_dir(dir.path())).unwrap();
        assert_eq!(reloaded.get_str(KEY_ACCESS_SECRET).unwrap(), "fresh-secret");
        assert_eq!(
            reloaded.get_datetime(KEY_EXPIRES).unwrap(),
            now() + Duration::days(60)
        );
    }

    #[tokio::test]
    async fn empty_token_is_refreshed() {
        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, "", now() + Duration::days(30));
        let manager = CredentialManager::new(CountingSource::default());

        manager.ensure_valid_at(&mut store, now()).await.unwrap();
        assert_eq!(manager.source.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            manager.state(&store, now()).unwrap(),
            AuthState::Authenticated { .. }
        ));
    }

    #[tokio::test]
    async fn missing_consumer_key_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let mut store = store_with(&dir, "", now());
        store.set(KEY_API_KEY, "").unwrap();
        let manager = CredentialManager::new(CountingSource::default());

        let err = manager.ensure_valid_at(&mut store, now()).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
        assert_eq!(manager.source.calls.load(Ordering::SeqCst), 0);
    }
}
