use super::credential_manager::{AccessTokenSource, TokenPair};
use super::oauth1::OAuthSigner;
use crate::config::{
    OAUTH_ACCESS_TOKEN_URL, OAUTH_AUTHORIZE_URL, OAUTH_INITIATE_URL, OAUTH_SCOPES,
};
use crate::error::{errors, HatenaResult};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, info};

/// Callback value for clients that cannot receive redirects.
const OUT_OF_BAND: &str = "oob";

/// Supplies the verifier code the user obtained after authorizing in a browser.
pub trait VerifierPrompt: Send + Sync {
    fn verifier(&self, authorize_url: &str) -> HatenaResult<String>;
}

impl<F> VerifierPrompt for F
where
    F: Fn(&str) -> HatenaResult<String> + Send + Sync,
{
    fn verifier(&self, authorize_url: &str) -> HatenaResult<String> {
        self(authorize_url)
    }
}

/// The three URLs of the OAuth1 provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub initiate: String,
    pub authorize: String,
    pub access_token: String,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            initiate: OAUTH_INITIATE_URL.to_string(),
            authorize: OAUTH_AUTHORIZE_URL.to_string(),
            access_token: OAUTH_ACCESS_TOKEN_URL.to_string(),
        }
    }
}

impl OAuthEndpoints {
    /// Endpoints below a single base URL (`/oauth/initiate`, ...), for tests and proxies.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            initiate: format!("{base}/oauth/initiate"),
            authorize: format!("{base}/oauth/authorize"),
            access_token: format!("{base}/oauth/token"),
        }
    }
}

/// OAuth1 client for the out-of-band three-legged flow.
pub struct OAuthClient<P> {
    http: reqwest::Client,
    endpoints: OAuthEndpoints,
    scopes: Vec<String>,
    prompt: P,
}

impl<P: VerifierPrompt> OAuthClient<P> {
    pub fn new(prompt: P) -> Self {
        Self::with_endpoints(OAuthEndpoints::default(), prompt)
    }

    pub fn with_endpoints(endpoints: OAuthEndpoints, prompt: P) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
            scopes: OAUTH_SCOPES.iter().map(|s| s.to_string()).collect(),
            prompt,
        }
    }

    /// Step 1: obtain a temporary token.
    pub async fn request_token(
        &self,
        consumer_key: &str,
        consumer_secret: &str,
    ) -> HatenaResult<TokenPair> {
        info!("Obtaining request token...");
        let scope = self.scopes.join(",");
        let form = [("scope", scope.as_str())];
        let header = OAuthSigner::new(consumer_key, consumer_secret)
            .with_callback(OUT_OF_BAND)
            .authorization_header("POST", &self.endpoints.initiate, &form)?;

        let response = self
            .http
            .post(&self.endpoints.initiate)
            .header(AUTHORIZATION, header)
            .form(&form)
            .send()
            .await?;

        read_token_response(response, "request token").await
    }

    /// Step 2: the page where the user grants access to the temporary token.
    pub fn authorize_url(&self, request_token: &str) -> String {
        format!(
            "{}?oauth_token={}",
            self.endpoints.authorize,
            urlencoding::encode(request_token)
        )
    }

    /// Step 3: exchange the temporary token and verifier for an access token.
    pub async fn access_token(
        &self,
        consumer_key: &str,
        consumer_secret: &str,
        request: &TokenPair,
        verifier: &str,
    ) -> HatenaResult<TokenPair> {
        info!("Obtaining access token...");
        let header = OAuthSigner::new(consumer_key, consumer_secret)
            .with_token(&request.token, &request.secret)
            .with_verifier(verifier)
            .authorization_header("POST", &self.endpoints.access_token, &[])?;

        let response = self
            .http
            .post(&self.endpoints.access_token)
            .header(AUTHORIZATION, header)
            .send()
            .await?;

        read_token_response(response, "access token").await
    }
}

#[async_trait]
impl<P: VerifierPrompt> AccessTokenSource for OAuthClient<P> {
    async fn obtain_access_token(
        &self,
        consumer_key: &str,
        consumer_secret: &str,
    ) -> HatenaResult<TokenPair> {
        let request = self.request_token(consumer_key, consumer_secret).await?;
        let verifier = self.prompt.verifier(&self.authorize_url(&request.token))?;
        let verifier = verifier.trim();
        if verifier.is_empty() {
            return Err(errors::auth_error("No verifier code entered", None));
        }
        self.access_token(consumer_key, consumer_secret, &request, verifier)
            .await
    }
}

async fn read_token_response(response: reqwest::Response, what: &str) -> HatenaResult<TokenPair> {
    let status = response.status();
    let body = response.text().await?;
    debug!("{} response: {}", what, status);

    if !status.is_success() {
        return Err(errors::auth_error(
            format!("Failed to obtain {what}: {}", body.trim()),
            Some(status.as_u16()),
        ));
    }

    parse_token_pair(&body).ok_or_else(|| {
        errors::auth_error(
            format!("Malformed {what} response"),
            Some(status.as_u16()),
        )
    })
}

/// Parse `oauth_token=...&oauth_token_secret=...` form bodies.
pub fn parse_token_pair(body: &str) -> Option<TokenPair> {
    let mut token = None;
    let mut secret = None;
    for (key, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
        match key.as_ref() {
            "oauth_token" => token = Some(value.into_owned()),
            "oauth_token_secret" => secret = Some(value.into_owned()),
            _ => {}
        }
    }
    Some(TokenPair {
        token: token?,
        secret: secret?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_prompt(_: &str) -> HatenaResult<String> {
        Ok(String::new())
    }

    #[test]
    fn parses_token_pairs() {
        let pair = parse_token_pair(
            "oauth_token=abc%3D&oauth_token_secret=s3cr3t&oauth_callback_confirmed=true\n",
        )
        .unwrap();
        assert_eq!(pair.token, "abc=");
        assert_eq!(pair.secret, "s3cr3t");

        assert!(parse_token_pair("oauth_token=only").is_none());
        assert!(parse_token_pair("").is_none());
    }

    #[test]
    fn authorize_url_embeds_the_request_token() {
        let client = OAuthClient::new(no_prompt);
        assert_eq!(
            client.authorize_url("a+b"),
            "https://www.hatena.ne.jp/oauth/authorize?oauth_token=a%2Bb"
        );
    }

    #[test]
    fn default_scopes_cover_public_and_private_content() {
        let client = OAuthClient::new(no_prompt);
        assert_eq!(
            client.scopes,
            vec!["read_public", "write_public", "read_private", "write_private"]
        );
    }
}
