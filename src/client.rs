use http::Method;
use oauth1_request::HmacSha1;
use url::Url;

use crate::{
    AccessTokenResult, AuthError, Credentials, HttpTransport, NativeAccount, OAuthParameters,
    RedirectionResult, RequestTokenResult, Result, SignedRequest, TokenResponse,
    TwitterAuthConfig, TwitterAuthResult, OAUTH_VERIFIER_KEY,
};

const AUTH_MODE_KEY: &str = "x_auth_mode";
const REVERSE_AUTH_MODE: &str = "reverse_auth";
const REVERSE_AUTH_PARAMS_KEY: &str = "x_reverse_auth_parameters";
const REVERSE_AUTH_TARGET_KEY: &str = "x_reverse_auth_target";
const AUTHORIZATION_SCHEME: &str = "OAuth ";

/// Issues the network calls of the OAuth 1.0a handshake.
///
/// Nothing is retried: every failure is reported once and the caller decides
/// whether to start over.
#[derive(Debug, Clone)]
pub struct TokenExchangeClient<T> {
    credentials: Credentials,
    request_token_url: String,
    access_token_url: String,
    transport: T,
    oauth: OAuthParameters<'static, HmacSha1>,
}

impl<T> TokenExchangeClient<T>
where
    T: HttpTransport,
{
    /// Constructs a client talking to the default API host.
    pub fn new(credentials: Credentials, transport: T) -> Self {
        let config = TwitterAuthConfig::new(
            credentials.consumer_key(),
            credentials.consumer_secret(),
            "",
        );
        Self::from_config(&config, transport)
    }

    pub fn from_config(config: &TwitterAuthConfig, transport: T) -> Self {
        TokenExchangeClient {
            credentials: config.credentials.clone(),
            request_token_url: config.request_token_url(),
            access_token_url: config.access_token_url(),
            transport,
            oauth: OAuthParameters::new(),
        }
    }

    /// Fixes the OAuth options used for every request, e.g. a known nonce.
    pub fn with_oauth_parameters(self, oauth: OAuthParameters<'static, HmacSha1>) -> Self {
        TokenExchangeClient { oauth, ..self }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Step 1: obtain a request token registered for `callback`.
    ///
    /// A token whose callback the provider did not confirm is not usable and
    /// is reported as [`AuthError::Unknown`].
    pub async fn obtain_request_token(&self, callback: &str) -> Result<String> {
        self.check_necessary_properties()?;
        let request = self
            .signed_request(&self.request_token_url)
            .oauth_callback(callback);
        let result: RequestTokenResult = self.perform(request).await?;
        if !result.oauth_callback_confirmed {
            tracing::warn!("request token was issued without a confirmed callback");
            return Err(AuthError::Unknown);
        }
        tracing::debug!(oauth_token = %result.oauth_token, "obtained request token");
        Ok(result.oauth_token)
    }

    /// Step 3: exchange the verifier from the callback for the user's
    /// access token and identity.
    pub async fn obtain_access_token(
        &self,
        redirection: &RedirectionResult,
    ) -> Result<TwitterAuthResult> {
        self.check_necessary_properties()?;
        self.perform(self.access_token_request(redirection)).await
    }

    /// Like [`Self::obtain_access_token`] but only requires the token pair
    /// in the response.
    pub async fn obtain_access_token_pair(
        &self,
        redirection: &RedirectionResult,
    ) -> Result<AccessTokenResult> {
        self.check_necessary_properties()?;
        self.perform(self.access_token_request(redirection)).await
    }

    /// Reverse authentication through an account held by the platform.
    ///
    /// The first call is signed locally and returns a signed header issued
    /// for this app. The second call carries that header and is signed by
    /// the account itself.
    pub async fn execute_reverse_auth(
        &self,
        account: &dyn NativeAccount,
    ) -> Result<TwitterAuthResult> {
        self.check_necessary_properties()?;
        let header = self.obtain_authorization_header().await?;

        let url = Url::parse(&self.access_token_url).map_err(|_| AuthError::BadUrlRequest)?;
        let parameters = vec![
            (
                REVERSE_AUTH_TARGET_KEY.to_string(),
                self.credentials.consumer_key().to_string(),
            ),
            (REVERSE_AUTH_PARAMS_KEY.to_string(), header),
        ];
        let body = account
            .perform_request(&url, &parameters)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, account = account.username(), "reverse auth token request failed");
                AuthError::ErrorGettingTokens
            })?;

        let text = String::from_utf8(body).map_err(|_| AuthError::Unknown)?;
        TwitterAuthResult::parse(&text).map_err(|e| {
            tracing::debug!(error = %e, "unexpected reverse auth token response");
            AuthError::Unknown
        })
    }

    async fn obtain_authorization_header(&self) -> Result<String> {
        let wire = self
            .signed_request(&self.request_token_url)
            .parameter(AUTH_MODE_KEY, REVERSE_AUTH_MODE)
            .sign()?;
        let body = self.transport.execute(wire).await.map_err(|e| {
            tracing::warn!(error = %e, "reverse auth header request failed");
            AuthError::ErrorGettingHeader
        })?;
        let header = String::from_utf8(body).map_err(|_| AuthError::ErrorGettingHeader)?;
        if !header.starts_with(AUTHORIZATION_SCHEME) {
            tracing::debug!(response = %header, "reverse auth header has unexpected shape");
            return Err(AuthError::ErrorGettingHeader);
        }
        Ok(header)
    }

    fn access_token_request<'a>(&'a self, redirection: &'a RedirectionResult) -> SignedRequest<'a> {
        self.signed_request(&self.access_token_url)
            .parameter(OAUTH_VERIFIER_KEY, redirection.oauth_verifier.as_str())
            .oauth_token(redirection.oauth_token.as_str())
    }

    fn signed_request<'a>(&'a self, url: &'a str) -> SignedRequest<'a> {
        SignedRequest::new(Method::POST, url, &self.credentials).oauth_parameters(self.oauth.clone())
    }

    async fn perform<R: TokenResponse>(&self, request: SignedRequest<'_>) -> Result<R> {
        let wire = request.sign().map_err(|e| {
            tracing::warn!(error = %e, "could not sign request");
            AuthError::from(e)
        })?;
        let body = self.transport.execute(wire).await.map_err(|e| {
            tracing::warn!(error = %e, "token request failed");
            AuthError::BadUrlRequest
        })?;
        let text = String::from_utf8(body).map_err(|e| {
            tracing::warn!(error = %e, "token response is not text");
            AuthError::BadUrlRequest
        })?;
        R::parse(&text).map_err(|e| {
            tracing::debug!(error = %e, "unexpected token response");
            AuthError::Unknown
        })
    }

    fn check_necessary_properties(&self) -> Result<()> {
        self.credentials.validate()
    }
}
