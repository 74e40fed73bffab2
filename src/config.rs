use std::time::Duration;

use url::Url;

use crate::{AuthError, Credentials, Result, DEFAULT_TIMEOUT};

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";

const REQUEST_TOKEN_PATH: &str = "/oauth/request_token";
const ACCESS_TOKEN_PATH: &str = "/oauth/access_token";
const AUTHENTICATE_PATH: &str = "/oauth/authenticate";

#[derive(Debug, Clone)]
pub struct TwitterAuthConfig {
    pub credentials: Credentials,
    /// Callback registered with the request token. Incoming deep links must
    /// contain it verbatim.
    pub callback_url: String,
    pub api_base: String,
    pub timeout: Duration,
    /// Persist the credential obtained by a web login into the account store.
    pub save_credentials: bool,
    pub force_login: bool,
}

impl TwitterAuthConfig {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            credentials: Credentials::new(consumer_key, consumer_secret),
            callback_url: callback_url.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            save_credentials: false,
            force_login: true,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_save_credentials(mut self, save_credentials: bool) -> Self {
        self.save_credentials = save_credentials;
        self
    }

    pub fn with_force_login(mut self, force_login: bool) -> Self {
        self.force_login = force_login;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.credentials.validate()?;
        if self.callback_url.is_empty() {
            return Err(AuthError::MissingConfiguration("callback url"));
        }
        Ok(())
    }

    pub fn request_token_url(&self) -> String {
        self.endpoint(REQUEST_TOKEN_PATH)
    }

    pub fn access_token_url(&self) -> String {
        self.endpoint(ACCESS_TOKEN_PATH)
    }

    /// Page the user is sent to in order to authorize `token`.
    pub fn authorization_url(&self, token: &str) -> Result<Url> {
        let mut url =
            Url::parse(&self.endpoint(AUTHENTICATE_PATH)).map_err(|_| AuthError::BadUrlRequest)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("oauth_token", token);
            if self.force_login {
                pairs.append_pair("force_login", "true");
            }
        }
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }
}
