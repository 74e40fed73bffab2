/*!
twitter-reverse-auth: OAuth 1.0a login for apps, on top of reqwest and oauth1-request.

# Overview

This library obtains a user's Twitter access token in one of two ways:

- the web login flow: request token, user authorization in a browser view,
  access token exchange with the verifier delivered through a deep link;
- reverse authentication: an account already held by the platform signs the
  token request on behalf of the app, no browser needed.

The browser view, the account store, the account picker and the UI thread
stay on the application side, behind the traits in [`platform`].

# How to use

## Web login

```rust,ignore
use std::sync::Arc;
use twitter_reverse_auth::{TwitterAuth, TwitterAuthConfig};

// prepare authorization info
let config = TwitterAuthConfig::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]", "twicket://auth");
let auth = TwitterAuth::new(config, Arc::new(MyBrowserView::default()))?;

// step 1: acquire a request token and show the authorization page
let attempt = auth.start_web_login().await?;

// step 2: when the app is opened through the callback deep link
auth.process_auth_callback("twicket://auth?oauth_token=...&oauth_verifier=...")
    .await;

// step 3: the attempt resolves with the access token
let result = attempt.await?;
println!(
    "your token and secret is: \n token: {}\n secret: {}",
    result.oauth_token, result.oauth_token_secret
);
```

## Reverse authentication

```rust,ignore
let auth = auth
    .with_account_store(Arc::new(MyAccountStore::default()))
    .with_account_picker(Arc::new(MyAccountPicker::default()));
let result = auth.execute_reverse_auth_with_available_accounts().await?;
println!("logged in as @{}", result.user_name);
```

## Signing a request by hand

```rust,ignore
use http::Method;
use twitter_reverse_auth::{Credentials, SignedRequest};

let credentials = Credentials::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]");
let wire = SignedRequest::new(Method::POST, "https://api.twitter.com/oauth/request_token", &credentials)
    .oauth_callback("twicket://auth")
    .sign()?;
// wire.authorization holds the `OAuth ...` header value
```
*/
mod auth;
mod client;
mod config;
mod credentials;
mod error;
pub mod platform;
mod signer;
mod token_reader;
mod transport;
#[cfg(test)]
mod test_support;

// exposed to external program
pub use auth::{LoginAttempt, PendingRequest, Phase, TwitterAuth};
pub use client::TokenExchangeClient;
pub use config::{TwitterAuthConfig, DEFAULT_API_BASE};
pub use credentials::Credentials;
pub use error::{
    AuthError, Result, SignError, SignResult, TokenReaderError, TokenReaderResult,
    TransportError, TransportResult,
};
pub use platform::{
    AccountChoice, AccountPicker, AccountStore, Dispatcher, InlineDispatcher, LoginPresenter,
    NativeAccount,
};
pub use signer::{OAuthParameters, SignedRequest, WireRequest};
pub use token_reader::{
    read_token_response, AccessTokenResult, RedirectionResult, RequestTokenResult,
    TokenResponse, TwitterAuthResult,
};
pub use transport::{HttpTransport, ReqwestTransport, DEFAULT_TIMEOUT};

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";

// crate-private constant variables
pub(crate) const OAUTH_KEY_PREFIX: &str = "oauth_";
