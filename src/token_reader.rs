use serde::{Deserialize, Serialize};

use crate::{TokenReaderError, TokenReaderResult, OAUTH_VERIFIER_KEY};

const OAUTH_TOKEN_KEY: &str = "oauth_token";
const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";
const OAUTH_CALLBACK_CONFIRMED_KEY: &str = "oauth_callback_confirmed";
const USER_ID_KEY: &str = "user_id";
const SCREEN_NAME_KEY: &str = "screen_name";

/// A typed record read out of a `key=value&key=value` response body.
pub trait TokenResponse: Sized {
    /// Keys this record is built from, in checklist order.
    const KEYS: &'static [&'static str];

    /// Builds the record from one value per entry of [`Self::KEYS`], in the
    /// same order.
    fn from_values(values: Vec<String>) -> Self;

    /// Parses `text`, see [`read_token_response`].
    fn parse(text: &str) -> TokenReaderResult<Self> {
        read_token_response(text)
    }
}

/// Response of the request-token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTokenResult {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    /// Whether the provider registered the callback sent with the request.
    pub oauth_callback_confirmed: bool,
}

impl TokenResponse for RequestTokenResult {
    const KEYS: &'static [&'static str] = &[
        OAUTH_TOKEN_KEY,
        OAUTH_TOKEN_SECRET_KEY,
        OAUTH_CALLBACK_CONFIRMED_KEY,
    ];

    fn from_values(values: Vec<String>) -> Self {
        let mut values = values.into_iter();
        RequestTokenResult {
            oauth_token: values.next().unwrap_or_default(),
            oauth_token_secret: values.next().unwrap_or_default(),
            oauth_callback_confirmed: values.next().map_or(false, |v| v == "true"),
        }
    }
}

/// Token and verifier carried by the callback URL after user authorization,
/// e.g. `twicket://auth?oauth_token=OHPgMw&oauth_verifier=3xeRKf`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectionResult {
    pub oauth_token: String,
    pub oauth_verifier: String,
}

impl RedirectionResult {
    /// Reads the query part of a callback URL. A string without `?` is read
    /// as a bare query.
    pub fn from_callback_url(callback: &str) -> TokenReaderResult<Self> {
        let query = match callback.split_once('?') {
            Some((_, query)) => query,
            None => callback,
        };
        // fragments are never part of the signed values
        let query = query.split('#').next().unwrap_or_default();
        read_token_response(query)
    }
}

impl TokenResponse for RedirectionResult {
    const KEYS: &'static [&'static str] = &[OAUTH_TOKEN_KEY, OAUTH_VERIFIER_KEY];

    fn from_values(values: Vec<String>) -> Self {
        let mut values = values.into_iter();
        RedirectionResult {
            oauth_token: values.next().unwrap_or_default(),
            oauth_verifier: values.next().unwrap_or_default(),
        }
    }
}

/// A bare access token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenResult {
    pub oauth_token: String,
    pub oauth_token_secret: String,
}

impl TokenResponse for AccessTokenResult {
    const KEYS: &'static [&'static str] = &[OAUTH_TOKEN_KEY, OAUTH_TOKEN_SECRET_KEY];

    fn from_values(values: Vec<String>) -> Self {
        let mut values = values.into_iter();
        AccessTokenResult {
            oauth_token: values.next().unwrap_or_default(),
            oauth_token_secret: values.next().unwrap_or_default(),
        }
    }
}

impl From<TwitterAuthResult> for AccessTokenResult {
    fn from(result: TwitterAuthResult) -> Self {
        AccessTokenResult {
            oauth_token: result.oauth_token,
            oauth_token_secret: result.oauth_token_secret,
        }
    }
}

/// The durable credential handed to the caller at the end of a login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterAuthResult {
    pub oauth_token: String,
    pub oauth_token_secret: String,
    pub user_id: String,
    pub user_name: String,
}

impl TokenResponse for TwitterAuthResult {
    const KEYS: &'static [&'static str] = &[
        OAUTH_TOKEN_KEY,
        OAUTH_TOKEN_SECRET_KEY,
        USER_ID_KEY,
        SCREEN_NAME_KEY,
    ];

    fn from_values(values: Vec<String>) -> Self {
        let mut values = values.into_iter();
        TwitterAuthResult {
            oauth_token: values.next().unwrap_or_default(),
            oauth_token_secret: values.next().unwrap_or_default(),
            user_id: values.next().unwrap_or_default(),
            user_name: values.next().unwrap_or_default(),
        }
    }
}

/// Reads a `&`-delimited response body into `T`.
///
/// Each segment is matched against `T::KEYS` as a `key=` prefix, first
/// match wins. Segments matching no key are dropped. Every key must appear
/// exactly once; values are taken verbatim.
pub fn read_token_response<T: TokenResponse>(text: &str) -> TokenReaderResult<T> {
    let mut slots: Vec<Option<String>> = vec![None; T::KEYS.len()];

    for segment in text.trim().split('&') {
        let matched = T::KEYS.iter().enumerate().find_map(|(i, key)| {
            segment
                .strip_prefix(key)
                .and_then(|rest| rest.strip_prefix('='))
                .map(|value| (i, value))
        });
        if let Some((i, value)) = matched {
            if slots[i].is_some() {
                return Err(TokenReaderError::DuplicatedTokenKey(
                    T::KEYS[i],
                    text.to_string(),
                ));
            }
            slots[i] = Some(value.to_string());
        }
    }

    let mut values = Vec::with_capacity(slots.len());
    for (key, slot) in T::KEYS.iter().zip(slots) {
        match slot {
            Some(value) => values.push(value),
            None => return Err(TokenReaderError::TokenKeyNotFound(*key, text.to_string())),
        }
    }
    Ok(T::from_values(values))
}
