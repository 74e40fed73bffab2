use std::fmt;

use crate::{AuthError, Result};

/// The application's consumer key pair.
///
/// Supplied once at configuration time and never mutated afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    consumer_key: String,
    consumer_secret: String,
}

impl Credentials {
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Credentials {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn consumer_secret(&self) -> &str {
        &self.consumer_secret
    }

    pub fn get_consumer_key_pair(&self) -> (&str, &str) {
        (&self.consumer_key, &self.consumer_secret)
    }

    /// Checks that both halves of the key pair are present.
    pub fn validate(&self) -> Result<()> {
        if self.consumer_key.is_empty() {
            return Err(AuthError::MissingConfiguration("consumer key"));
        }
        if self.consumer_secret.is_empty() {
            return Err(AuthError::MissingConfiguration("consumer secret"));
        }
        Ok(())
    }
}

// keep the secret out of logs and panic messages
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}
