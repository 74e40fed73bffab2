use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;
pub type SignResult<T> = std::result::Result<T, SignError>;
pub type TokenReaderResult<T> = std::result::Result<T, TokenReaderError>;
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Failure kinds reported to the caller of a login attempt.
///
/// Every kind is terminal for the attempt it ends; nothing is retried
/// internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("could not obtain the reverse auth header")]
    ErrorGettingHeader,
    #[error("could not obtain tokens through the native account")]
    ErrorGettingTokens,
    #[error("request could not be built or its response could not be read")]
    BadUrlRequest,
    #[error("access to the native accounts was denied")]
    NoAccessToAccounts,
    #[error("there are no native accounts available")]
    NoAvailableAccounts,
    #[error("callback does not match the pending login request")]
    WrongCallback,
    #[error("the authorization page could not be loaded")]
    UnableToLoadWeb,
    #[error("the obtained credential could not be saved")]
    UnableToSaveAccount,
    #[error("the user cancelled the login")]
    UserCancelled,
    #[error("unknown error")]
    Unknown,
    #[error("missing configuration : {0} must be set before any other call")]
    MissingConfiguration(&'static str),
    #[error("another login attempt is still in progress")]
    AttemptInProgress,
}

#[derive(Error, Debug, Clone)]
pub enum SignError {
    #[error("unknown oauth parameter : {0}")]
    UnknownParameter(String),
    #[error("invalid url : {0}")]
    InvalidUrl(String),
    #[error("{0} must not be empty")]
    EmptyCredential(&'static str),
    #[error("unsupported http method {0}, must be GET, POST or DELETE")]
    UnsupportedMethod(String),
    #[error("parameters could not be form-encoded : {0}")]
    Encoding(String),
}

impl From<SignError> for AuthError {
    fn from(_: SignError) -> Self {
        AuthError::BadUrlRequest
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenReaderError {
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
    #[error("response has malformed format: {0} appears more than once in {1}")]
    DuplicatedTokenKey(&'static str, String),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed : {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("transport failed : {0}")]
    Other(String),
}
