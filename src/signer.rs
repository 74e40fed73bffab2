use std::borrow::Cow;

use http::Method;
use oauth1_request::signature_method::SignatureMethod;
use oauth1_request::signer::Signer as OAuthSigner;
use oauth1_request::{HmacSha1, Options};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::{
    Credentials, SignError, SignResult, OAUTH_CALLBACK_KEY, OAUTH_KEY_PREFIX, OAUTH_VERIFIER_KEY,
};

const UNRESERVED_ESCAPED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A request to be signed: target, method, declared parameters and the
/// OAuth values that go into the `Authorization` header.
///
/// This is a plain value. Signing it does not consume or mutate it, so the
/// same request signed twice with a fixed nonce and timestamp yields the
/// same header.
#[derive(Debug, Clone)]
pub struct SignedRequest<'a, TSignatureMethod = HmacSha1>
where
    TSignatureMethod: SignatureMethod + Clone,
{
    url: Cow<'a, str>,
    method: Method,
    parameters: Vec<(String, String)>,
    credentials: &'a Credentials,
    oauth_token: Option<Cow<'a, str>>,
    token_secret: Option<Cow<'a, str>>,
    oauth_callback: Option<Cow<'a, str>>,
    oauth: OAuthParameters<'a, TSignatureMethod>,
}

/// The signed, wire-ready form of a [`SignedRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    pub method: Method,
    /// Target URL. Carries the encoded parameters as its query for GET and
    /// DELETE, and the caller's own query for POST.
    pub url: Url,
    /// Value of the `Authorization` header, starting with `OAuth `.
    pub authorization: String,
    /// `application/x-www-form-urlencoded` body, only present for POST.
    pub body: Option<String>,
}

impl<'a> SignedRequest<'a, HmacSha1> {
    pub fn new<U>(method: Method, url: U, credentials: &'a Credentials) -> Self
    where
        U: Into<Cow<'a, str>>,
    {
        SignedRequest {
            url: url.into(),
            method,
            parameters: Vec::new(),
            credentials,
            oauth_token: None,
            token_secret: None,
            oauth_callback: None,
            oauth: OAuthParameters::new(),
        }
    }
}

impl<'a, TSignatureMethod> SignedRequest<'a, TSignatureMethod>
where
    TSignatureMethod: SignatureMethod + Clone,
{
    /// Adds a request parameter. Declaration order is irrelevant: parameters
    /// are sorted while signing.
    pub fn parameter<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.parameters.push((key.into(), value.into()));
        self
    }

    pub fn oauth_token<T>(self, token: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        SignedRequest {
            oauth_token: Some(token.into()),
            ..self
        }
    }

    /// Sets the token secret used as the second half of the signing key.
    pub fn token_secret<T>(self, token_secret: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        SignedRequest {
            token_secret: Some(token_secret.into()),
            ..self
        }
    }

    pub fn oauth_callback<T>(self, callback: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        SignedRequest {
            oauth_callback: Some(callback.into()),
            ..self
        }
    }

    /// Replaces the nonce/timestamp/version/signature-method options.
    pub fn oauth_parameters<TOther>(
        self,
        oauth: OAuthParameters<'a, TOther>,
    ) -> SignedRequest<'a, TOther>
    where
        TOther: SignatureMethod + Clone,
    {
        SignedRequest {
            url: self.url,
            method: self.method,
            parameters: self.parameters,
            credentials: self.credentials,
            oauth_token: self.oauth_token,
            token_secret: self.token_secret,
            oauth_callback: self.oauth_callback,
            oauth,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sign the request and build its wire form.
    ///
    /// `oauth_callback` and `oauth_verifier` parameters are moved into the
    /// header. Any other `oauth_*` parameter is rejected since the header is
    /// generated here.
    pub fn sign(&self) -> SignResult<WireRequest> {
        if ![Method::GET, Method::POST, Method::DELETE].contains(&self.method) {
            return Err(SignError::UnsupportedMethod(self.method.to_string()));
        }
        let (consumer_key, consumer_secret) = self.credentials.get_consumer_key_pair();
        if consumer_key.is_empty() {
            return Err(SignError::EmptyCredential("consumer key"));
        }
        if consumer_secret.is_empty() {
            return Err(SignError::EmptyCredential("consumer secret"));
        }

        let mut url =
            Url::parse(&self.url).map_err(|e| SignError::InvalidUrl(format!("{}: {}", self.url, e)))?;
        if !url.has_host() {
            return Err(SignError::InvalidUrl(self.url.to_string()));
        }

        // query parameters already on the url are signed like declared ones
        let url_query = url.query().map(str::to_owned);
        let query_params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.set_query(None);
        url.set_fragment(None);

        let mut callback = self.oauth_callback.as_deref();
        let mut verifier = None;
        let mut declared_params = Vec::new();
        for (key, value) in &self.parameters {
            match key.as_str() {
                OAUTH_CALLBACK_KEY => callback = Some(value.as_str()),
                OAUTH_VERIFIER_KEY => verifier = Some(value.as_str()),
                k if k.starts_with(OAUTH_KEY_PREFIX) => {
                    return Err(SignError::UnknownParameter(key.clone()))
                }
                _ => declared_params.push((key.clone(), value.clone())),
            }
        }

        let payload = encode_form(&[query_params, declared_params.clone()].concat())?;
        let is_url_query = self.method != Method::POST;

        let authorization =
            self.generate_signature(url.clone(), &payload, is_url_query, callback, verifier);

        let (url, body) = if is_url_query {
            if !payload.is_empty() {
                url.set_query(Some(&payload));
            }
            (url, None)
        } else {
            // the caller's query stays on the url, only declared parameters form the body
            url.set_query(url_query.as_deref());
            (url, Some(encode_form(&declared_params)?))
        };

        Ok(WireRequest {
            method: self.method.clone(),
            url,
            authorization,
            body,
        })
    }

    fn generate_signature(
        &self,
        url: Url,
        payload: &str,
        is_url_query: bool,
        callback: Option<&str>,
        verifier: Option<&str>,
    ) -> String {
        let (consumer_key, consumer_secret) = self.credentials.get_consumer_key_pair();
        let token = self.oauth_token.as_deref();
        let token_secret = self.token_secret.as_deref();
        let options = self.oauth.build_options(callback, token, verifier);

        // destructure payload and sort by the encoded key, then the encoded value
        let mut sorted_query: Vec<(String, String, Cow<str>)> =
            url::form_urlencoded::parse(payload.as_bytes())
                .map(|(k, v)| (percent_encode(&k), percent_encode(&v), v))
                .chain(std::iter::once((
                    OAUTH_KEY_PREFIX.to_string(),
                    String::new(),
                    Cow::from(""),
                )))
                .collect();
        sorted_query.sort();

        // parameters sorting before "oauth_" go in ahead of the oauth_* block
        let mut divided = sorted_query.splitn(2, |(k, _, _)| k == OAUTH_KEY_PREFIX);
        let query_before_oauth = divided.next().unwrap_or_default();
        let query_after_oauth = divided.next().unwrap_or_default();

        let sig_method = self.oauth.signature_method.clone();
        let mut signer = if is_url_query {
            OAuthSigner::with_signature_method(
                sig_method,
                self.method.as_str(),
                url,
                consumer_secret,
                token_secret,
            )
        } else {
            OAuthSigner::form_with_signature_method(
                sig_method,
                self.method.as_str(),
                url,
                consumer_secret,
                token_secret,
            )
        };

        // the signer writes keys into the base string as given
        for (key, _, value) in query_before_oauth {
            signer.parameter(&percent_encode(key), value);
        }
        let mut signer = signer.oauth_parameters(consumer_key, &options);
        for (key, _, value) in query_after_oauth {
            signer.parameter(&percent_encode(key), value);
        }

        signer.finish().authorization
    }
}

fn encode_form(params: &[(String, String)]) -> SignResult<String> {
    serde_urlencoded::to_string(params).map_err(|e| SignError::Encoding(e.to_string()))
}

/// RFC 3986 percent-encoding, leaving only unreserved characters as they are.
fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, UNRESERVED_ESCAPED).to_string()
}

/// Per-invocation OAuth options.
///
/// Nonce and timestamp are generated for every signature unless fixed here.
#[derive(Debug, Clone)]
pub struct OAuthParameters<'a, TSignatureMethod>
where
    TSignatureMethod: SignatureMethod + Clone,
{
    nonce: Option<Cow<'a, str>>,
    signature_method: TSignatureMethod,
    timestamp: Option<u64>,
    version: bool,
}

impl Default for OAuthParameters<'static, HmacSha1> {
    fn default() -> Self {
        OAuthParameters {
            nonce: None,
            signature_method: HmacSha1,
            timestamp: None,
            version: false,
        }
    }
}

impl<'a> OAuthParameters<'a, HmacSha1> {
    pub fn new() -> Self {
        Default::default()
    }
}

impl<'a, T> OAuthParameters<'a, T>
where
    T: SignatureMethod + Clone,
{
    /// set the oauth_nonce value
    pub fn nonce<N>(self, nonce: N) -> Self
    where
        N: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp<N>(self, timestamp: N) -> Self
    where
        N: Into<u64>,
    {
        OAuthParameters {
            timestamp: Some(timestamp.into()),
            ..self
        }
    }

    /// set the oauth_version value (boolean)
    ///
    /// # Note
    /// When `true`, `oauth_version="1.0"` is included in the header.
    /// Otherwise it is omitted, which OAuth 1.0a permits.
    pub fn version<V>(self, version: V) -> Self
    where
        V: Into<bool>,
    {
        OAuthParameters {
            version: version.into(),
            ..self
        }
    }

    pub fn signature_method<TSignatureMethod>(
        self,
        signature_method: TSignatureMethod,
    ) -> OAuthParameters<'a, TSignatureMethod>
    where
        TSignatureMethod: SignatureMethod + Clone,
    {
        OAuthParameters {
            signature_method,
            nonce: self.nonce,
            timestamp: self.timestamp,
            version: self.version,
        }
    }

    fn build_options<'b>(
        &'b self,
        callback: Option<&'b str>,
        token: Option<&'b str>,
        verifier: Option<&'b str>,
    ) -> Options<'b> {
        let mut opt = Options::new();

        // NOTE: items must be added by alphabetical order
        if let Some(callback) = callback {
            opt.callback(callback);
        }
        if let Some(ref nonce) = self.nonce {
            opt.nonce(nonce.as_ref());
        }
        if let Some(timestamp) = self.timestamp {
            opt.timestamp(timestamp);
        }
        if let Some(token) = token {
            opt.token(token);
        }
        if let Some(verifier) = verifier {
            opt.verifier(verifier);
        }
        opt.version(self.version);

        opt
    }
}
