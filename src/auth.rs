use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::{
    AccountPicker, AccountStore, AuthError, Dispatcher, HttpTransport, InlineDispatcher,
    LoginPresenter, NativeAccount, RedirectionResult, ReqwestTransport, Result,
    TokenExchangeClient, TwitterAuthConfig, TwitterAuthResult,
};

/// Where the current web login attempt stands.
///
/// A finished attempt goes straight back to `Idle`; its outcome lives in the
/// [`LoginAttempt`] handed out when it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    RequestTokenPending,
    AwaitingUserAuthorization,
    Exchanging,
}

/// The request token a callback has to match to complete the login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub oauth_token: String,
    pub callback_url: String,
}

type Completion = oneshot::Sender<Result<TwitterAuthResult>>;

struct Attempt {
    id: u64,
    phase: Phase,
    pending: Option<PendingRequest>,
    completion: Option<Completion>,
}

/// Resolves once with the outcome of a web login.
#[derive(Debug)]
pub struct LoginAttempt {
    receiver: oneshot::Receiver<Result<TwitterAuthResult>>,
}

impl Future for LoginAttempt {
    type Output = Result<TwitterAuthResult>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(AuthError::Unknown)))
    }
}

/// Drives OAuth 1.0a logins against the provider.
///
/// Construct one per application and share it. It holds at most one web
/// login attempt at a time; reverse authentication calls are independent of
/// it.
pub struct TwitterAuth<T = ReqwestTransport> {
    config: TwitterAuthConfig,
    client: TokenExchangeClient<T>,
    presenter: Arc<dyn LoginPresenter>,
    dispatcher: Arc<dyn Dispatcher>,
    account_store: Option<Arc<dyn AccountStore>>,
    account_picker: Option<Arc<dyn AccountPicker>>,
    attempt: Mutex<Attempt>,
}

impl TwitterAuth<ReqwestTransport> {
    /// Validates `config` and builds an instance sending requests through
    /// `reqwest`.
    pub fn new(config: TwitterAuthConfig, presenter: Arc<dyn LoginPresenter>) -> Result<Self> {
        let transport = ReqwestTransport::new().timeout(config.timeout);
        Self::with_transport(config, transport, presenter)
    }
}

impl<T> TwitterAuth<T>
where
    T: HttpTransport,
{
    pub fn with_transport(
        config: TwitterAuthConfig,
        transport: T,
        presenter: Arc<dyn LoginPresenter>,
    ) -> Result<Self> {
        config.validate()?;
        let client = TokenExchangeClient::from_config(&config, transport);
        Ok(TwitterAuth {
            config,
            client,
            presenter,
            dispatcher: Arc::new(InlineDispatcher),
            account_store: None,
            account_picker: None,
            attempt: Mutex::new(Attempt {
                id: 0,
                phase: Phase::Idle,
                pending: None,
                completion: None,
            }),
        })
    }

    /// Routes presenter calls and completions through `dispatcher`.
    pub fn with_dispatcher(self, dispatcher: Arc<dyn Dispatcher>) -> Self {
        TwitterAuth { dispatcher, ..self }
    }

    pub fn with_account_store(self, account_store: Arc<dyn AccountStore>) -> Self {
        TwitterAuth {
            account_store: Some(account_store),
            ..self
        }
    }

    pub fn with_account_picker(self, account_picker: Arc<dyn AccountPicker>) -> Self {
        TwitterAuth {
            account_picker: Some(account_picker),
            ..self
        }
    }

    pub fn config(&self) -> &TwitterAuthConfig {
        &self.config
    }

    pub fn client(&self) -> &TokenExchangeClient<T> {
        &self.client
    }

    pub fn phase(&self) -> Phase {
        self.lock_attempt().phase
    }

    pub fn pending_request(&self) -> Option<PendingRequest> {
        self.lock_attempt().pending.clone()
    }

    /// Starts a web login: obtains a request token and presents the
    /// authorization page for it.
    ///
    /// The returned [`LoginAttempt`] resolves when the attempt ends, either
    /// here (request token failure) or later through
    /// [`Self::process_auth_callback`], [`Self::report_web_load_failure`] or
    /// [`Self::cancel_login`].
    ///
    /// # Errors
    ///
    /// [`AuthError::AttemptInProgress`] if the previous attempt has not
    /// finished yet. That attempt is left untouched.
    pub async fn start_web_login(&self) -> Result<LoginAttempt> {
        let (sender, receiver) = oneshot::channel();
        let id = {
            let mut attempt = self.lock_attempt();
            if attempt.phase != Phase::Idle {
                return Err(AuthError::AttemptInProgress);
            }
            attempt.id += 1;
            attempt.phase = Phase::RequestTokenPending;
            attempt.completion = Some(sender);
            attempt.id
        };

        let callback_url = &self.config.callback_url;
        let authorization = match self.client.obtain_request_token(callback_url).await {
            Ok(token) => self
                .config
                .authorization_url(&token)
                .map(|url| (token, url)),
            Err(e) => Err(e),
        };

        match authorization {
            Ok((token, url)) => {
                {
                    let mut attempt = self.lock_attempt();
                    if attempt.id != id || attempt.phase != Phase::RequestTokenPending {
                        // cancelled while the token was on its way
                        return Ok(LoginAttempt { receiver });
                    }
                    attempt.phase = Phase::AwaitingUserAuthorization;
                    attempt.pending = Some(PendingRequest {
                        oauth_token: token,
                        callback_url: callback_url.clone(),
                    });
                }
                tracing::debug!(%url, "presenting authorization page");
                let presenter = Arc::clone(&self.presenter);
                self.dispatcher
                    .dispatch(Box::new(move || presenter.present(&url)));
            }
            Err(e) => self.complete(id, Err(e)),
        }
        Ok(LoginAttempt { receiver })
    }

    /// Feeds a deep link received from outside into the pending attempt.
    ///
    /// The link must contain the configured callback and carry the pending
    /// request token, otherwise the attempt fails with
    /// [`AuthError::WrongCallback`] without contacting the network.
    pub async fn process_auth_callback(&self, callback: &str) {
        let (id, redirection) = {
            let mut attempt = self.lock_attempt();
            if attempt.phase != Phase::AwaitingUserAuthorization {
                tracing::warn!(phase = ?attempt.phase, "ignoring callback, no login is awaiting authorization");
                return;
            }
            let id = attempt.id;
            let expected = attempt.pending.as_ref().map(|p| p.oauth_token.as_str());
            let redirection = if callback.contains(self.config.callback_url.as_str()) {
                RedirectionResult::from_callback_url(callback)
                    .ok()
                    .filter(|r| Some(r.oauth_token.as_str()) == expected)
            } else {
                None
            };
            match redirection {
                Some(redirection) => {
                    attempt.phase = Phase::Exchanging;
                    (id, redirection)
                }
                None => {
                    drop(attempt);
                    tracing::warn!("callback does not match the pending request");
                    self.complete(id, Err(AuthError::WrongCallback));
                    return;
                }
            }
        };

        let outcome = self.client.obtain_access_token(&redirection).await;
        if !self.is_current(id, Phase::Exchanging) {
            tracing::debug!("login ended during the token exchange, discarding its result");
            return;
        }
        let outcome = match outcome {
            Ok(result) if self.config.save_credentials => self.save_account(result).await,
            outcome => outcome,
        };
        self.complete(id, outcome);
    }

    /// Ends the pending attempt because the authorization page failed to load.
    pub fn report_web_load_failure(&self) {
        let id = {
            let attempt = self.lock_attempt();
            if attempt.phase != Phase::AwaitingUserAuthorization {
                return;
            }
            attempt.id
        };
        self.complete(id, Err(AuthError::UnableToLoadWeb));
    }

    /// Ends the current attempt on behalf of the user. A late response to
    /// the abandoned attempt is discarded.
    pub fn cancel_login(&self) {
        let id = self.lock_attempt().id;
        self.complete(id, Err(AuthError::UserCancelled));
    }

    /// Reverse authentication with an account the caller already holds.
    ///
    /// The outcome is handed over through the dispatcher.
    pub async fn execute_reverse_auth(
        &self,
        account: &dyn NativeAccount,
    ) -> Result<TwitterAuthResult> {
        let outcome = self.client.execute_reverse_auth(account).await;
        self.deliver(outcome).await
    }

    /// Asks for access to the platform accounts, lets the user pick one and
    /// runs reverse authentication with it.
    ///
    /// The picker is shown and the outcome handed over through the
    /// dispatcher.
    pub async fn execute_reverse_auth_with_available_accounts(
        &self,
    ) -> Result<TwitterAuthResult> {
        let outcome = self.reverse_auth_with_picked_account().await;
        self.deliver(outcome).await
    }

    async fn reverse_auth_with_picked_account(&self) -> Result<TwitterAuthResult> {
        let store = self
            .account_store
            .as_ref()
            .ok_or(AuthError::MissingConfiguration("account store"))?;
        let picker = self
            .account_picker
            .as_ref()
            .ok_or(AuthError::MissingConfiguration("account picker"))?;

        if !store.request_access().await {
            return Err(AuthError::NoAccessToAccounts);
        }
        let accounts = store.accounts().await;
        if accounts.is_empty() {
            return Err(AuthError::NoAvailableAccounts);
        }

        let (sender, receiver) = oneshot::channel::<Option<Arc<dyn NativeAccount>>>();
        let picker = Arc::clone(picker);
        self.dispatcher.dispatch(Box::new(move || {
            picker.pick(
                accounts,
                Box::new(move |picked: Option<Arc<dyn NativeAccount>>| {
                    let _ = sender.send(picked);
                }),
            )
        }));
        // a dropped choice is a dismissal too
        let account = receiver
            .await
            .ok()
            .flatten()
            .ok_or(AuthError::UserCancelled)?;

        tracing::debug!(account = account.username(), "running reverse auth");
        self.client.execute_reverse_auth(account.as_ref()).await
    }

    /// Passes `outcome` through the dispatcher back to the caller.
    async fn deliver(&self, outcome: Result<TwitterAuthResult>) -> Result<TwitterAuthResult> {
        let (sender, receiver) = oneshot::channel();
        self.dispatcher.dispatch(Box::new(move || {
            let _ = sender.send(outcome);
        }));
        receiver.await.unwrap_or(Err(AuthError::Unknown))
    }

    async fn save_account(&self, result: TwitterAuthResult) -> Result<TwitterAuthResult> {
        let store = match self.account_store {
            Some(ref store) => store,
            None => {
                tracing::warn!("saving credentials is enabled but no account store is set");
                return Err(AuthError::UnableToSaveAccount);
            }
        };
        match store.save_account(&result).await {
            Ok(()) => Ok(result),
            Err(e) => {
                tracing::warn!(error = %e, "could not save the new account");
                Err(AuthError::UnableToSaveAccount)
            }
        }
    }

    /// Finishes attempt `id` exactly once: clears the pending request, then
    /// dismisses the web view and delivers `outcome` on the dispatcher.
    fn complete(&self, id: u64, outcome: Result<TwitterAuthResult>) {
        let completion = {
            let mut attempt = self.lock_attempt();
            if attempt.id != id {
                return;
            }
            attempt.phase = Phase::Idle;
            attempt.pending = None;
            attempt.completion.take()
        };
        let completion = match completion {
            Some(completion) => completion,
            None => return,
        };

        if let Err(ref e) = outcome {
            tracing::debug!(error = %e, "web login failed");
        }
        let presenter = Arc::clone(&self.presenter);
        self.dispatcher.dispatch(Box::new(move || {
            presenter.dismiss();
            // the caller may have dropped its LoginAttempt
            let _ = completion.send(outcome);
        }));
    }

    fn is_current(&self, id: u64, phase: Phase) -> bool {
        let attempt = self.lock_attempt();
        attempt.id == id && attempt.phase == phase
    }

    fn lock_attempt(&self) -> MutexGuard<'_, Attempt> {
        self.attempt.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
