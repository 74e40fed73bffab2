//! In-memory stand-ins for the transport and platform collaborators.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use url::Url;

use tokio::sync::Notify;

use crate::{
    platform::BoxError, AccountChoice, AccountPicker, AccountStore, Dispatcher, HttpTransport,
    LoginPresenter, NativeAccount, TransportError, TransportResult, TwitterAuthResult,
    WireRequest,
};

/// Replies to requests with scripted bodies, in order.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    responses: Mutex<VecDeque<TransportResult<Vec<u8>>>>,
    requests: Mutex<Vec<WireRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    pub(crate) fn respond(self, body: &str) -> Self {
        self.push(Ok(body.as_bytes().to_vec()))
    }

    pub(crate) fn fail(self, reason: &str) -> Self {
        self.push(Err(TransportError::Other(reason.to_string())))
    }

    fn push(self, response: TransportResult<Vec<u8>>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub(crate) fn requests(&self) -> Vec<WireRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: WireRequest) -> TransportResult<Vec<u8>> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response".to_string())))
    }
}

/// A [`ScriptedTransport`] that holds every call from the `hold_from`-th on
/// until [`GatedTransport::release`].
pub(crate) struct GatedTransport {
    inner: ScriptedTransport,
    hold_from: usize,
    reached: Notify,
    released: Notify,
}

impl GatedTransport {
    pub(crate) fn new(inner: ScriptedTransport, hold_from: usize) -> Self {
        GatedTransport {
            inner,
            hold_from,
            reached: Notify::new(),
            released: Notify::new(),
        }
    }

    /// Waits until a call is being held.
    pub(crate) async fn reached(&self) {
        self.reached.notified().await
    }

    pub(crate) fn release(&self) {
        self.released.notify_one()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.inner.call_count()
    }
}

#[async_trait]
impl HttpTransport for GatedTransport {
    async fn execute(&self, request: WireRequest) -> TransportResult<Vec<u8>> {
        if self.inner.call_count() >= self.hold_from {
            self.reached.notify_one();
            self.released.notified().await;
        }
        self.inner.execute(request).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PresenterEvent {
    Present(String),
    Dismiss,
}

#[derive(Default)]
pub(crate) struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    pub(crate) fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl LoginPresenter for RecordingPresenter {
    fn present(&self, authorization_url: &Url) {
        self.events
            .lock()
            .unwrap()
            .push(PresenterEvent::Present(authorization_url.to_string()));
    }

    fn dismiss(&self) {
        self.events.lock().unwrap().push(PresenterEvent::Dismiss);
    }
}

/// Counts dispatched tasks and runs them inline.
#[derive(Default)]
pub(crate) struct CountingDispatcher {
    dispatched: Mutex<usize>,
}

impl CountingDispatcher {
    pub(crate) fn dispatched(&self) -> usize {
        *self.dispatched.lock().unwrap()
    }
}

impl Dispatcher for CountingDispatcher {
    fn dispatch(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        *self.dispatched.lock().unwrap() += 1;
        task()
    }
}

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Holds dispatched tasks until [`QueueDispatcher::drain`].
#[derive(Default)]
pub(crate) struct QueueDispatcher {
    tasks: Mutex<Vec<Task>>,
}

impl QueueDispatcher {
    pub(crate) fn queued(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Runs the queued tasks, including any they queue in turn.
    pub(crate) fn drain(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.tasks.lock().unwrap());
            if tasks.is_empty() {
                return;
            }
            for task in tasks {
                task();
            }
        }
    }
}

impl Dispatcher for QueueDispatcher {
    fn dispatch(&self, task: Task) {
        self.tasks.lock().unwrap().push(task);
    }
}

pub(crate) struct FakeAccount {
    username: String,
    response: Mutex<Option<TransportResult<Vec<u8>>>>,
    requests: Mutex<Vec<(Url, Vec<(String, String)>)>>,
}

impl FakeAccount {
    pub(crate) fn new(username: &str) -> Self {
        FakeAccount {
            username: username.to_string(),
            response: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn respond(self, body: &str) -> Self {
        *self.response.lock().unwrap() = Some(Ok(body.as_bytes().to_vec()));
        self
    }

    pub(crate) fn fail(self, reason: &str) -> Self {
        *self.response.lock().unwrap() = Some(Err(TransportError::Other(reason.to_string())));
        self
    }

    pub(crate) fn requests(&self) -> Vec<(Url, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NativeAccount for FakeAccount {
    fn username(&self) -> &str {
        &self.username
    }

    async fn perform_request(
        &self,
        url: &Url,
        parameters: &[(String, String)],
    ) -> TransportResult<Vec<u8>> {
        self.requests
            .lock()
            .unwrap()
            .push((url.clone(), parameters.to_vec()));
        self.response
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response".to_string())))
    }
}

pub(crate) struct MemoryAccountStore {
    access: bool,
    accounts: Vec<Arc<dyn NativeAccount>>,
    save_succeeds: bool,
    saved: Mutex<Vec<TwitterAuthResult>>,
}

impl MemoryAccountStore {
    pub(crate) fn new(access: bool, accounts: Vec<Arc<dyn NativeAccount>>) -> Self {
        MemoryAccountStore {
            access,
            accounts,
            save_succeeds: true,
            saved: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_saves(self) -> Self {
        MemoryAccountStore {
            save_succeeds: false,
            ..self
        }
    }

    pub(crate) fn saved(&self) -> Vec<TwitterAuthResult> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn request_access(&self) -> bool {
        self.access
    }

    async fn accounts(&self) -> Vec<Arc<dyn NativeAccount>> {
        self.accounts.clone()
    }

    async fn save_account(&self, result: &TwitterAuthResult) -> Result<(), BoxError> {
        if !self.save_succeeds {
            return Err("account store is read-only".into());
        }
        self.saved.lock().unwrap().push(result.clone());
        Ok(())
    }
}

/// Picks the account at a fixed index, or cancels.
pub(crate) struct ScriptedPicker(pub(crate) Option<usize>);

impl AccountPicker for ScriptedPicker {
    fn pick(&self, accounts: Vec<Arc<dyn NativeAccount>>, choose: AccountChoice) {
        choose(self.0.and_then(|i| accounts.get(i).cloned()))
    }
}
