//! Interfaces to the platform pieces the login flow drives but does not own:
//! the browser view, native accounts, the account store, the account picker
//! and the UI-owned dispatch context.

use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::{TransportResult, TwitterAuthResult};

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Shows and hides the provider's authorization page.
///
/// Both calls are made through the configured [`Dispatcher`].
pub trait LoginPresenter: Send + Sync {
    fn present(&self, authorization_url: &Url);

    fn dismiss(&self);
}

/// An account held by the platform that can sign requests on its own.
#[async_trait]
pub trait NativeAccount: Send + Sync {
    fn username(&self) -> &str;

    /// POSTs `parameters` to `url`, signed with the account's credential.
    async fn perform_request(
        &self,
        url: &Url,
        parameters: &[(String, String)],
    ) -> TransportResult<Vec<u8>>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Asks the user for access to the stored accounts.
    async fn request_access(&self) -> bool;

    async fn accounts(&self) -> Vec<Arc<dyn NativeAccount>>;

    async fn save_account(&self, result: &TwitterAuthResult) -> Result<(), BoxError>;
}

/// Reports the account the user chose, `None` if the picker was dismissed.
pub type AccountChoice = Box<dyn FnOnce(Option<Arc<dyn NativeAccount>>) + Send + 'static>;

/// Lets the user choose one of several accounts.
///
/// Called through the configured [`Dispatcher`]. Dropping `choose` without
/// calling it counts as a dismissal.
pub trait AccountPicker: Send + Sync {
    fn pick(&self, accounts: Vec<Arc<dyn NativeAccount>>, choose: AccountChoice);
}

/// Runs work on the context that owns the UI.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, task: Box<dyn FnOnce() + Send + 'static>);
}

/// Runs every task immediately on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        task()
    }
}
