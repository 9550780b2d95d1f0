//! Request authorization.
//!
//! An [`Authorizer`] stamps credentials onto outbound requests and, where
//! the credential source allows it, refreshes them.
//!
//! # Implementations
//!
//! | Type | Credential source |
//! |------|-------------------|
//! | [`SimpleAuthorizer`] | A literal access token; never refreshes |
//! | [`AccountAuthorizer`] | An external OAuth2 [`AccountProvider`] |
//!
//! Both keep their token behind a mutex, so a single authorizer can be shared
//! by threads issuing concurrent calls.

pub mod account;
pub mod simple;

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::client::Call;
use crate::error::GraphError;
use crate::transport::HttpRequest;

pub use account::{AccountAuthorizer, AccountProvider, ProviderError};
pub use simple::SimpleAuthorizer;

/// Name of the credential parameter on the wire.
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Strategy that attaches credentials to outbound requests.
pub trait Authorizer: Send + Sync {
    /// Add credentials to a [`Call`]. Invoked once by
    /// [`GraphClient::new_call`](crate::GraphClient::new_call).
    fn process_call(&self, call: &mut Call<'_>);

    /// Add credentials to a raw request that bypasses [`Call`], by appending
    /// them to its query string.
    fn process_message(&self, message: &mut HttpRequest);

    /// Replace the cached credential with a fresh one.
    ///
    /// Returns `Ok(false)` when this authorizer has no way to refresh.
    fn refresh_authorization(&self, cancel: &CancellationToken) -> Result<bool, GraphError>;
}

pub(crate) fn append_token(message: &mut HttpRequest, token: &str) {
    message
        .url
        .query_pairs_mut()
        .append_pair(ACCESS_TOKEN_PARAM, token);
}

// A panic while holding the token lock cannot leave it half-written.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
