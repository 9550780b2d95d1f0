//! Authorizer backed by a desktop online-accounts service.
//!
//! The host owns the account (OAuth2 flow, keyring, consent UI) and exposes
//! it through [`AccountProvider`]. [`AccountAuthorizer`] caches the token the
//! provider hands out and asks for a new one on
//! [`refresh_authorization`](Authorizer::refresh_authorization).

use std::fmt;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{append_token, lock, Authorizer, ACCESS_TOKEN_PARAM};
use crate::client::Call;
use crate::error::GraphError;
use crate::transport::HttpRequest;

/// A failure reported by an [`AccountProvider`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

/// An OAuth2-based account managed outside this crate.
pub trait AccountProvider: Send + Sync {
    /// Make sure the account's credentials are valid, re-authenticating the
    /// user if the provider needs to.
    fn ensure_credentials(&self, cancel: &CancellationToken) -> Result<(), ProviderError>;

    /// Hand out a currently valid access token.
    fn access_token(&self, cancel: &CancellationToken) -> Result<String, ProviderError>;
}

/// Authorizer that pulls its token from an [`AccountProvider`].
///
/// Starts without a token: call
/// [`refresh_authorization`](Authorizer::refresh_authorization) before the
/// first request. While no token is cached, calls go out without credentials.
pub struct AccountAuthorizer<P> {
    provider: P,
    access_token: Mutex<Option<String>>,
}

impl<P: AccountProvider> AccountAuthorizer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            access_token: Mutex::new(None),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The cached token, if the last refresh succeeded.
    pub fn access_token(&self) -> Option<String> {
        lock(&self.access_token).clone()
    }
}

impl<P: AccountProvider> Authorizer for AccountAuthorizer<P> {
    fn process_call(&self, call: &mut Call<'_>) {
        let token = lock(&self.access_token);
        if let Some(token) = token.as_deref() {
            call.add_param(ACCESS_TOKEN_PARAM, token);
        }
    }

    fn process_message(&self, message: &mut HttpRequest) {
        let token = lock(&self.access_token);
        if let Some(token) = token.as_deref() {
            append_token(message, token);
        }
    }

    /// The cached token is dropped first and stays empty unless both provider
    /// steps succeed.
    fn refresh_authorization(&self, cancel: &CancellationToken) -> Result<bool, GraphError> {
        let mut token = lock(&self.access_token);
        *token = None;

        if cancel.is_cancelled() {
            return Err(GraphError::Cancelled);
        }
        self.provider.ensure_credentials(cancel).map_err(|e| {
            warn!("account authorizer: ensuring credentials failed: {e}");
            GraphError::Authorization(format!("could not ensure account credentials: {e}"))
        })?;

        if cancel.is_cancelled() {
            return Err(GraphError::Cancelled);
        }
        let fresh = self.provider.access_token(cancel).map_err(|e| {
            warn!("account authorizer: fetching access token failed: {e}");
            GraphError::Authorization(format!("could not get an access token: {e}"))
        })?;

        info!("account authorizer: access token refreshed");
        *token = Some(fresh);
        Ok(true)
    }
}

impl<P> fmt::Debug for AccountAuthorizer<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let has_token = lock(&self.access_token).is_some();
        f.debug_struct("AccountAuthorizer")
            .field("has_token", &has_token)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{client_with, StubTransport};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Hands out queued tokens; fails once the queue is empty.
    struct QueuedProvider {
        tokens: Mutex<VecDeque<&'static str>>,
        credentials_ok: bool,
        ensure_calls: AtomicUsize,
    }

    impl QueuedProvider {
        fn new(tokens: &[&'static str]) -> Self {
            Self {
                tokens: Mutex::new(tokens.iter().copied().collect()),
                credentials_ok: true,
                ensure_calls: AtomicUsize::new(0),
            }
        }
    }

    impl AccountProvider for QueuedProvider {
        fn ensure_credentials(&self, _cancel: &CancellationToken) -> Result<(), ProviderError> {
            self.ensure_calls.fetch_add(1, Ordering::SeqCst);
            if self.credentials_ok {
                Ok(())
            } else {
                Err(ProviderError("account needs attention".into()))
            }
        }

        fn access_token(&self, _cancel: &CancellationToken) -> Result<String, ProviderError> {
            self.tokens
                .lock()
                .unwrap()
                .pop_front()
                .map(str::to_string)
                .ok_or_else(|| ProviderError("no token".into()))
        }
    }

    #[test]
    fn second_refresh_wins() {
        let (client, _) = client_with(StubTransport::new());
        let auth = AccountAuthorizer::new(QueuedProvider::new(&["T1", "T2"]));
        let cancel = CancellationToken::new();

        assert!(auth.refresh_authorization(&cancel).unwrap());
        assert!(auth.refresh_authorization(&cancel).unwrap());

        let call = client.new_call(&auth);
        assert_eq!(call.param("access_token"), Some("T2"));
        assert_eq!(auth.provider().ensure_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn no_token_before_first_refresh() {
        let (client, _) = client_with(StubTransport::new());
        let auth = AccountAuthorizer::new(QueuedProvider::new(&["T1"]));
        assert!(client.new_call(&auth).params().is_empty());
    }

    #[test]
    fn failed_token_fetch_clears_cache() {
        let auth = AccountAuthorizer::new(QueuedProvider::new(&["T1"]));
        let cancel = CancellationToken::new();
        auth.refresh_authorization(&cancel).unwrap();
        assert_eq!(auth.access_token().as_deref(), Some("T1"));

        let err = auth.refresh_authorization(&cancel).unwrap_err();
        assert!(matches!(err, GraphError::Authorization(_)));
        assert_eq!(auth.access_token(), None);
    }

    #[test]
    fn failed_credentials_skip_token_fetch() {
        let mut provider = QueuedProvider::new(&["T1"]);
        provider.credentials_ok = false;
        let auth = AccountAuthorizer::new(provider);

        let err = auth
            .refresh_authorization(&CancellationToken::new())
            .unwrap_err();
        assert!(err.to_string().contains("account needs attention"));
        assert_eq!(auth.provider().tokens.lock().unwrap().len(), 1);
    }

    #[test]
    fn cancelled_refresh_leaves_no_token() {
        let auth = AccountAuthorizer::new(QueuedProvider::new(&["T1", "T2"]));
        auth.refresh_authorization(&CancellationToken::new()).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            auth.refresh_authorization(&cancel),
            Err(GraphError::Cancelled)
        ));
        assert_eq!(auth.access_token(), None);
    }

    #[test]
    fn shared_across_threads() {
        let (client, _) = client_with(StubTransport::new());
        let auth = Arc::new(AccountAuthorizer::new(QueuedProvider::new(&["T1"])));
        auth.refresh_authorization(&CancellationToken::new()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let auth = Arc::clone(&auth);
                let client = client.clone();
                std::thread::spawn(move || {
                    client.new_call(auth.as_ref()).param("access_token").map(str::to_string)
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().as_deref(), Some("T1"));
        }
    }
}
