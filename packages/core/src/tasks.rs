//! Async façade over the blocking operations.
//!
//! Each `*_async` method runs its synchronous counterpart on Tokio's blocking
//! pool and resolves once with the result. Cancelling the token resolves the
//! future with [`GraphError::Cancelled`] straight away; a request already on
//! the wire is left to finish and its result is dropped.
//!
//! Must be awaited inside a Tokio runtime.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::album::Album;
use crate::authorizer::Authorizer;
use crate::client::GraphClient;
use crate::error::GraphError;
use crate::node::{Node, NodeType};
use crate::photo::Photo;
use crate::user::User;

/// Run `op` on the blocking pool, racing it against `cancel`.
pub async fn run_blocking<T, F>(cancel: CancellationToken, op: F) -> Result<T, GraphError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, GraphError> + Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(GraphError::Cancelled);
    }

    let handle = tokio::task::spawn_blocking(op);
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GraphError::Cancelled),
        joined = handle => {
            if cancel.is_cancelled() {
                return Err(GraphError::Cancelled);
            }
            joined.map_err(|e| GraphError::Transport(format!("worker task failed: {e}")))?
        }
    }
}

impl GraphClient {
    pub async fn fetch_async<N: NodeType>(
        &self,
        authorizer: Arc<dyn Authorizer>,
        id: &str,
        cancel: CancellationToken,
    ) -> Result<N, GraphError> {
        let client = self.clone();
        let id = id.to_string();
        run_blocking(cancel, move || client.fetch::<N>(authorizer.as_ref(), &id)).await
    }

    /// Async [`list_connected`](GraphClient::list_connected). The parent is
    /// cloned onto the worker.
    pub async fn list_connected_async<C, P>(
        &self,
        parent: &P,
        authorizer: Arc<dyn Authorizer>,
        cancel: CancellationToken,
    ) -> Result<Vec<C>, GraphError>
    where
        C: NodeType,
        P: Node + Clone + 'static,
    {
        let client = self.clone();
        let parent = parent.clone();
        run_blocking(cancel, move || {
            client.list_connected::<C>(&parent, authorizer.as_ref())
        })
        .await
    }
}

impl User {
    pub async fn get_me_async(
        client: &GraphClient,
        authorizer: Arc<dyn Authorizer>,
        cancel: CancellationToken,
    ) -> Result<User, GraphError> {
        let client = client.clone();
        run_blocking(cancel, move || User::get_me(&client, authorizer.as_ref())).await
    }

    pub async fn albums_async(
        &self,
        client: &GraphClient,
        authorizer: Arc<dyn Authorizer>,
        cancel: CancellationToken,
    ) -> Result<Vec<Album>, GraphError> {
        client.list_connected_async(self, authorizer, cancel).await
    }
}

impl Album {
    pub async fn photos_async(
        &self,
        client: &GraphClient,
        authorizer: Arc<dyn Authorizer>,
        cancel: CancellationToken,
    ) -> Result<Vec<Photo>, GraphError> {
        client.list_connected_async(self, authorizer, cancel).await
    }
}
