//! Error types for every fallible operation in the crate.
//!
//! All operations return [`GraphError`]. Nothing is retried internally; the
//! caller sees exactly one typed error per failed operation.

use crate::node::NodeKind;

/// Why a node kind cannot take part in a requested connection.
///
/// Always detected before any network I/O.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotConnectable {
    /// The kind declares no connections at all.
    #[error("the given node type ({0}) doesn't implement the connectable capability")]
    NoCapability(NodeKind),

    /// The kind is connectable, but not to a parent of this kind.
    #[error("the given node type ({child}) can't connect with a {parent} node")]
    WrongParent {
        /// The kind being listed or appended.
        child: NodeKind,
        /// The kind of the node it was asked to connect to.
        parent: NodeKind,
    },
}

/// Errors surfaced by the client.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The HTTP request could not be completed (DNS, TLS, connection, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A transport other than the built-in one failed, or the worker running
    /// a blocking operation died.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The Graph API answered with a non-2xx status.
    #[error("remote returned status {status}: {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// The `error.message` of the Graph error envelope, or the raw body.
        message: String,
    },

    /// The payload was not valid JSON or did not have the expected shape.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The requested kind cannot be connected to the given parent.
    #[error(transparent)]
    NotConnectable(#[from] NotConnectable),

    /// The authorizer could not obtain a fresh credential.
    #[error("authorization failed: {0}")]
    Authorization(String),

    /// The operation was cancelled before it completed.
    #[error("operation was cancelled")]
    Cancelled,

    /// A precondition on the arguments was violated (e.g. an empty node id).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for GraphError {
    fn from(e: serde_json::Error) -> Self {
        GraphError::Parse(e.to_string())
    }
}
