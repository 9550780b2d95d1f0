//! The node/connection model.
//!
//! Every addressable entity of the Graph API is a node with a string id.
//! A node kind may declare *connections*: the parent kinds it can be listed
//! under or appended to, and the path segment naming that edge on the wire.
//!
//! | Item | Role |
//! |------|------|
//! | [`NodeKind`] | Closed set of kinds known to this crate |
//! | [`NodeFields`] | Attributes every node carries |
//! | [`Node`] | Object-safe view of any node |
//! | [`NodeType`] | Kind-level operations of a concrete node type |
//! | [`Connectable`] | Instance-level half of the connection capability |
//! | [`Connections`] | Static parent-kind → path-segment table |
//!
//! The generic operations ([`GraphClient::fetch`],
//! [`GraphClient::list_connected`], [`GraphClient::append_connected`]) are
//! defined here and drive the transport facade.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::authorizer::Authorizer;
use crate::client::GraphClient;
use crate::error::{GraphError, NotConnectable};
use crate::transport::Method;
use crate::wire::{first_string_member, ListEnvelope};

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// The static category of a node.
///
/// Serialises as a lowercase string (e.g. `"album"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    User,
    Album,
    Photo,
}

impl NodeKind {
    pub const ALL: [NodeKind; 3] = [NodeKind::User, NodeKind::Album, NodeKind::Photo];

    /// The connection table of this kind, or `None` if the kind has no
    /// connectable capability.
    pub fn connections(self) -> Option<&'static Connections> {
        match self {
            NodeKind::User => None,
            NodeKind::Album => Some(&crate::album::CONNECTIONS),
            NodeKind::Photo => Some(&crate::photo::CONNECTIONS),
        }
    }

    /// Path segment under which nodes of this kind hang off a `parent` node.
    pub fn connection_path(self, parent: NodeKind) -> Result<&'static str, NotConnectable> {
        let connections = self
            .connections()
            .ok_or(NotConnectable::NoCapability(self))?;
        connections
            .path_to(parent)
            .ok_or(NotConnectable::WrongParent {
                child: self,
                parent,
            })
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::User => write!(f, "user"),
            NodeKind::Album => write!(f, "album"),
            NodeKind::Photo => write!(f, "photo"),
        }
    }
}

/// Parses a [`NodeKind`] from its lowercase name.
impl std::str::FromStr for NodeKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(NodeKind::User),
            "album" => Ok(NodeKind::Album),
            "photo" => Ok(NodeKind::Photo),
            _ => Err(format!(
                "unknown node kind {s:?}; expected one of: user, album, photo"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

/// Immutable parent-kind → path-segment table.
///
/// The parents listed are the only ones a kind may be connected to.
#[derive(Debug, PartialEq, Eq)]
pub struct Connections(&'static [(NodeKind, &'static str)]);

impl Connections {
    pub const fn new(edges: &'static [(NodeKind, &'static str)]) -> Self {
        Self(edges)
    }

    pub fn path_to(&self, parent: NodeKind) -> Option<&'static str> {
        self.0
            .iter()
            .find(|(kind, _)| *kind == parent)
            .map(|(_, path)| *path)
    }

    pub fn is_connectable_to(&self, parent: NodeKind) -> bool {
        self.path_to(parent).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeKind, &'static str)> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Body parameters posted when appending a node. Keys are unique.
pub type PostParams = BTreeMap<&'static str, String>;

// ---------------------------------------------------------------------------
// NodeFields
// ---------------------------------------------------------------------------

/// Attributes shared by every node. Flattened into each concrete type.
///
/// `id` is required on the wire; the other fields are optional and absent by
/// default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFields {
    /// Identifier assigned by the service. Empty until the node is appended.
    pub id: String,

    /// URL of the node on the web.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// When the node was first published (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,

    /// When the node was last updated (ISO 8601).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_time: Option<String>,
}

impl NodeFields {
    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        self.created_time.as_deref().and_then(parse_graph_time)
    }

    pub fn updated_at(&self) -> Option<DateTime<FixedOffset>> {
        self.updated_time.as_deref().and_then(parse_graph_time)
    }
}

// The Graph API writes offsets without a colon (`+0000`).
fn parse_graph_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Any node, independent of its concrete type.
pub trait Node: fmt::Debug + Send + Sync {
    fn kind(&self) -> NodeKind;

    fn fields(&self) -> &NodeFields;

    fn fields_mut(&mut self) -> &mut NodeFields;

    /// The node viewed through its connection capability, if it has one.
    fn as_connectable(&self) -> Option<&dyn Connectable> {
        None
    }

    fn id(&self) -> &str {
        &self.fields().id
    }

    fn link(&self) -> Option<&str> {
        self.fields().link.as_deref()
    }

    fn created_time(&self) -> Option<&str> {
        self.fields().created_time.as_deref()
    }

    fn updated_time(&self) -> Option<&str> {
        self.fields().updated_time.as_deref()
    }

    /// Set the id. Meant for [`GraphClient::append_connected`]; ids assigned
    /// by the service are not changed afterwards.
    fn set_id(&mut self, id: String) {
        self.fields_mut().id = id;
    }
}

/// Kind-level behaviour of a concrete node type.
pub trait NodeType: Node + Serialize + DeserializeOwned + Sized + 'static {
    const KIND: NodeKind;

    /// Decode the response of a connection listing into nodes of this type.
    ///
    /// The default reads the `{ "data": [ … ] }` envelope and keeps server
    /// order. Any malformed element fails the whole list.
    fn parse_connected_data(payload: &[u8]) -> Result<Vec<Self>, GraphError> {
        let envelope: ListEnvelope<Self> = serde_json::from_slice(payload)?;
        Ok(envelope.data)
    }
}

/// A node that can be appended to a parent node.
pub trait Connectable: Node {
    /// The kind's connection table.
    fn connections(&self) -> &'static Connections;

    /// Form parameters that create this node under a parent of kind `parent`.
    /// Never includes credentials.
    fn post_params(&self, parent: NodeKind) -> PostParams;

    fn is_connectable_to(&self, parent: NodeKind) -> bool {
        self.connections().is_connectable_to(parent)
    }
}

// ---------------------------------------------------------------------------
// Generic operations
// ---------------------------------------------------------------------------

impl GraphClient {
    /// Retrieve the node with `id` as an `N`.
    pub fn fetch<N: NodeType>(&self, authorizer: &dyn Authorizer, id: &str) -> Result<N, GraphError> {
        if id.is_empty() {
            return Err(GraphError::InvalidArgument("node id must not be empty".into()));
        }

        let mut call = self.new_call(authorizer);
        call.set_method(Method::Get).set_function(id);
        call.send()?;

        Ok(serde_json::from_slice(call.payload().unwrap_or_default())?)
    }

    /// Retrieve the nodes of type `C` connected to `parent`.
    ///
    /// Fails with [`GraphError::NotConnectable`] before any I/O if `C` cannot
    /// hang off a node of `parent`'s kind.
    pub fn list_connected<C: NodeType>(
        &self,
        parent: &dyn Node,
        authorizer: &dyn Authorizer,
    ) -> Result<Vec<C>, GraphError> {
        let path = C::KIND.connection_path(parent.kind())?;
        let function = connection_function(parent, path)?;

        let mut call = self.new_call(authorizer);
        call.set_method(Method::Get).set_function(function);
        call.send()?;

        C::parse_connected_data(call.payload().unwrap_or_default())
    }

    /// Create `child` under `parent` and store the id the service assigns.
    ///
    /// Fails with [`GraphError::NotConnectable`] before any I/O if `child`
    /// has no connection capability or cannot hang off `parent`'s kind.
    pub fn append_connected(
        &self,
        parent: &dyn Node,
        child: &mut dyn Node,
        authorizer: &dyn Authorizer,
    ) -> Result<(), GraphError> {
        let connectable = child
            .as_connectable()
            .ok_or(NotConnectable::NoCapability(child.kind()))?;
        let path = connectable
            .connections()
            .path_to(parent.kind())
            .ok_or(NotConnectable::WrongParent {
                child: child.kind(),
                parent: parent.kind(),
            })?;
        let params = connectable.post_params(parent.kind());
        let function = connection_function(parent, path)?;

        let mut call = self.new_call(authorizer);
        call.set_method(Method::Post).set_function(function);
        for (key, value) in params {
            call.add_param(key, value);
        }
        call.send()?;

        let id = first_string_member(call.payload().unwrap_or_default())?;
        child.set_id(id);
        Ok(())
    }
}

fn connection_function(parent: &dyn Node, path: &str) -> Result<String, GraphError> {
    if parent.id().is_empty() {
        return Err(GraphError::InvalidArgument(format!(
            "parent {} has no id yet",
            parent.kind()
        )));
    }
    Ok(format!("{}/{}", parent.id(), path))
}

// --- tests -------------------------------------------------------------------
