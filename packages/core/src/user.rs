//! The `User` node.

use serde::{Deserialize, Serialize};

use crate::album::Album;
use crate::authorizer::Authorizer;
use crate::client::GraphClient;
use crate::error::GraphError;
use crate::node::{Node, NodeFields, NodeKind, NodeType};
use crate::transport::Method;

/// Alias the Graph API resolves to the user owning the access token.
pub const ME: &str = "me";

/// Fields requested when fetching the current user.
const ME_FIELDS: &str = "name,email";

/// A Graph API user. Users are never connected to other nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub node: NodeFields,

    /// Full name.
    #[serde(default)]
    pub name: String,

    /// Primary email; only present with the `email` permission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    /// A user carrying only an id, e.g. to list its albums without fetching
    /// the profile first.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            node: NodeFields {
                id: id.into(),
                ..NodeFields::default()
            },
            ..Self::default()
        }
    }

    /// Fetch the user with `id`.
    pub fn from_id(
        client: &GraphClient,
        authorizer: &dyn Authorizer,
        id: &str,
    ) -> Result<Self, GraphError> {
        client.fetch(authorizer, id)
    }

    /// Fetch the user that owns the authorizer's access token.
    pub fn get_me(client: &GraphClient, authorizer: &dyn Authorizer) -> Result<Self, GraphError> {
        let mut call = client.new_call(authorizer);
        call.set_method(Method::Get)
            .set_function(ME)
            .add_param("fields", ME_FIELDS);
        call.send()?;

        Ok(serde_json::from_slice(call.payload().unwrap_or_default())?)
    }

    /// This user's albums, in server order.
    pub fn albums(
        &self,
        client: &GraphClient,
        authorizer: &dyn Authorizer,
    ) -> Result<Vec<Album>, GraphError> {
        client.list_connected::<Album>(self, authorizer)
    }
}

impl Node for User {
    fn kind(&self) -> NodeKind {
        NodeKind::User
    }

    fn fields(&self) -> &NodeFields {
        &self.node
    }

    fn fields_mut(&mut self) -> &mut NodeFields {
        &mut self.node
    }
}

impl NodeType for User {
    const KIND: NodeKind = NodeKind::User;
}
