//! The `Album` node.

use serde::{Deserialize, Serialize};

use crate::authorizer::Authorizer;
use crate::client::GraphClient;
use crate::error::GraphError;
use crate::node::{Connectable, Connections, Node, NodeFields, NodeKind, NodeType, PostParams};
use crate::photo::Photo;

/// Albums hang off users under `albums`.
pub static CONNECTIONS: Connections = Connections::new(&[(NodeKind::User, "albums")]);

/// A photo album.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    #[serde(flatten)]
    pub node: NodeFields,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Id of the photo used as the album cover.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_photo: Option<String>,

    /// Number of photos in the album.
    #[serde(default)]
    pub count: u32,
}

impl Album {
    /// A new, unsaved album. Append it to a user to create it.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            node: NodeFields {
                id: id.into(),
                ..NodeFields::default()
            },
            ..Self::default()
        }
    }

    /// Fetch the album with `id`.
    pub fn from_id(
        client: &GraphClient,
        authorizer: &dyn Authorizer,
        id: &str,
    ) -> Result<Self, GraphError> {
        client.fetch(authorizer, id)
    }

    /// Photos in this album, in server order.
    pub fn photos(
        &self,
        client: &GraphClient,
        authorizer: &dyn Authorizer,
    ) -> Result<Vec<Photo>, GraphError> {
        client.list_connected::<Photo>(self, authorizer)
    }
}

impl Node for Album {
    fn kind(&self) -> NodeKind {
        NodeKind::Album
    }

    fn fields(&self) -> &NodeFields {
        &self.node
    }

    fn fields_mut(&mut self) -> &mut NodeFields {
        &mut self.node
    }

    fn as_connectable(&self) -> Option<&dyn Connectable> {
        Some(self)
    }
}

impl NodeType for Album {
    const KIND: NodeKind = NodeKind::Album;
}

impl Connectable for Album {
    fn connections(&self) -> &'static Connections {
        &CONNECTIONS
    }

    /// `name`, plus `message` when a description is set.
    fn post_params(&self, _parent: NodeKind) -> PostParams {
        let mut params = PostParams::new();
        params.insert("name", self.name.clone());
        if let Some(description) = &self.description {
            params.insert("message", description.clone());
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connects_only_to_users() {
        let album = Album::new("Trip");
        assert!(album.is_connectable_to(NodeKind::User));
        assert!(!album.is_connectable_to(NodeKind::Album));
        assert!(!album.is_connectable_to(NodeKind::Photo));
        assert_eq!(CONNECTIONS.len(), 1);
    }

    #[test]
    fn post_params_without_description() {
        let params = Album::new("Trip").post_params(NodeKind::User);
        assert_eq!(params.len(), 1);
        assert_eq!(params["name"], "Trip");
    }

    #[test]
    fn post_params_with_description() {
        let params = Album::new("Trip")
            .with_description("Lisbon, 2012")
            .post_params(NodeKind::User);
        assert_eq!(params.len(), 2);
        assert_eq!(params["message"], "Lisbon, 2012");
    }

    #[test]
    fn decodes_graph_album() {
        let album: Album = serde_json::from_str(
            r#"{
                "id": "A1",
                "name": "Holiday",
                "link": "https://www.facebook.com/album.php?fbid=A1",
                "cover_photo": "P1",
                "count": 12,
                "created_time": "2012-05-01T10:00:00+0000",
                "updated_time": "2012-05-02T10:00:00+0000",
                "privacy": "everyone"
            }"#,
        )
        .unwrap();
        assert_eq!(album.id(), "A1");
        assert_eq!(album.cover_photo.as_deref(), Some("P1"));
        assert_eq!(album.count, 12);
        assert_eq!(album.description, None);
        assert!(album.node.updated_at().unwrap() > album.node.created_at().unwrap());
    }

    #[test]
    fn missing_optional_fields_default() {
        let album: Album = serde_json::from_str(r#"{"id":"A1"}"#).unwrap();
        assert_eq!(album.name, "");
        assert_eq!(album.count, 0);
        assert_eq!(album.cover_photo, None);
    }

    #[test]
    fn round_trip_keeps_every_attribute() {
        let original = Album {
            node: NodeFields {
                id: "A1".into(),
                link: Some("https://www.facebook.com/album.php?fbid=A1".into()),
                created_time: Some("2012-05-01T10:00:00+0000".into()),
                updated_time: Some("2012-05-02T10:00:00+0000".into()),
            },
            name: "Holiday".into(),
            description: Some("Lisbon, 2012".into()),
            cover_photo: Some("P1".into()),
            count: 12,
        };

        let json = serde_json::to_string(&original).unwrap();
        let decoded: Album = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, original);
    }
}
