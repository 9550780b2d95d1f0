//! The `Photo` node and its renditions.
//!
//! A photo carries a default-size `source` plus an `images` list of
//! alternative renditions. The selectors below pick from that list:
//!
//! - [`Photo::hires_image`]: widest rendition, computed once and memoized.
//! - [`Photo::image_near_width`] / [`Photo::image_near_height`]: rendition
//!   closest to a target dimension.
//!
//! Ties always go to the rendition that comes first on the wire.

use std::sync::OnceLock;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::authorizer::Authorizer;
use crate::client::GraphClient;
use crate::error::GraphError;
use crate::node::{Connectable, Connections, Node, NodeFields, NodeKind, NodeType, PostParams};

/// Photos hang off albums under `photos`.
pub static CONNECTIONS: Connections = Connections::new(&[(NodeKind::Album, "photos")]);

/// One size of a photo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoImage {
    pub width: u32,
    pub height: u32,
    pub source: String,
}

/// A photo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Photo {
    #[serde(flatten)]
    pub node: NodeFields,

    /// Caption.
    #[serde(default)]
    pub name: String,

    /// URL of the default-size rendition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default)]
    pub width: u32,

    #[serde(default)]
    pub height: u32,

    #[serde(
        default,
        deserialize_with = "deserialize_images",
        skip_serializing_if = "Vec::is_empty"
    )]
    images: Vec<PhotoImage>,

    // Index into `images`, `None` when there are no renditions.
    #[serde(skip)]
    hires: OnceLock<Option<usize>>,
}

impl PartialEq for Photo {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
            && self.name == other.name
            && self.source == other.source
            && self.width == other.width
            && self.height == other.height
            && self.images == other.images
    }
}

impl Eq for Photo {}

fn deserialize_images<'de, D>(deserializer: D) -> Result<Vec<PhotoImage>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
            .collect(),
        other => {
            let found = json_type_name(&other);
            warn!(found, "photo: 'images' member is not an array");
            Err(D::Error::custom(format!(
                "'images' must be an array, found {found}"
            )))
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl Photo {
    /// A new, unsaved photo with the given caption.
    pub fn new(caption: impl Into<String>) -> Self {
        Self {
            name: caption.into(),
            ..Self::default()
        }
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

    /// Fetch the photo with `id`.
    pub fn from_id(
        client: &GraphClient,
        authorizer: &dyn Authorizer,
        id: &str,
    ) -> Result<Self, GraphError> {
        client.fetch(authorizer, id)
    }

    /// All renditions, in wire order.
    pub fn images(&self) -> &[PhotoImage] {
        &self.images
    }

    /// Replace the renditions. Resets the memoized [`hires_image`](Self::hires_image).
    pub fn set_images(&mut self, images: Vec<PhotoImage>) {
        self.images = images;
        self.hires = OnceLock::new();
    }

    pub fn default_source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn default_width(&self) -> u32 {
        self.width
    }

    pub fn default_height(&self) -> u32 {
        self.height
    }

    /// The widest rendition.
    pub fn hires_image(&self) -> Option<&PhotoImage> {
        let index = *self.hires.get_or_init(|| {
            let mut best: Option<usize> = None;
            for (i, image) in self.images.iter().enumerate() {
                match best {
                    Some(b) if self.images[b].width >= image.width => {}
                    _ => best = Some(i),
                }
            }
            best
        });
        index.and_then(|i| self.images.get(i))
    }

    pub fn image_near_width(&self, width: u32) -> Option<&PhotoImage> {
        self.images
            .iter()
            .min_by_key(|image| image.width.abs_diff(width))
    }

    pub fn image_near_height(&self, height: u32) -> Option<&PhotoImage> {
        self.images
            .iter()
            .min_by_key(|image| image.height.abs_diff(height))
    }

    /// Download the default-size rendition.
    ///
    /// `source` usually points at a CDN; the access token goes there too, see
    /// [`GraphClient::download`].
    pub fn download_default_size(
        &self,
        client: &GraphClient,
        authorizer: &dyn Authorizer,
    ) -> Result<Vec<u8>, GraphError> {
        let source = self.default_source().ok_or_else(|| {
            GraphError::InvalidArgument(format!("photo {:?} has no source URL", self.node.id))
        })?;
        client.download(source, authorizer)
    }
}

impl Node for Photo {
    fn kind(&self) -> NodeKind {
        NodeKind::Photo
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

impl NodeType for Photo {
    const KIND: NodeKind = NodeKind::Photo;
}

impl Connectable for Photo {
    fn connections(&self) -> &'static Connections {
        &CONNECTIONS
    }

    fn post_params(&self, _parent: NodeKind) -> PostParams {
        PostParams::from([("message", self.name.clone())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorizer::SimpleAuthorizer;
    use crate::testing::{client_with, StubTransport};

    fn image(width: u32, height: u32) -> PhotoImage {
        PhotoImage {
            width,
            height,
            source: format!("https://cdn.example.com/{width}x{height}.jpg"),
        }
    }

    fn photo_with(images: Vec<PhotoImage>) -> Photo {
        let mut photo = Photo::with_id("P1");
        photo.set_images(images);
        photo
    }

    #[test]
    fn hires_is_widest() {
        let photo = photo_with(vec![image(200, 150), image(720, 540), image(400, 300)]);
        assert_eq!(photo.hires_image(), Some(&image(720, 540)));
    }

    #[test]
    fn hires_tie_goes_to_first() {
        let photo = photo_with(vec![image(720, 540), image(720, 480)]);
        assert_eq!(photo.hires_image().unwrap().height, 540);
    }

    #[test]
    fn hires_memo_resets_with_images() {
        let mut photo = photo_with(vec![image(200, 150)]);
        assert_eq!(photo.hires_image().unwrap().width, 200);
        photo.set_images(vec![image(200, 150), image(960, 720)]);
        assert_eq!(photo.hires_image().unwrap().width, 960);
    }

    #[test]
    fn selectors_on_empty_renditions() {
        let photo = Photo::default();
        assert_eq!(photo.hires_image(), None);
        assert_eq!(photo.image_near_width(100), None);
        assert_eq!(photo.image_near_height(100), None);
    }

    #[test]
    fn nearest_dimension() {
        let photo = photo_with(vec![image(200, 150), image(720, 540), image(400, 300)]);
        assert_eq!(photo.image_near_width(450).unwrap().width, 400);
        assert_eq!(photo.image_near_width(10_000).unwrap().width, 720);
        assert_eq!(photo.image_near_height(500).unwrap().height, 540);
        // 300 is equally far from 200 and 400.
        assert_eq!(photo.image_near_width(300).unwrap().width, 200);
    }

    #[test]
    fn decodes_graph_photo() {
        let photo: Photo = serde_json::from_str(
            r#"{
                "id": "P1",
                "name": "Beach",
                "source": "https://cdn.example.com/default.jpg",
                "width": 720,
                "height": 540,
                "images": [
                    {"width": 2048, "height": 1536, "source": "https://cdn.example.com/big.jpg"},
                    {"width": 130, "height": 97, "source": "https://cdn.example.com/small.jpg"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(photo.default_source(), Some("https://cdn.example.com/default.jpg"));
        assert_eq!(photo.default_width(), 720);
        assert_eq!(photo.default_height(), 540);
        assert_eq!(photo.images().len(), 2);
        assert_eq!(photo.hires_image().unwrap().width, 2048);
    }

    #[test]
    fn images_must_be_an_array() {
        let err = serde_json::from_str::<Photo>(r#"{"id":"P1","images":{"width":1}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("'images' must be an array"));

        let err = serde_json::from_str::<Photo>(r#"{"id":"P1","images":[{"width":"wide"}]}"#);
        assert!(err.is_err());
    }

    #[test]
    fn round_trip_ignores_memo() {
        let original: Photo = serde_json::from_str(
            r#"{
                "id": "P1",
                "link": "https://www.facebook.com/photo.php?fbid=P1",
                "created_time": "2012-05-01T10:00:00+0000",
                "updated_time": "2012-05-02T10:00:00+0000",
                "name": "Beach",
                "source": "https://cdn.example.com/default.jpg",
                "width": 720,
                "height": 540,
                "images": [
                    {"width": 2048, "height": 1536, "source": "https://cdn.example.com/big.jpg"},
                    {"width": 130, "height": 97, "source": "https://cdn.example.com/small.jpg"}
                ]
            }"#,
        )
        .unwrap();
        original.hires_image();

        let json = serde_json::to_string(&original).unwrap();
        let decoded: Photo = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.link(), Some("https://www.facebook.com/photo.php?fbid=P1"));
        assert_eq!(decoded.created_time(), Some("2012-05-01T10:00:00+0000"));
        assert_eq!(decoded.updated_time(), Some("2012-05-02T10:00:00+0000"));
        assert_eq!(decoded.default_source(), Some("https://cdn.example.com/default.jpg"));
        assert_eq!((decoded.width, decoded.height), (720, 540));
        assert_eq!(decoded.images().len(), 2);
        assert_eq!(decoded.hires_image().unwrap().width, 2048);
    }

    #[test]
    fn connects_only_to_albums() {
        let photo = Photo::new("Beach");
        assert!(photo.is_connectable_to(NodeKind::Album));
        assert!(!photo.is_connectable_to(NodeKind::User));
        assert_eq!(
            photo.post_params(NodeKind::Album),
            PostParams::from([("message", "Beach".to_string())])
        );
    }

    #[test]
    fn download_uses_default_source() {
        let transport = StubTransport::new();
        transport.push_bytes(200, vec![1, 2, 3]);
        let (client, transport) = client_with(transport);

        let mut photo = Photo::with_id("P1");
        photo.source = Some("https://cdn.example.com/default.jpg".into());
        let bytes = photo
            .download_default_size(&client, &SimpleAuthorizer::new("T"))
            .unwrap();

        assert_eq!(bytes, [1, 2, 3]);
        assert_eq!(
            transport.requests()[0].param("access_token").as_deref(),
            Some("T")
        );
    }

    #[test]
    fn download_without_source_fails_early() {
        let (client, transport) = client_with(StubTransport::new());
        let err = Photo::with_id("P1")
            .download_default_size(&client, &SimpleAuthorizer::new("T"))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidArgument(_)));
        assert!(transport.requests().is_empty());
    }
}
