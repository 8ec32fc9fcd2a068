//! Scene item model
//!
//! Items are owned by the host and arrive here as full snapshots. The shape
//! follows the host's camelCase JSON so scenes can be loaded from files.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a scene item, assigned by the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of a scene item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    Image,
    Text,
    Label,
    Shape,
    Curve,
    Line,
    Path,
    Pointer,
    Ruler,
}

/// Scene layer an item is placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Layer {
    Map,
    Grid,
    Drawing,
    Prop,
    Mount,
    Character,
    Attachment,
    Note,
    Text,
    Ruler,
    Fog,
    Pointer,
    PostProcess,
    Control,
    Popover,
}

/// Role of the viewer as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Gm,
    #[default]
    Player,
}

impl Role {
    pub fn is_gm(self) -> bool {
        self == Role::Gm
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Gm => write!(f, "GM"),
            Role::Player => write!(f, "PLAYER"),
        }
    }
}

/// Image reference of an image item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageContent {
    pub url: String,
    #[serde(default)]
    pub mime: String,
}

/// Rich text attached to an item; only the plain text is used here
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    #[serde(default)]
    pub plain_text: String,
}

/// An item placed on the tabletop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneItem {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub layer: Layer,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
    /// Plugin-namespaced metadata values
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl SceneItem {
    /// Create an image item on the character layer
    pub fn image(id: impl Into<ItemId>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item_type: ItemType::Image,
            layer: Layer::Character,
            name: name.into(),
            image: Some(ImageContent {
                url: url.into(),
                mime: "image/png".to_string(),
            }),
            text: None,
            metadata: Map::new(),
        }
    }

    /// Create a non-image item (text, shape, ...) with no image reference
    pub fn other(id: impl Into<ItemId>, item_type: ItemType, layer: Layer, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item_type,
            layer,
            name: name.into(),
            image: None,
            text: None,
            metadata: Map::new(),
        }
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_text(mut self, plain_text: impl Into<String>) -> Self {
        self.text = Some(TextContent {
            plain_text: plain_text.into(),
        });
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn is_image(&self) -> bool {
        self.item_type == ItemType::Image
    }

    /// Image URL, or an empty string for items without an image
    pub fn image_url(&self) -> &str {
        self.image.as_ref().map(|image| image.url.as_str()).unwrap_or("")
    }

    /// Label shown for the item: its text content if non-empty, else its name
    pub fn display_label(&self) -> &str {
        match &self.text {
            Some(text) if !text.plain_text.is_empty() => &text.plain_text,
            _ => &self.name,
        }
    }

    pub fn has_metadata(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }
}
