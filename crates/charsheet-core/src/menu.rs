//! Declarative context menu specification
//!
//! The host shows a context menu icon when every selected item passes the
//! icon's filter. Filters are plain data so the host can evaluate them
//! without calling back into the extension; [`ItemFilter::matches`] mirrors
//! that evaluation for in-process hosts and tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::item::{ItemType, Layer, Role, SceneItem};

/// Permission the host must grant the viewer on the selected items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Permission {
    Create,
    Update,
    Delete,
}

/// One condition on a single item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFilter {
    /// Item `type` equals the given kind
    Type(ItemType),
    /// Item `layer` equals the given layer
    Layer(Layer),
    /// Metadata mapping has no value under the key
    MetadataAbsent(String),
    /// Metadata mapping has some value under the key
    MetadataPresent(String),
}

impl KeyFilter {
    pub fn matches(&self, item: &SceneItem) -> bool {
        match self {
            KeyFilter::Type(item_type) => item.item_type == *item_type,
            KeyFilter::Layer(layer) => item.layer == *layer,
            KeyFilter::MetadataAbsent(key) => !item.has_metadata(key),
            KeyFilter::MetadataPresent(key) => item.has_metadata(key),
        }
    }
}

/// Conditions every selected item must satisfy, plus the required permissions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub every: Vec<KeyFilter>,
    pub permissions: Vec<Permission>,
}

impl ItemFilter {
    pub fn matches(&self, item: &SceneItem) -> bool {
        self.every.iter().all(|condition| condition.matches(item))
    }

    /// True when the selection is non-empty and every item matches
    pub fn matches_all(&self, items: &[SceneItem]) -> bool {
        !items.is_empty() && items.iter().all(|item| self.matches(item))
    }
}

/// An icon entry of a context menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenuIcon {
    pub icon: String,
    pub label: String,
    pub filter: ItemFilter,
}

/// A context menu action registered with the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenuSpec {
    pub id: String,
    /// Candidate icons; the first whose filter matches the selection is shown
    pub icons: Vec<ContextMenuIcon>,
}

impl ContextMenuSpec {
    /// Icon the host would display for this selection, if any
    pub fn active_icon(&self, items: &[SceneItem]) -> Option<&ContextMenuIcon> {
        self.icons.iter().find(|icon| icon.filter.matches_all(items))
    }
}

/// What the host passes to a handler when a menu icon is clicked
#[derive(Debug, Clone)]
pub struct ContextMenuContext {
    /// Selected items, as matched by the icon filter
    pub items: Vec<SceneItem>,
    /// Role of the viewer who clicked
    pub role: Role,
}

/// Click handler of a registered context menu
#[async_trait]
pub trait ContextMenuHandler: Send + Sync {
    async fn on_click(&self, context: ContextMenuContext) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec() -> ContextMenuSpec {
        ContextMenuSpec {
            id: "test/menu".to_string(),
            icons: vec![
                ContextMenuIcon {
                    icon: "/add.svg".to_string(),
                    label: "Add".to_string(),
                    filter: ItemFilter {
                        every: vec![
                            KeyFilter::Type(ItemType::Image),
                            KeyFilter::MetadataAbsent("k".to_string()),
                        ],
                        permissions: vec![Permission::Update],
                    },
                },
                ContextMenuIcon {
                    icon: "/remove.svg".to_string(),
                    label: "Remove".to_string(),
                    filter: ItemFilter {
                        every: vec![KeyFilter::Type(ItemType::Image)],
                        permissions: vec![Permission::Update],
                    },
                },
            ],
        }
    }

    #[test]
    fn test_key_filters() {
        let item = SceneItem::image("a", "A", "a.png").with_metadata("k", json!(1));
        assert!(KeyFilter::Type(ItemType::Image).matches(&item));
        assert!(!KeyFilter::Type(ItemType::Text).matches(&item));
        assert!(KeyFilter::Layer(Layer::Character).matches(&item));
        assert!(!KeyFilter::Layer(Layer::Map).matches(&item));
        assert!(KeyFilter::MetadataPresent("k".to_string()).matches(&item));
        assert!(!KeyFilter::MetadataAbsent("k".to_string()).matches(&item));
    }

    #[test]
    fn test_empty_selection_never_matches() {
        let filter = ItemFilter::default();
        assert!(!filter.matches_all(&[]));
    }

    #[test]
    fn test_active_icon_picks_first_match() {
        let spec = spec();
        let plain = vec![SceneItem::image("a", "A", "a.png")];
        assert_eq!(spec.active_icon(&plain).unwrap().label, "Add");

        let mixed = vec![
            SceneItem::image("a", "A", "a.png"),
            SceneItem::image("b", "B", "b.png").with_metadata("k", json!(true)),
        ];
        assert_eq!(spec.active_icon(&mixed).unwrap().label, "Remove");

        let text = vec![SceneItem::other("t", ItemType::Text, Layer::Text, "T")];
        assert!(spec.active_icon(&text).is_none());
    }
}
