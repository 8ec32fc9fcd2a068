//! Attach/detach context menu action
//!
//! One menu id services both directions. The host shows the "add" icon
//! when no selected item carries a sheet yet and the "remove" icon
//! otherwise. On click the direction is decided once for the whole batch:
//! attach only if every item lacks the sheet key, detach everything
//! otherwise, including items that never had one.

use std::sync::Weak;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::HostError;
use crate::host::SceneHost;
use crate::item::{ItemId, ItemType, Layer, Role, SceneItem};
use crate::menu::{
    ContextMenuContext, ContextMenuHandler, ContextMenuIcon, ContextMenuSpec, ItemFilter,
    KeyFilter, Permission,
};
use crate::metadata::{CharacterSheetMetadata, METADATA_KEY, plugin_id};

/// Path of the toggle menu under the plugin namespace
pub const TOGGLE_MENU_PATH: &str = "menu/toggle";

/// Icon assets shipped with the panel
pub mod icons {
    pub const ADD: &str = "/add.svg";
    pub const REMOVE: &str = "/remove.svg";
}

/// Direction of a toggle batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleDirection {
    Attach,
    Detach,
}

/// Decide the direction for a batch: attach iff no item carries the key
pub fn decide_toggle(items: &[SceneItem]) -> ToggleDirection {
    if items.iter().all(|item| !item.has_metadata(METADATA_KEY)) {
        ToggleDirection::Attach
    } else {
        ToggleDirection::Detach
    }
}

/// Record written when an item is attached
pub fn attach_metadata(item: &SceneItem, role: Role) -> CharacterSheetMetadata {
    CharacterSheetMetadata {
        url: String::new(),
        image: item.image_url().to_string(),
        name: item.display_label().to_string(),
        gm_only: role.is_gm(),
    }
}

/// Run the toggle over a batch of items in place
pub fn apply_toggle(items: &mut [SceneItem], role: Role) -> ToggleDirection {
    let direction = decide_toggle(items);
    for item in items.iter_mut() {
        match direction {
            ToggleDirection::Attach => {
                match attach_metadata(item, role).to_value() {
                    Ok(value) => {
                        item.metadata.insert(METADATA_KEY.to_string(), value);
                    }
                    Err(e) => warn!(item = %item.id, error = %e, "Sheet record not encodable"),
                }
            }
            ToggleDirection::Detach => {
                item.metadata.remove(METADATA_KEY);
            }
        }
    }
    direction
}

/// Id of the toggle context menu
pub fn toggle_menu_id() -> String {
    plugin_id(TOGGLE_MENU_PATH)
}

/// Declarative spec of the toggle context menu
pub fn toggle_menu() -> ContextMenuSpec {
    let character_image = || {
        vec![
            KeyFilter::Type(ItemType::Image),
            KeyFilter::Layer(Layer::Character),
        ]
    };

    let mut attach_filter = character_image();
    attach_filter.push(KeyFilter::MetadataAbsent(METADATA_KEY.to_string()));

    ContextMenuSpec {
        id: toggle_menu_id(),
        icons: vec![
            ContextMenuIcon {
                icon: icons::ADD.to_string(),
                label: "Add Character".to_string(),
                filter: ItemFilter {
                    every: attach_filter,
                    permissions: vec![Permission::Update],
                },
            },
            ContextMenuIcon {
                icon: icons::REMOVE.to_string(),
                label: "Remove Character".to_string(),
                filter: ItemFilter {
                    every: character_image(),
                    permissions: vec![Permission::Update],
                },
            },
        ],
    }
}

/// Click handler of the toggle menu.
///
/// Holds the host weakly since the host stores the handler.
pub struct ToggleSheetHandler<H> {
    host: Weak<H>,
}

impl<H> ToggleSheetHandler<H> {
    pub fn new(host: Weak<H>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl<H> ContextMenuHandler for ToggleSheetHandler<H>
where
    H: SceneHost + 'static,
{
    async fn on_click(&self, context: ContextMenuContext) -> Result<(), HostError> {
        let Some(host) = self.host.upgrade() else {
            return Err(HostError::Closed);
        };

        let ids: Vec<ItemId> = context.items.iter().map(|item| item.id.clone()).collect();
        let role = context.role;
        debug!(items = ids.len(), role = %role, "Toggling character sheets");

        host.update_items(
            &ids,
            Box::new(move |items: &mut [SceneItem]| {
                let direction = apply_toggle(items, role);
                debug!(?direction, items = items.len(), "Applied sheet toggle");
            }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::read_sheet_metadata;
    use serde_json::json;

    fn attached(id: &str) -> SceneItem {
        SceneItem::image(id, id, format!("{}.png", id)).with_metadata(
            METADATA_KEY,
            json!({ "url": "u", "image": "i", "name": "n", "gmOnly": false }),
        )
    }

    #[test]
    fn test_decide_all_absent_attaches() {
        let items = vec![SceneItem::image("a", "A", "a.png"), SceneItem::image("b", "B", "b.png")];
        assert_eq!(decide_toggle(&items), ToggleDirection::Attach);
    }

    #[test]
    fn test_decide_any_present_detaches() {
        let items = vec![SceneItem::image("a", "A", "a.png"), attached("b")];
        assert_eq!(decide_toggle(&items), ToggleDirection::Detach);
        assert_eq!(decide_toggle(&[attached("c")]), ToggleDirection::Detach);
    }

    #[test]
    fn test_decide_counts_malformed_values_as_present() {
        let item = SceneItem::image("a", "A", "a.png").with_metadata(METADATA_KEY, json!(null));
        assert_eq!(decide_toggle(&[item]), ToggleDirection::Detach);
    }

    #[test]
    fn test_attach_captures_image_and_name() {
        let mut items = vec![
            SceneItem::image("a", "Goblin", "goblin.png").with_text("Grik"),
            SceneItem::image("b", "Orc", "orc.png"),
        ];
        assert_eq!(apply_toggle(&mut items, Role::Gm), ToggleDirection::Attach);

        let a = read_sheet_metadata(&items[0]).unwrap();
        assert_eq!(a.url, "");
        assert_eq!(a.image, "goblin.png");
        assert_eq!(a.name, "Grik");
        assert!(a.gm_only);

        let b = read_sheet_metadata(&items[1]).unwrap();
        assert_eq!(b.name, "Orc");
        assert_eq!(b.image, "orc.png");
    }

    #[test]
    fn test_attach_as_player_is_not_gm_only() {
        let mut items = vec![SceneItem::image("a", "A", "a.png")];
        apply_toggle(&mut items, Role::Player);
        assert!(!read_sheet_metadata(&items[0]).unwrap().gm_only);
    }

    #[test]
    fn test_mixed_batch_detaches_all() {
        let mut items = vec![attached("a"), SceneItem::image("b", "B", "b.png")];
        assert_eq!(apply_toggle(&mut items, Role::Gm), ToggleDirection::Detach);
        assert!(!items[0].has_metadata(METADATA_KEY));
        assert!(!items[1].has_metadata(METADATA_KEY));
    }

    #[test]
    fn test_detach_leaves_other_metadata() {
        let mut items = vec![attached("a").with_metadata("other.plugin/x", json!(1))];
        apply_toggle(&mut items, Role::Player);
        assert!(items[0].has_metadata("other.plugin/x"));
    }

    #[test]
    fn test_toggle_menu_spec() {
        let spec = toggle_menu();
        assert_eq!(spec.id, "io.charsheet/menu/toggle");
        assert_eq!(spec.icons.len(), 2);
        assert!(spec
            .icons
            .iter()
            .all(|icon| icon.filter.permissions == vec![Permission::Update]));

        let fresh = vec![SceneItem::image("a", "A", "a.png")];
        assert_eq!(spec.active_icon(&fresh).unwrap().label, "Add Character");

        let with_sheet = vec![attached("a")];
        assert_eq!(spec.active_icon(&with_sheet).unwrap().label, "Remove Character");

        let prop = vec![SceneItem::image("p", "Crate", "crate.png").with_layer(Layer::Prop)];
        assert!(spec.active_icon(&prop).is_none());
    }
}
