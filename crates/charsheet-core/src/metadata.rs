//! Character sheet metadata codec
//!
//! The sheet record lives in the item's metadata mapping under
//! [`METADATA_KEY`]. Other extensions and older versions may have written
//! anything there, so reading never fails: a value either decodes to a
//! [`CharacterSheetMetadata`] or is reported as [`MetadataDecode::NotASheet`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::item::SceneItem;

/// Namespace for every key this extension owns on the host
pub const PLUGIN_ID: &str = "io.charsheet";

/// Reserved metadata key holding the sheet record
pub const METADATA_KEY: &str = "io.charsheet/metadata";

/// Field names patched in place by the edit path
pub(crate) mod fields {
    pub const URL: &str = "url";
    pub const GM_ONLY: &str = "gmOnly";
}

/// Build a plugin-namespaced identifier (`<PLUGIN_ID>/<path>`)
pub fn plugin_id(path: &str) -> String {
    format!("{}/{}", PLUGIN_ID, path)
}

/// The record stored on an attached item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSheetMetadata {
    pub url: String,
    /// Image URL captured at attach time
    pub image: String,
    /// Name captured at attach time
    pub name: String,
    pub gm_only: bool,
}

impl CharacterSheetMetadata {
    /// Encode as the four-field record written to the host
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// Outcome of reading a metadata value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataDecode {
    Sheet(CharacterSheetMetadata),
    NotASheet,
}

impl MetadataDecode {
    pub fn into_sheet(self) -> Option<CharacterSheetMetadata> {
        match self {
            MetadataDecode::Sheet(metadata) => Some(metadata),
            MetadataDecode::NotASheet => None,
        }
    }
}

/// Decode a metadata value.
///
/// Only a JSON object with string `url`, `image`, `name` and a boolean
/// `gmOnly` is a sheet. Extra keys are ignored.
pub fn decode(value: &Value) -> MetadataDecode {
    // serde would also accept a four-element array for the struct
    if !value.is_object() {
        return MetadataDecode::NotASheet;
    }
    serde_json::from_value::<CharacterSheetMetadata>(value.clone())
        .map_or(MetadataDecode::NotASheet, MetadataDecode::Sheet)
}

/// Structural check for a sheet record
pub fn is_metadata(value: &Value) -> bool {
    matches!(decode(value), MetadataDecode::Sheet(_))
}

/// Read and decode the sheet record of an item, if any
pub fn read_sheet_metadata(item: &SceneItem) -> Option<CharacterSheetMetadata> {
    item.metadata.get(METADATA_KEY).and_then(|value| decode(value).into_sheet())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_key_is_namespaced() {
        assert_eq!(METADATA_KEY, plugin_id("metadata"));
        assert_eq!(plugin_id("menu/toggle"), "io.charsheet/menu/toggle");
    }

    #[test]
    fn test_accepts_minimal_record() {
        let value = json!({ "url": "", "image": "", "name": "", "gmOnly": false });
        assert!(is_metadata(&value));
        assert_eq!(
            decode(&value),
            MetadataDecode::Sheet(CharacterSheetMetadata {
                url: String::new(),
                image: String::new(),
                name: String::new(),
                gm_only: false,
            })
        );
    }

    #[test]
    fn test_accepts_extra_fields() {
        let value = json!({
            "url": "https://sheets.example/1",
            "image": "a.png",
            "name": "Aria",
            "gmOnly": true,
            "version": 2
        });
        let sheet = decode(&value).into_sheet().unwrap();
        assert!(sheet.gm_only);
        assert_eq!(sheet.name, "Aria");
    }

    #[test]
    fn test_rejects_missing_fields() {
        for missing in ["url", "image", "name", "gmOnly"] {
            let mut value = json!({ "url": "", "image": "", "name": "", "gmOnly": false });
            value.as_object_mut().unwrap().remove(missing);
            assert!(!is_metadata(&value), "accepted record without {}", missing);
        }
    }

    #[test]
    fn test_rejects_wrong_types() {
        let cases = [
            json!({ "url": 1, "image": "", "name": "", "gmOnly": false }),
            json!({ "url": "", "image": null, "name": "", "gmOnly": false }),
            json!({ "url": "", "image": "", "name": [], "gmOnly": false }),
            json!({ "url": "", "image": "", "name": "", "gmOnly": "on" }),
            json!({ "url": "", "image": "", "name": "", "gmOnly": 0 }),
        ];
        for value in cases {
            assert!(!is_metadata(&value), "accepted {}", value);
        }
    }

    #[test]
    fn test_rejects_non_records() {
        let positional = json!(["", "a.png", "Aria", false]);
        for value in [json!(null), json!([]), positional, json!("sheet"), json!(42), json!(true)] {
            assert_eq!(decode(&value), MetadataDecode::NotASheet);
        }
    }

    #[test]
    fn test_to_value_is_readable() {
        let metadata = CharacterSheetMetadata {
            url: "https://sheets.example/7".to_string(),
            image: "b.png".to_string(),
            name: "Bram".to_string(),
            gm_only: true,
        };
        let value = metadata.to_value().unwrap();
        assert_eq!(
            value,
            json!({
                "url": "https://sheets.example/7",
                "image": "b.png",
                "name": "Bram",
                "gmOnly": true
            })
        );
        assert_eq!(decode(&value).into_sheet(), Some(metadata));
    }

    #[test]
    fn test_read_sheet_metadata_from_item() {
        let item = SceneItem::image("a", "Aria", "a.png")
            .with_metadata(METADATA_KEY, json!({ "url": "", "image": "a.png", "name": "Aria", "gmOnly": false }));
        assert_eq!(read_sheet_metadata(&item).unwrap().name, "Aria");

        let item = SceneItem::image("b", "Bram", "b.png").with_metadata(METADATA_KEY, json!({ "url": "" }));
        assert!(read_sheet_metadata(&item).is_none());

        let item = SceneItem::image("c", "Cole", "c.png");
        assert!(read_sheet_metadata(&item).is_none());
    }
}
