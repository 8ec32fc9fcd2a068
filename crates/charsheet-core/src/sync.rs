//! Sheet edit synchronization
//!
//! A submitted form edit is applied twice: immediately to the local sheet
//! list, and as a targeted update on the host. The two are independent.
//! A failed or skipped remote write does not undo the local change; the
//! next change notification from the host reconciles them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{EditError, HostError};
use crate::host::SceneHost;
use crate::item::{ItemId, SceneItem};
use crate::metadata::{METADATA_KEY, fields, is_metadata};
use crate::projection::{CharacterSheet, SheetProjection};

/// Raw value a checked checkbox submits
pub const CHECKBOX_ON: &str = "on";

/// Form field names
pub mod form_fields {
    pub const ID: &str = "id";
    pub const URL: &str = "url";
    pub const GM_ONLY: &str = "gmOnly";
}

/// Raw `(name, value)` pairs submitted by a sheet form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    entries: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Value of a field; the last occurrence wins
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormSubmission {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Interpret a checkbox value: only the literal `"on"` is checked
pub fn checkbox_checked(raw: Option<&str>) -> bool {
    raw == Some(CHECKBOX_ON)
}

/// A parsed edit of one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEdit {
    pub id: ItemId,
    pub url: String,
    pub gm_only: bool,
}

impl SheetEdit {
    pub fn new(id: impl Into<ItemId>, url: impl Into<String>, gm_only: bool) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            gm_only,
        }
    }

    /// Parse a form submission. `id` is required, `url` defaults to empty.
    pub fn from_form(form: &FormSubmission) -> Result<Self, EditError> {
        let id = form
            .get(form_fields::ID)
            .ok_or(EditError::MissingField(form_fields::ID))?;
        if id.is_empty() {
            return Err(EditError::EmptyField(form_fields::ID));
        }

        Ok(Self {
            id: ItemId::new(id),
            url: form.get(form_fields::URL).unwrap_or_default().to_string(),
            gm_only: checkbox_checked(form.get(form_fields::GM_ONLY)),
        })
    }
}

/// Merge an edit into the local list.
///
/// Only the entry with the matching id changes. Returns whether it was found.
pub fn merge_edit(sheets: &mut [CharacterSheet], edit: &SheetEdit) -> bool {
    let mut found = false;
    for sheet in sheets.iter_mut().filter(|sheet| sheet.id == edit.id) {
        sheet.url = edit.url.clone();
        sheet.gm_only = edit.gm_only;
        found = true;
    }
    found
}

/// Write an edit into an item's stored record.
///
/// The record is re-checked first since it may have been removed or
/// replaced concurrently. Only `url` and `gmOnly` are overwritten.
pub fn patch_item(item: &mut SceneItem, edit: &SheetEdit) -> bool {
    let Some(value) = item.metadata.get_mut(METADATA_KEY) else {
        return false;
    };
    if !is_metadata(value) {
        return false;
    }
    let Value::Object(record) = value else {
        return false;
    };

    record.insert(fields::URL.to_string(), Value::String(edit.url.clone()));
    record.insert(fields::GM_ONLY.to_string(), Value::Bool(edit.gm_only));
    true
}

/// Applies sheet edits to the local projection and the host
pub struct EditSynchronizer<H> {
    host: Arc<H>,
    projection: Arc<SheetProjection>,
}

impl<H> EditSynchronizer<H>
where
    H: SceneHost + 'static,
{
    pub fn new(host: Arc<H>, projection: Arc<SheetProjection>) -> Self {
        Self { host, projection }
    }

    /// Apply an edit locally and issue one targeted update for its item.
    ///
    /// The remote write runs in the background; the returned handle may be
    /// awaited or dropped without cancelling it.
    pub fn submit(&self, edit: SheetEdit) -> PendingSync {
        let found = self.projection.apply_local_edit(&edit);
        debug!(item = %edit.id, found, gm_only = edit.gm_only, "Applied sheet edit locally");

        let host = Arc::clone(&self.host);
        let task = tokio::spawn(async move {
            let id = edit.id.clone();
            let written = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&written);

            let result = host
                .update_items(
                    std::slice::from_ref(&id),
                    Box::new(move |items: &mut [SceneItem]| {
                        for item in items.iter_mut().filter(|item| item.id == edit.id) {
                            if patch_item(item, &edit) {
                                flag.store(true, Ordering::Release);
                            }
                        }
                    }),
                )
                .await;

            match result {
                Ok(()) => {
                    let written = written.load(Ordering::Acquire);
                    if !written {
                        debug!(item = %id, "Sheet record gone, remote edit skipped");
                    }
                    Ok(written)
                }
                Err(e) => {
                    warn!(item = %id, error = %e, "Sheet edit was not synchronized");
                    Err(e)
                }
            }
        });

        PendingSync { task }
    }
}

/// Outcome of a background remote edit
#[derive(Debug)]
pub struct PendingSync {
    task: JoinHandle<Result<bool, HostError>>,
}

impl PendingSync {
    /// Wait for the remote write.
    ///
    /// `Ok(true)` when the record was updated, `Ok(false)` when the item no
    /// longer carried a valid record.
    pub async fn settled(self) -> Result<bool, HostError> {
        match self.task.await {
            Ok(result) => result,
            Err(_) => Err(HostError::Closed),
        }
    }
}
