//! Character sheet projection
//!
//! The sheet list is a pure function of the scene's items: [`project`]
//! recomputes it from scratch, and [`SheetProjection`] holds the latest
//! result. The initial fetch and every change notification go through the
//! same [`SheetProjection::apply_items`] entry point and replace the list
//! wholesale, so there is no incremental state that could drift from the
//! host.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::SheetResult;
use crate::host::{ChangeError, SceneHost};
use crate::item::{ItemId, SceneItem};
use crate::metadata::{CharacterSheetMetadata, METADATA_KEY, MetadataDecode, decode};
use crate::sync::{SheetEdit, merge_edit};

/// A character sheet as shown by the panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSheet {
    pub id: ItemId,
    pub url: String,
    pub image: String,
    pub name: String,
    pub gm_only: bool,
}

impl CharacterSheet {
    pub fn from_metadata(id: ItemId, metadata: CharacterSheetMetadata) -> Self {
        Self {
            id,
            url: metadata.url,
            image: metadata.image,
            name: metadata.name,
            gm_only: metadata.gm_only,
        }
    }

    /// Whether the sheet still waits for a URL to be entered
    pub fn is_pending(&self) -> bool {
        self.url.is_empty()
    }
}

/// Derive the sheet list from a full item collection.
///
/// Keeps image items whose metadata holds a valid sheet record, in the
/// order the host returned them.
pub fn project(items: &[SceneItem]) -> Vec<CharacterSheet> {
    items
        .iter()
        .filter(|item| item.is_image())
        .filter_map(|item| {
            let value = item.metadata.get(METADATA_KEY)?;
            match decode(value) {
                MetadataDecode::Sheet(metadata) => {
                    Some(CharacterSheet::from_metadata(item.id.clone(), metadata))
                }
                MetadataDecode::NotASheet => {
                    trace!(item = %item.id, "Ignoring malformed sheet metadata");
                    None
                }
            }
        })
        .collect()
}

/// Reactive holder of the current sheet list
#[derive(Debug)]
pub struct SheetProjection {
    sheets: watch::Sender<Vec<CharacterSheet>>,
}

impl SheetProjection {
    pub fn new() -> Self {
        let (sheets, _) = watch::channel(Vec::new());
        Self { sheets }
    }

    /// Recompute the list from a full item collection
    pub fn apply_items(&self, items: &[SceneItem]) {
        let next = project(items);
        debug!(items = items.len(), sheets = next.len(), "Reprojected character sheets");
        self.sheets.send_replace(next);
    }

    /// Apply a form edit to the local list only.
    ///
    /// Returns whether an entry with the edit's id was found.
    pub fn apply_local_edit(&self, edit: &SheetEdit) -> bool {
        let mut found = false;
        self.sheets.send_modify(|sheets| found = merge_edit(sheets, edit));
        found
    }

    /// Current list
    pub fn snapshot(&self) -> Vec<CharacterSheet> {
        self.sheets.borrow().clone()
    }

    /// Receiver notified whenever the list is replaced or edited
    pub fn subscribe(&self) -> watch::Receiver<Vec<CharacterSheet>> {
        self.sheets.subscribe()
    }

    /// Keep this projection in sync with the host's items.
    ///
    /// Subscribes first, then fetches and projects the current collection,
    /// then spawns a listener that reprojects every delivered snapshot. A
    /// lagging listener skips to the oldest snapshot still buffered and keeps
    /// going; every snapshot is a full collection, so nothing is refetched.
    /// The listener stops when the returned handle is stopped or dropped.
    pub async fn attach<H>(self: &Arc<Self>, host: Arc<H>) -> SheetResult<ProjectionListener>
    where
        H: SceneHost + 'static,
    {
        let mut changes = host.on_change();
        let items = host.get_items().await?;
        self.apply_items(&items);

        let projection = Arc::clone(self);
        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(items) => projection.apply_items(&items),
                    Err(ChangeError::Lagged(skipped)) => {
                        warn!(skipped, "Item change feed lagged, skipping missed snapshots");
                    }
                    Err(ChangeError::Closed) => {
                        debug!("Item change feed closed");
                        break;
                    }
                }
            }
        });

        Ok(ProjectionListener { task })
    }
}

impl Default for SheetProjection {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle of the background task feeding a [`SheetProjection`]
#[derive(Debug)]
pub struct ProjectionListener {
    task: JoinHandle<()>,
}

impl ProjectionListener {
    /// Tear down the subscription
    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ProjectionListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}
