//! Host application interface
//!
//! The host owns the scene, synchronizes it across clients, resolves the
//! viewer's role and enforces permissions. This trait is the only surface
//! the panel uses to reach it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::HostError;
use crate::item::{ItemId, Role, SceneItem};
use crate::menu::{ContextMenuHandler, ContextMenuSpec};

/// Read-modify-write closure run by the host over the targeted items
pub type ItemMutator = Box<dyn FnOnce(&mut [SceneItem]) + Send>;

/// Full snapshot of the scene's items, in host order
pub type ItemSnapshot = Arc<Vec<SceneItem>>;

/// Scene, viewer and panel operations provided by the host
#[async_trait]
pub trait SceneHost: Send + Sync {
    /// Fetch the current full item collection
    async fn get_items(&self) -> Result<Vec<SceneItem>, HostError>;

    /// Subscribe to the item collection.
    ///
    /// Every mutation by any party delivers the full collection. Dropping
    /// the returned value unsubscribes.
    fn on_change(&self) -> ItemChanges;

    /// Atomically run `mutator` over the named items.
    ///
    /// Unknown ids are skipped. The items are passed in collection order.
    async fn update_items(&self, ids: &[ItemId], mutator: ItemMutator) -> Result<(), HostError>;

    /// Role of the local viewer
    async fn get_role(&self) -> Result<Role, HostError>;

    /// Register a context menu action
    async fn create_context_menu(
        &self,
        spec: ContextMenuSpec,
        handler: Arc<dyn ContextMenuHandler>,
    ) -> Result<(), HostError>;

    /// Unregister a context menu action
    async fn remove_context_menu(&self, id: &str) -> Result<(), HostError>;

    /// Resize the panel height (fire-and-forget)
    fn set_height(&self, px: u32);

    /// Resize the panel width (fire-and-forget)
    fn set_width(&self, px: u32);
}

/// Why a change notification could not be received
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeError {
    /// The subscriber fell behind and this many snapshots were dropped
    Lagged(u64),
    /// The host stopped publishing changes
    Closed,
}

/// Subscription to item collection changes
pub struct ItemChanges {
    rx: broadcast::Receiver<ItemSnapshot>,
}

impl ItemChanges {
    pub fn new(rx: broadcast::Receiver<ItemSnapshot>) -> Self {
        Self { rx }
    }

    /// Wait for the next snapshot
    pub async fn recv(&mut self) -> Result<ItemSnapshot, ChangeError> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Lagged(skipped) => ChangeError::Lagged(skipped),
            broadcast::error::RecvError::Closed => ChangeError::Closed,
        })
    }
}

impl std::fmt::Debug for ItemChanges {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemChanges").field("pending", &self.rx.len()).finish()
    }
}
