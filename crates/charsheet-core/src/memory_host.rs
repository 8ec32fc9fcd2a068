//! In-memory scene host
//!
//! Provides a [`SceneHost`] backed by an ordered item list so the panel can
//! be exercised without the real host application: tests drive external
//! changes through it and the CLI loads scenes from JSON files into it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use charsheet_core::{MemoryScene, Role, SceneItem};
//!
//! let scene = MemoryScene::with_items(Role::Gm, vec![SceneItem::image("a", "Aria", "a.png")]);
//! let mut changes = scene.on_change();
//!
//! scene.remove_items(&["a".into()]).await;
//! let snapshot = changes.recv().await.unwrap();
//! assert!(snapshot.is_empty());
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use crate::error::HostError;
use crate::host::{ItemChanges, ItemMutator, ItemSnapshot, SceneHost};
use crate::item::{ItemId, Role, SceneItem};
use crate::menu::{ContextMenuContext, ContextMenuHandler, ContextMenuSpec};

/// Default capacity of the change broadcast channel
pub const DEFAULT_CHANGE_CAPACITY: usize = 256;

/// A context menu registered with a [`MemoryScene`]
struct RegisteredMenu {
    spec: ContextMenuSpec,
    handler: Arc<dyn ContextMenuHandler>,
}

/// A scene host held entirely in memory
pub struct MemoryScene {
    /// Items in host order
    items: RwLock<Vec<SceneItem>>,
    /// Full-collection change notifications
    change_tx: broadcast::Sender<ItemSnapshot>,
    /// Role reported to the panel
    role: Role,
    /// Registered context menus by id
    menus: DashMap<String, RegisteredMenu>,
    /// Number of `get_items` calls received
    fetch_calls: AtomicUsize,
    /// Number of `update_items` calls received
    update_calls: AtomicUsize,
    /// Reject every `update_items` call when set
    reject_updates: AtomicBool,
    /// Fail `get_role` when set
    reject_role: AtomicBool,
    height: AtomicU32,
    width: AtomicU32,
}

impl MemoryScene {
    /// Create an empty scene
    pub fn new(role: Role) -> Self {
        Self::with_capacity(role, Vec::new(), DEFAULT_CHANGE_CAPACITY)
    }

    /// Create a scene holding the given items
    pub fn with_items(role: Role, items: Vec<SceneItem>) -> Self {
        Self::with_capacity(role, items, DEFAULT_CHANGE_CAPACITY)
    }

    /// Create a scene with a specific change channel capacity
    pub fn with_capacity(role: Role, items: Vec<SceneItem>, capacity: usize) -> Self {
        let (change_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            items: RwLock::new(items),
            change_tx,
            role,
            menus: DashMap::new(),
            fetch_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            reject_updates: AtomicBool::new(false),
            reject_role: AtomicBool::new(false),
            height: AtomicU32::new(0),
            width: AtomicU32::new(0),
        }
    }

    /// Current items
    pub async fn items(&self) -> Vec<SceneItem> {
        self.items.read().await.clone()
    }

    /// Look up one item
    pub async fn item(&self, id: &ItemId) -> Option<SceneItem> {
        self.items.read().await.iter().find(|item| &item.id == id).cloned()
    }

    /// Apply an external change (another client, the host itself) and notify
    pub async fn modify<F>(&self, f: F)
    where
        F: FnOnce(&mut Vec<SceneItem>),
    {
        let mut items = self.items.write().await;
        f(&mut items);
        self.publish(&items);
    }

    /// Append items at the end of the collection
    pub async fn add_items(&self, new_items: Vec<SceneItem>) {
        self.modify(|items| items.extend(new_items)).await;
    }

    /// Delete items by id
    pub async fn remove_items(&self, ids: &[ItemId]) {
        let ids: HashSet<&ItemId> = ids.iter().collect();
        self.modify(|items| items.retain(|item| !ids.contains(&item.id))).await;
    }

    /// Number of `get_items` calls received so far
    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of `update_items` calls received so far
    pub fn update_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Make subsequent `update_items` calls fail
    pub fn set_reject_updates(&self, reject: bool) {
        self.reject_updates.store(reject, Ordering::SeqCst);
    }

    /// Make subsequent `get_role` calls fail
    pub fn set_reject_role(&self, reject: bool) {
        self.reject_role.store(reject, Ordering::SeqCst);
    }

    /// Last height requested by the panel (0 if never set)
    pub fn height(&self) -> u32 {
        self.height.load(Ordering::SeqCst)
    }

    /// Last width requested by the panel (0 if never set)
    pub fn width(&self) -> u32 {
        self.width.load(Ordering::SeqCst)
    }

    /// Ids of the registered context menus
    pub fn menu_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.menus.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Spec of a registered context menu
    pub fn menu_spec(&self, id: &str) -> Option<ContextMenuSpec> {
        self.menus.get(id).map(|menu| menu.spec.clone())
    }

    /// Simulate a viewer clicking a context menu on a selection.
    ///
    /// Resolves the selected items, picks the icon the host would show and
    /// invokes the handler. Returns the clicked icon's label, or `None`
    /// when no icon matches the selection.
    pub async fn click_context_menu(
        &self,
        menu_id: &str,
        selection: &[ItemId],
        role: Role,
    ) -> Result<Option<String>, HostError> {
        let (spec, handler) = {
            let menu = self
                .menus
                .get(menu_id)
                .ok_or_else(|| HostError::MenuNotFound(menu_id.to_string()))?;
            (menu.spec.clone(), Arc::clone(&menu.handler))
        };

        let selected: Vec<SceneItem> = {
            let items = self.items.read().await;
            selection
                .iter()
                .filter_map(|id| items.iter().find(|item| &item.id == id).cloned())
                .collect()
        };

        let Some(icon) = spec.active_icon(&selected) else {
            debug!(menu = menu_id, selected = selected.len(), "No menu icon matches selection");
            return Ok(None);
        };
        let label = icon.label.clone();

        handler
            .on_click(ContextMenuContext {
                items: selected,
                role,
            })
            .await?;
        Ok(Some(label))
    }

    fn publish(&self, items: &[SceneItem]) {
        // No subscribers is fine
        let _ = self.change_tx.send(Arc::new(items.to_vec()));
    }
}

#[async_trait]
impl SceneHost for MemoryScene {
    async fn get_items(&self) -> Result<Vec<SceneItem>, HostError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.items().await)
    }

    fn on_change(&self) -> ItemChanges {
        ItemChanges::new(self.change_tx.subscribe())
    }

    async fn update_items(&self, ids: &[ItemId], mutator: ItemMutator) -> Result<(), HostError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_updates.load(Ordering::SeqCst) {
            return Err(HostError::Rejected("updates disabled".to_string()));
        }

        let wanted: HashSet<&ItemId> = ids.iter().collect();
        let mut items = self.items.write().await;

        let positions: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, item)| wanted.contains(&item.id))
            .map(|(index, _)| index)
            .collect();
        if positions.is_empty() {
            debug!(requested = ids.len(), "update_items matched no items");
            return Ok(());
        }

        let mut targeted: Vec<SceneItem> = positions.iter().map(|&index| items[index].clone()).collect();
        mutator(&mut targeted);
        for (index, item) in positions.into_iter().zip(targeted) {
            items[index] = item;
        }

        self.publish(&items);
        Ok(())
    }

    async fn get_role(&self) -> Result<Role, HostError> {
        if self.reject_role.load(Ordering::SeqCst) {
            return Err(HostError::Rejected("role unavailable".to_string()));
        }
        Ok(self.role)
    }

    async fn create_context_menu(
        &self,
        spec: ContextMenuSpec,
        handler: Arc<dyn ContextMenuHandler>,
    ) -> Result<(), HostError> {
        debug!(menu = %spec.id, icons = spec.icons.len(), "Registered context menu");
        self.menus.insert(spec.id.clone(), RegisteredMenu { spec, handler });
        Ok(())
    }

    async fn remove_context_menu(&self, id: &str) -> Result<(), HostError> {
        self.menus
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| HostError::MenuNotFound(id.to_string()))
    }

    fn set_height(&self, px: u32) {
        self.height.store(px, Ordering::SeqCst);
    }

    fn set_width(&self, px: u32) {
        self.width.store(px, Ordering::SeqCst);
    }
}
