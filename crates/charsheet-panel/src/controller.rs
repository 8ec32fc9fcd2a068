//! Panel controller.
//!
//! Owns the panel's session state: the viewer role read at mount, the
//! projection of attached sheets and the selected tab. Everything the user
//! sees is derived from those through [`build_view`].

use std::sync::Arc;

use charsheet_core::{
    CharacterSheet, EditSynchronizer, FormSubmission, PendingSync, ProjectionListener, Role,
    SceneHost, SheetEdit, SheetProjection, ToggleSheetHandler, toggle_menu, toggle_menu_id,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::PanelConfig;
use crate::error::PanelResult;
use crate::view::{PanelView, build_view, displayed_index};

/// Undo the menu registration of a mount that did not complete
async fn remove_menu_after_failure<H: SceneHost>(host: &H) {
    if let Err(e) = host.remove_context_menu(&toggle_menu_id()).await {
        warn!(error = %e, "Failed to remove context menu after mount error");
    }
}

/// A mounted character sheet panel
pub struct PanelController<H> {
    host: Arc<H>,
    config: PanelConfig,
    /// Viewer role, read once at mount
    role: Role,
    projection: Arc<SheetProjection>,
    sync: EditSynchronizer<H>,
    listener: Option<ProjectionListener>,
    /// Index into the projected list
    selected: usize,
}

impl<H> PanelController<H>
where
    H: SceneHost + 'static,
{
    /// Mount the panel on a host.
    ///
    /// Registers the toggle menu, reads the viewer role, sizes the panel and
    /// starts following the host's items.
    pub async fn mount(host: Arc<H>, config: PanelConfig) -> PanelResult<Self> {
        let handler = Arc::new(ToggleSheetHandler::new(Arc::downgrade(&host)));
        host.create_context_menu(toggle_menu(), handler).await?;

        let role = match host.get_role().await {
            Ok(role) => role,
            Err(e) => {
                remove_menu_after_failure(host.as_ref()).await;
                return Err(e.into());
            }
        };
        host.set_height(config.height);
        host.set_width(config.width);

        let projection = Arc::new(SheetProjection::new());
        let listener = match projection.attach(Arc::clone(&host)).await {
            Ok(listener) => listener,
            Err(e) => {
                remove_menu_after_failure(host.as_ref()).await;
                return Err(e.into());
            }
        };

        let sync = EditSynchronizer::new(Arc::clone(&host), Arc::clone(&projection));
        info!(role = %role, sheets = projection.snapshot().len(), "Panel mounted");

        Ok(Self {
            host,
            config,
            role,
            projection,
            sync,
            listener: Some(listener),
            selected: 0,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// Current projected sheets, including those hidden from this viewer
    pub fn sheets(&self) -> Vec<CharacterSheet> {
        self.projection.snapshot()
    }

    /// Subscribe to projection changes
    pub fn subscribe(&self) -> watch::Receiver<Vec<CharacterSheet>> {
        self.projection.subscribe()
    }

    /// Select a tab by its index in the projected list
    pub fn select_tab(&mut self, index: usize) {
        debug!(index, "Tab selected");
        self.selected = index;
    }

    pub fn selected_tab(&self) -> usize {
        self.selected
    }

    /// Index of the sheet currently displayed, if any is visible
    pub fn displayed_tab(&self) -> Option<usize> {
        displayed_index(&self.projection.snapshot(), self.role, self.selected)
    }

    /// Render the current panel state
    pub fn view(&self) -> PanelView {
        build_view(&self.projection.snapshot(), self.role, self.selected, &self.config)
    }

    /// Refetch the host's items and reproject.
    ///
    /// The listener does this on every change; an explicit refresh lets a
    /// caller observe changes it just caused without waiting for the feed.
    pub async fn refresh(&self) -> PanelResult<()> {
        let items = self.host.get_items().await?;
        self.projection.apply_items(&items);
        Ok(())
    }

    /// Submit a sheet's edit form
    pub fn submit(&self, form: &FormSubmission) -> PanelResult<PendingSync> {
        let edit = SheetEdit::from_form(form)?;
        Ok(self.sync.submit(edit))
    }

    /// Stop following the host and remove the context menu
    pub async fn unmount(mut self) -> PanelResult<()> {
        if let Some(listener) = self.listener.take() {
            listener.stop();
        }
        self.host.remove_context_menu(&toggle_menu_id()).await?;
        info!("Panel unmounted");
        Ok(())
    }
}
