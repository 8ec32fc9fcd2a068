//! # Charsheet Panel
//!
//! Composes the sheet projection, toggle menu and edit synchronizer into a
//! renderer-agnostic panel: an avatar tab strip over content panes that
//! either embed a sheet URL or ask for one.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use charsheet_core::{MemoryScene, Role};
//! use charsheet_panel::{PanelConfig, PanelController};
//!
//! let scene = Arc::new(MemoryScene::new(Role::Gm));
//! let mut panel = PanelController::mount(scene, PanelConfig::default()).await?;
//! panel.select_tab(0);
//! println!("{}", serde_json::to_string_pretty(&panel.view())?);
//! panel.unmount().await?;
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod view;

pub use config::{DEFAULT_ISOLATED_HOSTS, PanelConfig};
pub use controller::PanelController;
pub use error::{PanelError, PanelResult};
pub use view::{
    Avatar, ContentPane, FrameSandbox, PaneContent, PanelView, build_view, displayed_index,
    is_visible, url_host,
};
