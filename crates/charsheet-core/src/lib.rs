//! # Charsheet Core
//!
//! Core types and logic for the character sheet panel.
//!
//! The host application owns the scene and synchronizes its items across
//! clients. This crate derives a list of character sheets from those items,
//! keeps it current as the scene changes, and writes sheet edits back.
//!
//! ## Key Traits
//!
//! - [`SceneHost`]: Narrow async interface to the host's scene, role and menus
//! - [`ContextMenuHandler`]: Click handler attached to a registered context menu
//!
//! ## Key Types
//!
//! - [`SceneItem`]: An item placed on the tabletop, as delivered by the host
//! - [`CharacterSheetMetadata`]: The record stored under [`METADATA_KEY`]
//! - [`CharacterSheet`]: A derived view entry, one per attached item
//! - [`SheetProjection`]: Reactive holder of the current sheet list
//! - [`EditSynchronizer`]: Applies form edits locally and to the host
//! - [`MemoryScene`]: In-process host used by tests and the CLI driver

pub mod commands;
pub mod error;
pub mod host;
pub mod item;
pub mod memory_host;
pub mod menu;
pub mod metadata;
pub mod projection;
pub mod sync;

// Re-export main types
pub use commands::*;
pub use error::*;
pub use host::*;
pub use item::*;
pub use memory_host::*;
pub use menu::*;
pub use metadata::*;
pub use projection::*;
pub use sync::*;
