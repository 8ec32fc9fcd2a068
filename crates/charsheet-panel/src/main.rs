//! Character sheet panel driver
//!
//! Mounts the panel on an in-memory scene loaded from JSON, replays menu
//! clicks and form submissions, and prints the resulting view as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Show the panel for a player
//! charsheet-panel --scene scene.json --role player
//!
//! # Attach sheets to two tokens, give one a URL, show it
//! charsheet-panel --scene scene.json --role gm \
//!     --toggle hero,ally \
//!     --edit id=hero,url=https://www.5esrd.com/hero,gm_only=on \
//!     --select 0
//!
//! # Debug logging
//! RUST_LOG=debug charsheet-panel --scene scene.json --pretty
//! ```

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use charsheet_core::{FormSubmission, ItemId, MemoryScene, Role, SceneItem, form_fields, toggle_menu_id};
use charsheet_logging::{LogConfig, PanelSubscriberBuilder, ViewerContextGuard};
use charsheet_panel::{PanelConfig, PanelController};
use clap::{Parser, ValueEnum};
use tracing::{Instrument, info, warn};

#[derive(Parser, Debug)]
#[command(name = "charsheet-panel")]
#[command(about = "Drive the character sheet panel against a scene file")]
#[command(version)]
struct Args {
    /// JSON array of scene items
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Role of the viewer
    #[arg(short, long, value_enum, default_value = "player")]
    role: RoleArg,

    /// Panel config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Click the toggle menu on comma-separated item ids (repeatable)
    #[arg(short, long, value_name = "ID,ID,...")]
    toggle: Vec<String>,

    /// Submit a sheet form: id=<id>,url=<url>[,gm_only=on] (repeatable)
    #[arg(short, long, value_name = "FIELDS")]
    edit: Vec<String>,

    /// Tab index to select before rendering
    #[arg(long)]
    select: Option<usize>,

    /// Use pretty console output instead of JSONL
    #[arg(short, long)]
    pretty: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RoleArg {
    Gm,
    Player,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Gm => Role::Gm,
            RoleArg::Player => Role::Player,
        }
    }
}

/// Item ids of one `--toggle` value
fn parse_selection(raw: &str) -> Result<Vec<ItemId>> {
    let ids: Vec<ItemId> = raw
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ItemId::from)
        .collect();
    if ids.is_empty() {
        bail!("empty selection: {:?}", raw);
    }
    Ok(ids)
}

/// Form fields of one `--edit` value
fn parse_edit(raw: &str) -> Result<FormSubmission> {
    raw.split(',')
        .map(|pair| -> Result<(&'static str, String)> {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("expected key=value, got {:?}", pair))?;
            let key = match key.trim() {
                "gm_only" | "gmOnly" => form_fields::GM_ONLY,
                "id" => form_fields::ID,
                "url" => form_fields::URL,
                other => bail!("unknown edit field {:?}", other),
            };
            Ok((key, value.trim().to_string()))
        })
        .collect()
}

fn load_scene(path: Option<&PathBuf>) -> Result<Vec<SceneItem>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = fs::read_to_string(path).with_context(|| format!("reading scene {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing scene {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_config = if args.pretty {
        LogConfig::development()
    } else {
        LogConfig::default()
    };
    let _log_guard = PanelSubscriberBuilder::new()
        .with_config(log_config)
        .with_level(&args.level)
        .init();

    let role = Role::from(args.role);
    let viewer = ViewerContextGuard::new(role);
    let span = ViewerContextGuard::current().map_or_else(tracing::Span::none, |ctx| ctx.span());

    let result = run(args, role).instrument(span).await;
    drop(viewer);
    result
}

async fn run(args: Args, role: Role) -> Result<()> {
    let config = match &args.config {
        Some(path) => PanelConfig::from_file(path)?,
        None => PanelConfig::default(),
    };
    let items = load_scene(args.scene.as_ref())?;
    info!(items = items.len(), "Scene loaded");

    let scene = Arc::new(MemoryScene::with_items(role, items));
    let mut panel = PanelController::mount(Arc::clone(&scene), config).await?;

    for raw in &args.toggle {
        let selection = parse_selection(raw)?;
        match scene.click_context_menu(&toggle_menu_id(), &selection, role).await? {
            Some(label) => info!(action = %label, items = selection.len(), "Menu clicked"),
            None => warn!(selection = %raw, "Toggle menu not available for selection"),
        }
    }
    panel.refresh().await?;

    for raw in &args.edit {
        let form = parse_edit(raw)?;
        let pending = panel.submit(&form)?;
        match pending.settled().await {
            Ok(true) => {}
            Ok(false) => warn!(edit = %raw, "Edited item carries no sheet"),
            Err(e) => warn!(edit = %raw, error = %e, "Edit not synchronized"),
        }
    }
    panel.refresh().await?;

    if let Some(index) = args.select {
        panel.select_tab(index);
    }

    println!("{}", serde_json::to_string_pretty(&panel.view())?);

    panel.unmount().await?;
    Ok(())
}
