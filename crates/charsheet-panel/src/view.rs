//! Renderer-agnostic view model of the panel.
//!
//! The panel is an avatar tab strip over a stack of content panes. Every
//! visible sheet has a pane; exactly one is displayed, the rest stay mounted
//! and hidden so their state survives tab switches.

use charsheet_core::{CharacterSheet, ItemId, Role};
use serde::Serialize;
use url::Url;

use crate::config::PanelConfig;

/// Whether a viewer with `role` may see `sheet`
pub fn is_visible(sheet: &CharacterSheet, role: Role) -> bool {
    !sheet.gm_only || role.is_gm()
}

/// One avatar in the tab strip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    pub id: ItemId,
    /// Position in the projected list, used as the tab index
    pub index: usize,
    pub image: String,
    pub name: String,
    pub selected: bool,
}

/// Sandbox applied to an embedded sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameSandbox {
    /// Scripts only; no same-origin, forms, popups or navigation
    AllowScripts,
    Unrestricted,
}

impl FrameSandbox {
    /// Value of the frame's `sandbox` attribute, if any
    pub fn attribute(self) -> Option<&'static str> {
        match self {
            FrameSandbox::AllowScripts => Some("allow-scripts"),
            FrameSandbox::Unrestricted => None,
        }
    }

    /// Sandbox for a sheet URL given the hosts that require isolation.
    ///
    /// A URL is isolated when its host, as a browser would resolve it,
    /// contains any of the fragments (case-insensitive). URLs that do not
    /// parse or have no host are never isolated.
    pub fn for_url(url: &str, isolated_hosts: &[String]) -> Self {
        let Some(host) = url_host(url) else {
            return FrameSandbox::Unrestricted;
        };
        let isolated = isolated_hosts
            .iter()
            .filter(|fragment| !fragment.is_empty())
            .any(|fragment| host.contains(&fragment.to_ascii_lowercase()));
        if isolated {
            FrameSandbox::AllowScripts
        } else {
            FrameSandbox::Unrestricted
        }
    }
}

/// Lowercased host of an absolute URL, parsed with WHATWG rules
pub fn url_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed.host_str().map(str::to_ascii_lowercase)
}

/// What a content pane renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaneContent {
    /// Sheet without a URL yet: url field, GM-only switch and save button
    #[serde(rename_all = "camelCase")]
    EditForm { id: ItemId, url: String, gm_only: bool },
    /// Embedded external sheet
    #[serde(rename_all = "camelCase")]
    Frame {
        url: String,
        sandbox: FrameSandbox,
        width: u32,
        height: u32,
    },
}

/// One mounted content pane
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPane {
    pub id: ItemId,
    pub displayed: bool,
    pub content: PaneContent,
}

/// Complete panel state for one render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub role: Role,
    pub avatars: Vec<Avatar>,
    /// Visible sheets beyond the avatar limit
    pub hidden_avatars: usize,
    pub panes: Vec<ContentPane>,
}

impl PanelView {
    /// The pane currently shown
    pub fn displayed_pane(&self) -> Option<&ContentPane> {
        self.panes.iter().find(|pane| pane.displayed)
    }

    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }
}

/// Index of the sheet to display: the selected one when visible, otherwise
/// the first visible sheet.
pub fn displayed_index(sheets: &[CharacterSheet], role: Role, selected: usize) -> Option<usize> {
    match sheets.get(selected) {
        Some(sheet) if is_visible(sheet, role) => Some(selected),
        _ => sheets.iter().position(|sheet| is_visible(sheet, role)),
    }
}

fn pane_content(sheet: &CharacterSheet, config: &PanelConfig) -> PaneContent {
    if sheet.is_pending() {
        PaneContent::EditForm {
            id: sheet.id.clone(),
            url: sheet.url.clone(),
            gm_only: sheet.gm_only,
        }
    } else {
        PaneContent::Frame {
            url: sheet.url.clone(),
            sandbox: FrameSandbox::for_url(&sheet.url, &config.isolated_hosts),
            width: config.frame_width,
            height: config.frame_height,
        }
    }
}

/// Build the view for the projected sheets
pub fn build_view(sheets: &[CharacterSheet], role: Role, selected: usize, config: &PanelConfig) -> PanelView {
    let displayed = displayed_index(sheets, role, selected);
    let visible: Vec<(usize, &CharacterSheet)> = sheets
        .iter()
        .enumerate()
        .filter(|(_, sheet)| is_visible(sheet, role))
        .collect();

    let avatars: Vec<Avatar> = visible
        .iter()
        .take(config.avatar_limit)
        .map(|&(index, sheet)| Avatar {
            id: sheet.id.clone(),
            index,
            image: sheet.image.clone(),
            name: sheet.name.clone(),
            selected: Some(index) == displayed,
        })
        .collect();
    let hidden_avatars = visible.len() - avatars.len();

    let panes = visible
        .iter()
        .map(|&(index, sheet)| ContentPane {
            id: sheet.id.clone(),
            displayed: Some(index) == displayed,
            content: pane_content(sheet, config),
        })
        .collect();

    PanelView {
        role,
        avatars,
        hidden_avatars,
        panes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(id: &str, url: &str, gm_only: bool) -> CharacterSheet {
        CharacterSheet {
            id: ItemId::new(id),
            url: url.to_string(),
            image: format!("{}.png", id),
            name: id.to_uppercase(),
            gm_only,
        }
    }

    fn sheets() -> Vec<CharacterSheet> {
        vec![
            sheet("a", "", false),
            sheet("b", "https://www.5esrd.com/sheet/1", true),
            sheet("c", "https://docs.example/c", false),
        ]
    }

    #[test]
    fn test_visibility_rule() {
        let secret = sheet("s", "", true);
        let open = sheet("o", "", false);
        assert!(is_visible(&secret, Role::Gm));
        assert!(!is_visible(&secret, Role::Player));
        assert!(is_visible(&open, Role::Gm));
        assert!(is_visible(&open, Role::Player));
    }

    #[test]
    fn test_url_host() {
        assert_eq!(url_host("https://www.5esrd.com/sheet?x=1").as_deref(), Some("www.5esrd.com"));
        assert_eq!(url_host("http://user:pw@Example.org:8080/a").as_deref(), Some("example.org"));
        assert_eq!(url_host("http://[::1]:3000/").as_deref(), Some("[::1]"));
        assert_eq!(url_host("example.com/path"), None);
        assert_eq!(url_host(""), None);
    }

    #[test]
    fn test_sandbox_matches_host_only() {
        let isolated = vec!["5esrd".to_string()];
        assert_eq!(
            FrameSandbox::for_url("https://www.5ESRD.com/x", &isolated),
            FrameSandbox::AllowScripts
        );
        assert_eq!(
            FrameSandbox::for_url("https://docs.example/5esrd/page", &isolated),
            FrameSandbox::Unrestricted
        );
        assert_eq!(FrameSandbox::for_url("https://a.example", &[]), FrameSandbox::Unrestricted);
        assert_eq!(FrameSandbox::for_url("not a url", &isolated), FrameSandbox::Unrestricted);
        assert_eq!(FrameSandbox::AllowScripts.attribute(), Some("allow-scripts"));
        assert_eq!(FrameSandbox::Unrestricted.attribute(), None);
    }

    #[test]
    fn test_sandbox_follows_browser_host_resolution() {
        let isolated = vec!["5esrd".to_string()];

        // Backslash ends the host for http(s); the browser loads www.5esrd.com
        let url = r"https://www.5esrd.com\@evil.example/sheet";
        assert_eq!(url_host(url).as_deref(), Some("www.5esrd.com"));
        assert_eq!(FrameSandbox::for_url(url, &isolated), FrameSandbox::AllowScripts);

        // Userinfo naming the isolated host does not isolate another host
        let url = "https://www.5esrd.com@evil.example/sheet";
        assert_eq!(url_host(url).as_deref(), Some("evil.example"));
        assert_eq!(FrameSandbox::for_url(url, &isolated), FrameSandbox::Unrestricted);
    }

    #[test]
    fn test_gm_sees_everything() {
        let view = build_view(&sheets(), Role::Gm, 1, &PanelConfig::default());

        assert_eq!(view.avatars.len(), 3);
        assert_eq!(view.panes.len(), 3);
        assert!(view.avatars[1].selected);
        assert_eq!(view.displayed_pane().unwrap().id, ItemId::new("b"));
        assert_eq!(
            view.panes[1].content,
            PaneContent::Frame {
                url: "https://www.5esrd.com/sheet/1".to_string(),
                sandbox: FrameSandbox::AllowScripts,
                width: 450,
                height: 800,
            }
        );
        assert_eq!(
            view.panes[0].content,
            PaneContent::EditForm {
                id: ItemId::new("a"),
                url: String::new(),
                gm_only: false,
            }
        );
    }

    #[test]
    fn test_player_filtered_and_falls_back() {
        // Selected sheet is GM-only, so the first visible one is shown
        let view = build_view(&sheets(), Role::Player, 1, &PanelConfig::default());

        let ids: Vec<&str> = view.panes.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(view.avatars.iter().map(|a| a.index).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(view.panes.iter().filter(|p| p.displayed).count(), 1);
        assert!(view.panes[0].displayed);
        assert!(view.avatars[0].selected);
    }

    #[test]
    fn test_out_of_range_selection() {
        let view = build_view(&sheets(), Role::Player, 99, &PanelConfig::default());
        assert_eq!(view.displayed_pane().unwrap().id, ItemId::new("a"));

        let empty = build_view(&[], Role::Gm, 0, &PanelConfig::default());
        assert!(empty.is_empty());
        assert!(empty.displayed_pane().is_none());
    }

    #[test]
    fn test_avatar_limit() {
        let config = PanelConfig::default().with_avatar_limit(2);
        let view = build_view(&sheets(), Role::Gm, 2, &config);

        assert_eq!(view.avatars.len(), 2);
        assert_eq!(view.hidden_avatars, 1);
        // Panes are not limited
        assert_eq!(view.panes.len(), 3);
        assert!(view.panes[2].displayed);
    }

    #[test]
    fn test_view_serializes() {
        let view = build_view(&sheets()[..2], Role::Gm, 0, &PanelConfig::default());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["role"], "GM");
        assert_eq!(json["hiddenAvatars"], 0);
        assert_eq!(json["panes"][0]["content"]["kind"], "editForm");
        assert_eq!(json["panes"][0]["content"]["gmOnly"], false);
        assert_eq!(json["panes"][1]["content"]["kind"], "frame");
        assert_eq!(json["panes"][1]["content"]["sandbox"], "allow-scripts");
    }
}
