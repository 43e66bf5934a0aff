//! Icon registry: maps the icon keys used in the content feed to renderers.
//!
//! Feed items name their icon by key (`homeloan-icon`, `chat-icon`, ...).
//! Looking up a key that was never registered is an error, so a typo in the
//! feed is reported instead of rendering nothing.

use brokersite_shared::{BrokerSiteError, ContentFeed, Result};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Presentation hints passed to a renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconStyle {
    /// CSS class applied to the root element.
    pub class: String,
    /// Width and height in pixels.
    pub size: u32,
}

impl Default for IconStyle {
    fn default() -> Self {
        Self {
            class: "icon".into(),
            size: 24,
        }
    }
}

/// Something that can draw one icon.
pub trait IconRenderer: Send + Sync {
    /// Feed key this renderer answers to.
    fn key(&self) -> &str;

    /// Render the icon as inline SVG markup.
    fn render(&self, style: &IconStyle) -> String;
}

// ---------------------------------------------------------------------------
// Built-in icons
// ---------------------------------------------------------------------------

/// An icon drawn from a single SVG path on a 24x24 grid.
#[derive(Debug, Clone, Copy)]
pub struct PathIcon {
    pub key: &'static str,
    pub label: &'static str,
    pub path: &'static str,
}

impl IconRenderer for PathIcon {
    fn key(&self) -> &str {
        self.key
    }

    fn render(&self, style: &IconStyle) -> String {
        format!(
            r#"<svg class="{class}" width="{size}" height="{size}" viewBox="0 0 24 24" role="img" aria-label="{label}"><path d="{path}"/></svg>"#,
            class = style.class,
            size = style.size,
            label = self.label,
            path = self.path,
        )
    }
}

/// Icons every deployment of the site knows about.
pub const BUILTIN_ICONS: &[PathIcon] = &[
    PathIcon {
        key: "chat-icon",
        label: "Chat",
        path: "M4 4h16v12H7l-3 3z",
    },
    PathIcon {
        key: "search-icon",
        label: "Search",
        path: "M10 4a6 6 0 1 0 0 12a6 6 0 0 0 0-12zm5 11l5 5",
    },
    PathIcon {
        key: "checkmark-icon",
        label: "Approved",
        path: "M5 12l5 5L20 7",
    },
    PathIcon {
        key: "homeloan-icon",
        label: "Home loan",
        path: "M3 11l9-8l9 8v10H3z",
    },
    PathIcon {
        key: "refinance-icon",
        label: "Refinance",
        path: "M4 12a8 8 0 0 1 14-5l2-2v6h-6l2-2A6 6 0 0 0 6 12z",
    },
    PathIcon {
        key: "superfund-icon",
        label: "SMSF loan",
        path: "M4 20V10h4v10zm6 0V4h4v16zm6 0v-7h4v7z",
    },
    PathIcon {
        key: "auto-finance-icon",
        label: "Car finance",
        path: "M3 13l2-6h14l2 6v5H3zm3 5v2m12-2v2",
    },
    PathIcon {
        key: "debt-recon-icon",
        label: "Debt consolidation",
        path: "M4 6h16M4 12h10M4 18h6",
    },
    PathIcon {
        key: "property-dev-icon",
        label: "Property development",
        path: "M3 21V9l6-4v16m0 0h12V11l-6-3",
    },
    PathIcon {
        key: "property-insurance-icon",
        label: "Property insurance",
        path: "M12 3l8 3v6c0 5-4 8-8 9c-4-1-8-4-8-9V6z",
    },
    PathIcon {
        key: "self-employed-icon",
        label: "Self-employed loan",
        path: "M12 12a4 4 0 1 0 0-8a4 4 0 0 0 0 8zm-7 9a7 7 0 0 1 14 0",
    },
];

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered icon renderers in registration order.
pub struct IconRegistry {
    icons: Vec<Box<dyn IconRenderer>>,
}

impl IconRegistry {
    /// Create a registry with all built-in icons.
    pub fn new() -> Self {
        Self {
            icons: BUILTIN_ICONS
                .iter()
                .map(|icon| Box::new(*icon) as Box<dyn IconRenderer>)
                .collect(),
        }
    }

    /// Create a registry with no icons at all.
    pub fn empty() -> Self {
        Self { icons: Vec::new() }
    }

    /// Add a renderer. Fails if its key is already taken.
    pub fn register(&mut self, icon: Box<dyn IconRenderer>) -> Result<()> {
        if self.contains(icon.key()) {
            return Err(BrokerSiteError::validation(format!(
                "icon key '{}' is already registered",
                icon.key()
            )));
        }
        self.icons.push(icon);
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&dyn IconRenderer> {
        self.icons
            .iter()
            .find(|icon| icon.key() == key)
            .map(|icon| icon.as_ref())
    }

    /// Registered keys, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.icons.iter().map(|icon| icon.key())
    }

    /// Render the icon for `key`.
    pub fn render(&self, key: &str, style: &IconStyle) -> Result<String> {
        self.get(key)
            .map(|icon| icon.render(style))
            .ok_or_else(|| BrokerSiteError::validation(format!("unknown icon key '{key}'")))
    }

    /// Every icon key the feed references that this registry cannot render.
    /// Each unknown key is listed once, in first-seen order.
    pub fn validate_feed(&self, feed: &ContentFeed) -> Vec<String> {
        let mut unknown: Vec<String> = Vec::new();
        for key in feed.icon_keys() {
            if !self.contains(key) && !unknown.iter().any(|k| k == key) {
                unknown.push(key.to_string());
            }
        }
        unknown
    }
}

impl Default for IconRegistry {
    fn default() -> Self {
        Self::new()
    }
}
