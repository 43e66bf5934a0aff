//! SEO value types: page keys, resolved pages, patches, and provenance.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use brokersite_shared::PageOverride;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PageKey
// ---------------------------------------------------------------------------

/// Identifies a page for metadata lookup. Any string is a valid key;
/// unrecognised ones become [`PageKey::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageKey {
    Home,
    About,
    Services,
    Calculators,
    Contact,
    Faq,
    PrivacyPolicy,
    WebsitePolicy,
    FeedbackAndComplaints,
    NotFound,
    Custom(String),
}

impl PageKey {
    /// Pages with their own fallback copy, in sitemap order.
    pub const KNOWN: [PageKey; 10] = [
        PageKey::Home,
        PageKey::About,
        PageKey::Services,
        PageKey::Calculators,
        PageKey::Contact,
        PageKey::Faq,
        PageKey::PrivacyPolicy,
        PageKey::WebsitePolicy,
        PageKey::FeedbackAndComplaints,
        PageKey::NotFound,
    ];

    pub fn parse(key: &str) -> Self {
        match key.trim().trim_matches('/') {
            "" | "home" => PageKey::Home,
            "about" => PageKey::About,
            "services" => PageKey::Services,
            "calculators" => PageKey::Calculators,
            "contact" => PageKey::Contact,
            "faq" => PageKey::Faq,
            "privacy-policy" => PageKey::PrivacyPolicy,
            "website-policy" => PageKey::WebsitePolicy,
            "feedback-and-complaints" => PageKey::FeedbackAndComplaints,
            "not-found" | "404" => PageKey::NotFound,
            other => PageKey::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PageKey::Home => "home",
            PageKey::About => "about",
            PageKey::Services => "services",
            PageKey::Calculators => "calculators",
            PageKey::Contact => "contact",
            PageKey::Faq => "faq",
            PageKey::PrivacyPolicy => "privacy-policy",
            PageKey::WebsitePolicy => "website-policy",
            PageKey::FeedbackAndComplaints => "feedback-and-complaints",
            PageKey::NotFound => "not-found",
            PageKey::Custom(key) => key,
        }
    }

    /// URL path segment under the site root (empty for home).
    pub fn path_segment(&self) -> &str {
        match self {
            PageKey::Home => "",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for PageKey {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// SeoPage / SeoPatch
// ---------------------------------------------------------------------------

/// Fully resolved metadata for one page. Every field is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoPage {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub canonical_url: String,
    pub og_image: String,
    pub og_type: String,
    pub h1: String,
    /// schema.org JSON-LD objects.
    pub structured_data: Vec<serde_json::Value>,
    pub no_index: bool,
    pub no_follow: bool,
}

/// A partial set of page metadata supplied by one layer.
///
/// Empty strings and empty lists are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_index: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_follow: Option<bool>,
}

impl SeoPatch {
    /// Drop blank strings and empty lists so they fall through to the next layer.
    pub fn normalized(mut self) -> Self {
        fn text(value: &mut Option<String>) {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *value = None;
            }
        }
        fn list<T>(value: &mut Option<Vec<T>>) {
            if value.as_ref().is_some_and(|v| v.is_empty()) {
                *value = None;
            }
        }

        text(&mut self.title);
        text(&mut self.description);
        text(&mut self.canonical_url);
        text(&mut self.og_image);
        text(&mut self.og_type);
        text(&mut self.h1);
        list(&mut self.structured_data);
        if let Some(keywords) = self.keywords.as_mut() {
            keywords.retain(|k| !k.trim().is_empty());
        }
        list(&mut self.keywords);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<&PageOverride> for SeoPatch {
    fn from(row: &PageOverride) -> Self {
        Self {
            title: row.title.clone(),
            description: row.description.clone(),
            keywords: row.keywords.clone(),
            canonical_url: row.canonical_url.clone(),
            og_image: row.og_image.clone(),
            og_type: row.og_type.clone(),
            h1: row.h1.clone(),
            structured_data: None,
            no_index: row.no_index,
            no_follow: row.no_follow,
        }
    }
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// A source in the resolution order, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Override,
    Table,
    Feed,
    Fallback,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Override => "override",
            Layer::Table => "table",
            Layer::Feed => "feed",
            Layer::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolvable field of [`SeoPage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    Description,
    Keywords,
    CanonicalUrl,
    OgImage,
    OgType,
    H1,
    StructuredData,
    NoIndex,
    NoFollow,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Title,
        Field::Description,
        Field::Keywords,
        Field::CanonicalUrl,
        Field::OgImage,
        Field::OgType,
        Field::H1,
        Field::StructuredData,
        Field::NoIndex,
        Field::NoFollow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Keywords => "keywords",
            Field::CanonicalUrl => "canonicalUrl",
            Field::OgImage => "ogImage",
            Field::OgType => "ogType",
            Field::H1 => "h1",
            Field::StructuredData => "structuredData",
            Field::NoIndex => "noIndex",
            Field::NoFollow => "noFollow",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved page plus the layer each field came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSeo {
    pub page: SeoPage,
    pub origins: BTreeMap<Field, Layer>,
}

impl ResolvedSeo {
    /// Layer that supplied `field`. Every field has one.
    pub fn origin(&self, field: Field) -> Layer {
        self.origins.get(&field).copied().unwrap_or(Layer::Fallback)
    }
}
