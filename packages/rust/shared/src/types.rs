//! Core domain types: the content feed, API envelopes, and contact submissions.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Storage key under which the content feed mirror is persisted.
pub const FEED_STORAGE_KEY: &str = "mortgage_api_data";

/// Envelope `status` value the API uses for success.
pub const STATUS_SUCCESS: &str = "success";

// ---------------------------------------------------------------------------
// ContentFeed
// ---------------------------------------------------------------------------

/// The JSON document describing all marketing copy shown on the site.
///
/// Every section defaults when absent so that a partial feed still loads.
/// A feed is replaced wholesale on refresh and never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentFeed {
    /// Business name.
    pub name: String,
    /// Site title shown in the browser tab.
    pub site_title: String,
    pub assets: Assets,
    pub hero_section: HeroSection,
    pub about: About,
    pub faq: FaqSection,
    pub process: ProcessSection,
    pub services: ServiceSection,
    pub banking_partners: Vec<BankingPartner>,
    pub footer: Footer,
}

/// Logo and profile image URLs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Assets {
    pub logo: String,
    pub logo_inverted: String,
    pub profile: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroSection {
    pub title: String,
    pub description: String,
    pub banner: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct About {
    pub title: String,
    pub description: String,
    pub profile: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqSection {
    pub title: String,
    pub description: String,
    pub items: Vec<FaqItem>,
}

/// A single question/answer pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqItem {
    pub key: String,
    /// The question.
    pub title: String,
    /// The answer.
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessSection {
    pub title: String,
    pub description: String,
    pub items: Vec<ProcessStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessStep {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Icon registry key.
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    pub title: String,
    pub description: String,
    pub items: Vec<ServiceItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceItem {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Icon registry key.
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankingPartner {
    pub id: String,
    pub name: String,
    pub logo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Footer {
    pub info: String,
    pub contact: FooterContact,
    pub copyright: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterContact {
    pub email: String,
    pub phone: String,
}

impl ContentFeed {
    /// Look up a service by its feed id.
    pub fn service(&self, id: &str) -> Option<&ServiceItem> {
        self.services.items.iter().find(|s| s.id == id)
    }

    /// Every icon key referenced by the feed, in document order.
    pub fn icon_keys(&self) -> impl Iterator<Item = &str> {
        self.services
            .items
            .iter()
            .map(|s| s.icon.as_str())
            .chain(self.process.items.iter().map(|p| p.icon.as_str()))
            .filter(|k| !k.is_empty())
    }
}

/// SHA-256 hex digest of a serialized feed, used to tell whether a refetch
/// actually changed anything.
pub fn content_hash(json: &str) -> String {
    let digest = Sha256::digest(json.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// API envelopes
// ---------------------------------------------------------------------------

/// Response body of `GET /feeds`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEnvelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<ContentFeed>,
}

/// Response body of `POST /send-mail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Whether an envelope status string means success.
pub fn is_success_status(status: &str) -> bool {
    status.eq_ignore_ascii_case(STATUS_SUCCESS)
}

impl ContactResponse {
    pub fn is_success(&self) -> bool {
        is_success_status(&self.status)
    }
}

// ---------------------------------------------------------------------------
// ContactSubmission
// ---------------------------------------------------------------------------

/// A user-filled contact form. Posted once per submit, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: Option<String>,
    /// Bot-verification token, sent as a header rather than in the body.
    pub verification_token: Option<String>,
}

/// JSON body of `POST /send-mail`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactPayload<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
}

impl ContactSubmission {
    /// Build the wire body. An empty message is omitted entirely.
    pub fn payload(&self) -> ContactPayload<'_> {
        ContactPayload {
            name: &self.name,
            phone: &self.phone,
            email: &self.email,
            message: self.message.as_deref().filter(|m| !m.is_empty()),
        }
    }

    /// The verification token, if non-empty.
    pub fn token(&self) -> Option<&str> {
        self.verification_token.as_deref().filter(|t| !t.is_empty())
    }
}
