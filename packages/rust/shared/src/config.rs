//! Application configuration for brokersite.
//!
//! User config lives at `~/.brokersite/brokersite.toml`.
//! CLI flags override environment variables, which override config file
//! values, which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BrokerSiteError, Result};
use crate::types::FEED_STORAGE_KEY;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "brokersite.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".brokersite";

// ---------------------------------------------------------------------------
// Config structs (matching brokersite.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote API endpoints.
    #[serde(default)]
    pub api: ApiConfig,

    /// Content feed caching and polling.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Bot verification.
    #[serde(default)]
    pub captcha: CaptchaConfig,

    /// Static site and business facts used as SEO fallbacks.
    #[serde(default)]
    pub site: SiteConfig,

    /// Per-page SEO override table.
    #[serde(default)]
    pub seo: SeoConfig,
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the content/mail API.
    #[serde(default = "default_api_host")]
    pub host: String,

    /// Name of the env var that overrides `host`.
    #[serde(default = "default_api_host_env")]
    pub host_env: String,

    /// Path of the content feed endpoint.
    #[serde(default = "default_feeds_path")]
    pub feeds_path: String,

    /// Path of the contact form endpoint.
    #[serde(default = "default_send_mail_path")]
    pub send_mail_path: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Header that carries the bot-verification token.
    #[serde(default = "default_captcha_header")]
    pub captcha_header: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            host_env: default_api_host_env(),
            feeds_path: default_feeds_path(),
            send_mail_path: default_send_mail_path(),
            timeout_secs: default_timeout_secs(),
            captcha_header: default_captcha_header(),
        }
    }
}

fn default_api_host() -> String {
    "https://data.stage.nepeanmortgage.com.au/api".into()
}
fn default_api_host_env() -> String {
    "BROKERSITE_API_HOST".into()
}
fn default_feeds_path() -> String {
    "/feeds".into()
}
fn default_send_mail_path() -> String {
    "/send-mail".into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_captcha_header() -> String {
    "X-HCaptcha-Token".into()
}

/// `[feed]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Key the feed mirror is stored under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Path of the local cache database.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// Minutes between background refetches.
    #[serde(default = "default_refetch_interval")]
    pub refetch_interval_mins: u64,

    /// Reject feeds that reference unknown icon keys instead of logging them.
    #[serde(default)]
    pub strict_icons: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            cache_path: default_cache_path(),
            refetch_interval_mins: default_refetch_interval(),
            strict_icons: false,
        }
    }
}

fn default_storage_key() -> String {
    FEED_STORAGE_KEY.into()
}
fn default_cache_path() -> String {
    "~/.brokersite/cache.db".into()
}
fn default_refetch_interval() -> u64 {
    5
}

/// `[captcha]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptchaConfig {
    /// Name of the env var holding the site key (never store the key itself).
    #[serde(default = "default_site_key_env")]
    pub site_key_env: String,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            site_key_env: default_site_key_env(),
        }
    }
}

fn default_site_key_env() -> String {
    "BROKERSITE_HCAPTCHA_SITE_KEY".into()
}

/// `[site]` section: static facts that never come from the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Business name used when the feed has none.
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Public origin of the site, without a trailing slash.
    #[serde(default = "default_site_url")]
    pub url: String,

    /// Document title template; the first `%s` is the page, the second the site.
    #[serde(default = "default_title_template")]
    pub title_template: String,

    #[serde(default = "default_site_title")]
    pub default_title: String,

    #[serde(default = "default_site_description")]
    pub default_description: String,

    #[serde(default = "default_site_keywords")]
    pub default_keywords: Vec<String>,

    #[serde(default = "default_legal_name")]
    pub legal_name: String,

    #[serde(default = "default_locality")]
    pub locality: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_country")]
    pub country: String,

    #[serde(default = "default_locale")]
    pub locale: String,

    #[serde(default = "default_service_areas")]
    pub service_areas: Vec<String>,

    #[serde(default)]
    pub social: SocialLinks,

    #[serde(default)]
    pub og_image: OgImage,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            url: default_site_url(),
            title_template: default_title_template(),
            default_title: default_site_title(),
            default_description: default_site_description(),
            default_keywords: default_site_keywords(),
            legal_name: default_legal_name(),
            locality: default_locality(),
            region: default_region(),
            country: default_country(),
            locale: default_locale(),
            service_areas: default_service_areas(),
            social: SocialLinks::default(),
            og_image: OgImage::default(),
        }
    }
}

fn default_site_name() -> String {
    "Nepean Mortgage".into()
}
fn default_site_url() -> String {
    "https://nepeanmortgage.com.au".into()
}
fn default_title_template() -> String {
    "%s | %s".into()
}
fn default_site_title() -> String {
    "Expert Mortgage Broker Services".into()
}
fn default_site_description() -> String {
    "Professional mortgage broker services. Get expert advice on home loans, refinancing, \
     and investment property loans with competitive rates."
        .into()
}
fn default_site_keywords() -> Vec<String> {
    [
        "mortgage broker",
        "home loans",
        "mortgage refinancing",
        "first home buyer",
        "investment property loans",
        "mortgage calculator",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_legal_name() -> String {
    "Nepean Mortgage Pty Ltd".into()
}
fn default_locality() -> String {
    "Nepean".into()
}
fn default_region() -> String {
    "NSW".into()
}
fn default_country() -> String {
    "AU".into()
}
fn default_locale() -> String {
    "en_AU".into()
}
fn default_service_areas() -> Vec<String> {
    ["Nepean", "Penrith", "Blue Mountains", "Western Sydney", "NSW"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// `[site.social]` profile links. Empty strings are skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub instagram: String,
}

impl SocialLinks {
    /// Non-empty profile URLs, for `sameAs`.
    pub fn links(&self) -> Vec<String> {
        [&self.facebook, &self.linkedin, &self.twitter, &self.instagram]
            .into_iter()
            .filter(|l| !l.is_empty())
            .cloned()
            .collect()
    }
}

/// `[site.og_image]` default social preview image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OgImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub alt: String,
}

impl Default for OgImage {
    fn default() -> Self {
        Self {
            url: "/og-image.jpg".into(),
            width: 1200,
            height: 630,
            alt: "Professional Mortgage Broker Services".into(),
        }
    }
}

/// `[seo]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeoConfig {
    /// Static per-page overrides keyed by page key (`home`, `faq`, ...).
    #[serde(default)]
    pub pages: BTreeMap<String, PageOverride>,
}

/// `[seo.pages.<key>]` row. Unset fields fall through to lower layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_index: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_follow: Option<bool>,
}

// ---------------------------------------------------------------------------
// API settings (runtime, merged from config + env + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime API settings, with the host already resolved and parsed.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Base URL; endpoint paths are appended to it verbatim.
    pub base_url: Url,
    pub feeds_path: String,
    pub send_mail_path: String,
    pub timeout: Duration,
    pub captcha_header: String,
}

impl ApiSettings {
    /// Resolve settings: `cli_host` beats the env var named by
    /// `api.host_env`, which beats `api.host`.
    pub fn resolve(config: &AppConfig, cli_host: Option<&str>) -> Result<Self> {
        let env_host = std::env::var(&config.api.host_env)
            .ok()
            .filter(|v| !v.trim().is_empty());

        let host = cli_host
            .map(String::from)
            .or(env_host)
            .unwrap_or_else(|| config.api.host.clone());

        let base_url = Url::parse(host.trim_end_matches('/')).map_err(|e| {
            BrokerSiteError::config(format!("invalid API host '{host}': {e}"))
        })?;

        Ok(Self {
            base_url,
            feeds_path: config.api.feeds_path.clone(),
            send_mail_path: config.api.send_mail_path.clone(),
            timeout: Duration::from_secs(config.api.timeout_secs),
            captcha_header: config.api.captcha_header.clone(),
        })
    }

    /// Full URL of an endpoint path (`/feeds` → `{host}/feeds`).
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

impl FeedConfig {
    pub fn refetch_interval(&self) -> Duration {
        Self::interval_from_mins(self.refetch_interval_mins)
    }

    /// Polling interval for `mins` minutes, at least one minute. Saturates
    /// instead of overflowing on huge values.
    pub fn interval_from_mins(mins: u64) -> Duration {
        Duration::from_secs(mins.max(1).saturating_mul(60))
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.brokersite/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BrokerSiteError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.brokersite/brokersite.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BrokerSiteError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        BrokerSiteError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BrokerSiteError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BrokerSiteError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BrokerSiteError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~/` against the user's home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| BrokerSiteError::config("could not determine home directory"))?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

/// Read the bot-verification site key from the env var named in config.
pub fn captcha_site_key(config: &AppConfig) -> Option<String> {
    std::env::var(&config.captcha.site_key_env)
        .ok()
        .filter(|v| !v.is_empty())
}
