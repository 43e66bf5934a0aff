//! Shared types, error model, and configuration for brokersite.
//!
//! This crate is the foundation depended on by all other brokersite crates.
//! It provides:
//! - [`BrokerSiteError`]: the unified error type
//! - Domain types ([`ContentFeed`], [`ContactSubmission`], API envelopes)
//! - Configuration ([`AppConfig`], [`ApiSettings`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, ApiSettings, AppConfig, CaptchaConfig, FeedConfig, OgImage, PageOverride,
    SeoConfig, SiteConfig, SocialLinks, captcha_site_key, config_dir, config_file_path,
    expand_home, init_config, load_config, load_config_from,
};
pub use error::{BrokerSiteError, Result};
pub use types::{
    About, Assets, BankingPartner, ContactPayload, ContactResponse, ContactSubmission,
    ContentFeed, FEED_STORAGE_KEY, FaqItem, FaqSection, FeedEnvelope, Footer, FooterContact,
    HeroSection, ProcessSection, ProcessStep, STATUS_SUCCESS, ServiceItem, ServiceSection,
    content_hash, is_success_status,
};
