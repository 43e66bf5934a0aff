//! Sitemap entries, `sitemap.xml`, and `robots.txt`.

use brokersite_shared::ContentFeed;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::page::PageKey;
use super::resolver::SeoResolver;

/// How often a page is expected to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Weekly,
    Monthly,
    Yearly,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    pub url: String,
    pub last_modified: DateTime<Utc>,
    pub change_frequency: ChangeFreq,
    pub priority: f32,
}

/// Crawl priority and change frequency for a page. `None` for pages that do
/// not belong in the sitemap.
pub fn page_rank(key: &PageKey) -> Option<(f32, ChangeFreq)> {
    match key {
        PageKey::Home => Some((1.0, ChangeFreq::Weekly)),
        PageKey::Services => Some((0.9, ChangeFreq::Monthly)),
        PageKey::About | PageKey::Contact => Some((0.8, ChangeFreq::Monthly)),
        PageKey::Calculators => Some((0.7, ChangeFreq::Monthly)),
        PageKey::Faq => Some((0.6, ChangeFreq::Monthly)),
        PageKey::PrivacyPolicy | PageKey::WebsitePolicy | PageKey::FeedbackAndComplaints => {
            Some((0.3, ChangeFreq::Yearly))
        }
        PageKey::NotFound | PageKey::Custom(_) => None,
    }
}

/// Every public page, plus one entry per feed service when a feed is given.
/// Locations are the resolved canonical URLs, so config overrides apply.
pub fn entries(
    resolver: &SeoResolver,
    feed: Option<&ContentFeed>,
    last_modified: DateTime<Utc>,
) -> Vec<SitemapEntry> {
    let mut out: Vec<SitemapEntry> = PageKey::KNOWN
        .iter()
        .filter_map(|key| {
            page_rank(key).map(|(priority, change_frequency)| SitemapEntry {
                url: resolver.resolve(key, feed, None).page.canonical_url,
                last_modified,
                change_frequency,
                priority,
            })
        })
        .collect();

    if let Some(feed) = feed {
        out.extend(
            feed.services
                .items
                .iter()
                .filter(|s| !s.id.is_empty())
                .map(|s| SitemapEntry {
                    url: resolver
                        .resolve_service(&s.id, Some(feed), None)
                        .page
                        .canonical_url,
                    last_modified,
                    change_frequency: ChangeFreq::Monthly,
                    priority: 0.7,
                }),
        );
    }

    out
}

/// Render entries as a `urlset` document.
pub fn to_xml(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.url)));
        xml.push_str(&format!(
            "    <lastmod>{}</lastmod>\n",
            entry.last_modified.format("%Y-%m-%d")
        ));
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            entry.change_frequency.as_str()
        ));
        xml.push_str(&format!("    <priority>{:.1}</priority>\n", entry.priority));
        xml.push_str("  </url>\n");
    }
    xml.push_str("</urlset>\n");
    xml
}

/// `robots.txt` body that allows everything and points at the sitemap.
pub fn robots_txt(site_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\n\nSitemap: {}/sitemap.xml\n",
        site_url.trim_end_matches('/')
    )
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
