//! `<head>` tag sets: Open Graph, Twitter card, robots.

use brokersite_shared::SiteConfig;

use super::page::SeoPage;

/// Ordered `(property, content)` pairs.
pub type TagList = Vec<(&'static str, String)>;

/// Resolve a possibly site-relative URL against the site origin.
pub fn absolute_url(site: &SiteConfig, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!(
            "{}/{}",
            site.url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

/// Open Graph properties for `page`.
pub fn open_graph(page: &SeoPage, site: &SiteConfig, site_name: &str) -> TagList {
    vec![
        ("og:title", page.title.clone()),
        ("og:description", page.description.clone()),
        ("og:type", page.og_type.clone()),
        ("og:url", page.canonical_url.clone()),
        ("og:site_name", site_name.to_string()),
        ("og:locale", site.locale.clone()),
        ("og:image", absolute_url(site, &page.og_image)),
        ("og:image:width", site.og_image.width.to_string()),
        ("og:image:height", site.og_image.height.to_string()),
        ("og:image:alt", format!("{site_name} - {}", site.og_image.alt)),
    ]
}

/// Twitter card properties for `page`.
pub fn twitter_card(page: &SeoPage, site: &SiteConfig) -> TagList {
    vec![
        ("twitter:card", "summary_large_image".to_string()),
        ("twitter:title", page.title.clone()),
        ("twitter:description", page.description.clone()),
        ("twitter:image", absolute_url(site, &page.og_image)),
    ]
}

/// Robots directive, e.g. `index, follow` or `noindex, nofollow, noarchive`.
pub fn robots(index: bool, follow: bool, additional: &[&str]) -> String {
    let mut directives = vec![
        if index { "index" } else { "noindex" },
        if follow { "follow" } else { "nofollow" },
    ];
    directives.extend_from_slice(additional);
    directives.join(", ")
}

/// Robots directive for a resolved page.
pub fn page_robots(page: &SeoPage) -> String {
    robots(!page.no_index, !page.no_follow, &[])
}
