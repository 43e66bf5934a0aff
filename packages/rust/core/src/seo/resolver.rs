//! Layered, first-match-wins metadata resolution.
//!
//! For each field the layers are consulted in order:
//! 1. `override`: the patch passed by the caller
//! 2. `table`: the static `[seo.pages.<key>]` rows from config
//! 3. `feed`: values derived from the current ContentFeed
//! 4. `fallback`: hard-coded copy, complete for every page
//!
//! The first layer holding a non-blank value wins. Resolution never fails.

use std::collections::BTreeMap;

use brokersite_shared::{AppConfig, ContentFeed, SeoConfig, SiteConfig};
use tracing::debug;
use url::Url;

use super::fallback::{self, PRIMARY_KEYWORDS};
use super::page::{Field, Layer, PageKey, ResolvedSeo, SeoPage, SeoPatch};
use super::schema;

/// Resolves page metadata from static config plus an optional feed.
#[derive(Debug, Clone)]
pub struct SeoResolver {
    site: SiteConfig,
    table: BTreeMap<String, SeoPatch>,
}

impl SeoResolver {
    pub fn new(site: SiteConfig, seo: &SeoConfig) -> Self {
        let table = seo
            .pages
            .iter()
            .map(|(key, row)| (key.clone(), SeoPatch::from(row).normalized()))
            .collect();
        Self { site, table }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.site.clone(), &config.seo)
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Business name: from the feed when it has one, else from config.
    pub fn site_name<'a>(&'a self, feed: Option<&'a ContentFeed>) -> &'a str {
        feed.map(|f| f.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.site.name)
    }

    /// Resolve metadata for `key`.
    pub fn resolve(
        &self,
        key: &PageKey,
        feed: Option<&ContentFeed>,
        patch: Option<&SeoPatch>,
    ) -> ResolvedSeo {
        let derived = feed.map(|f| self.feed_patch(key, f)).unwrap_or_default();
        let resolved = merge(
            patch.cloned().unwrap_or_default().normalized(),
            self.table.get(key.as_str()).cloned().unwrap_or_default(),
            derived.normalized(),
            fallback::page(&self.site, key),
        );
        debug!(page = %key, with_feed = feed.is_some(), "resolved page metadata");
        resolved
    }

    /// Resolve metadata for a single service page. An id the feed does not
    /// know resolves as the `services` page.
    pub fn resolve_service(
        &self,
        service_id: &str,
        feed: Option<&ContentFeed>,
        patch: Option<&SeoPatch>,
    ) -> ResolvedSeo {
        let Some((feed, service)) = feed.and_then(|f| f.service(service_id).map(|s| (f, s))) else {
            debug!(service_id, "unknown service, using services page");
            return self.resolve(&PageKey::Services, feed, patch);
        };

        let site_name = self.site_name(Some(feed));
        let derived = SeoPatch {
            title: Some(format!("{} - {site_name}", service.title)),
            description: Some(service.description.clone()),
            keywords: Some(
                std::iter::once(service.title.to_lowercase())
                    .chain(PRIMARY_KEYWORDS.iter().take(3).map(|k| (*k).to_string()))
                    .collect(),
            ),
            h1: Some(service.title.clone()),
            structured_data: Some(vec![
                schema::service(&self.site, Some(feed), Some(service)),
                schema::breadcrumbs(&[
                    (
                        fallback::label(&PageKey::Home),
                        fallback::canonical_url(&self.site, &PageKey::Home),
                    ),
                    (
                        fallback::label(&PageKey::Services),
                        fallback::canonical_url(&self.site, &PageKey::Services),
                    ),
                    (service.title.clone(), self.service_url(service_id)),
                ]),
            ]),
            ..SeoPatch::default()
        };

        let mut base = fallback::page(&self.site, &PageKey::Services);
        base.canonical_url = self.service_url(service_id);

        let table_key = format!("services/{service_id}");
        merge(
            patch.cloned().unwrap_or_default().normalized(),
            self.table.get(&table_key).cloned().unwrap_or_default(),
            derived.normalized(),
            base,
        )
    }

    /// Browser title: the site's title template applied to the page title.
    pub fn document_title(&self, page: &SeoPage, feed: Option<&ContentFeed>) -> String {
        let site_name = self.site_name(feed);
        if page.title == site_name || page.title.ends_with(site_name) {
            return page.title.clone();
        }
        self.site
            .title_template
            .replacen("%s", &page.title, 1)
            .replacen("%s", site_name, 1)
    }

    /// Canonical URL of a service page. The id is percent-encoded as a
    /// single path segment.
    pub fn service_url(&self, service_id: &str) -> String {
        let base = fallback::canonical_url(&self.site, &PageKey::Home);
        match Url::parse(&base) {
            Ok(mut url) => {
                if let Ok(mut segments) = url.path_segments_mut() {
                    segments.pop_if_empty().push("services").push(service_id);
                }
                url.into()
            }
            Err(_) => {
                let id: String =
                    url::form_urlencoded::byte_serialize(service_id.as_bytes()).collect();
                format!("{base}services/{id}")
            }
        }
    }

    /// The `feed` layer: what the current feed can say about `key`.
    fn feed_patch(&self, key: &PageKey, feed: &ContentFeed) -> SeoPatch {
        let name = feed.name.as_str();
        let mut patch = SeoPatch {
            structured_data: Some(schema::page_schemas(&self.site, key, Some(feed))),
            ..SeoPatch::default()
        };

        match key {
            PageKey::Home => {
                patch.title = Some(feed.hero_section.title.clone());
                patch.description = Some(feed.hero_section.description.clone());
                patch.h1 = Some(feed.hero_section.title.clone());
            }
            PageKey::About => {
                if !name.is_empty() {
                    patch.title = Some(format!("About {name} - Your Trusted Mortgage Broker"));
                }
                patch.description = Some(feed.about.description.clone());
                patch.h1 = Some(feed.about.title.clone());
            }
            PageKey::Services => {
                let titles: Vec<String> = feed
                    .services
                    .items
                    .iter()
                    .map(|s| s.title.to_lowercase())
                    .filter(|t| !t.is_empty())
                    .collect();
                if !titles.is_empty() {
                    patch.description = Some(format!(
                        "Comprehensive mortgage services including {} and more. Expert advice \
                         and competitive rates.",
                        titles.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
                    ));
                }
                patch.keywords = Some(titles);
                patch.h1 = Some(feed.services.title.clone());
            }
            PageKey::Contact => {
                if !name.is_empty() {
                    patch.title = Some(format!("Contact {name} - Get Your Free Consultation"));
                    patch.description = Some(format!(
                        "Contact {name} for expert mortgage advice. Book your free consultation \
                         today and discover how we can help you secure the best home loan."
                    ));
                }
            }
            PageKey::Faq => {
                patch.description = Some(feed.faq.description.clone());
                patch.h1 = Some(feed.faq.title.clone());
            }
            _ => {}
        }

        patch
    }
}

/// Combine layers field by field. `fallback` is complete, so every field
/// gets a value and an origin.
fn merge(over: SeoPatch, table: SeoPatch, feed: SeoPatch, fallback: SeoPage) -> ResolvedSeo {
    let layers = [
        (Layer::Override, over),
        (Layer::Table, table),
        (Layer::Feed, feed),
    ];
    let mut origins = BTreeMap::new();

    fn pick<T: Clone>(
        layers: &[(Layer, SeoPatch); 3],
        origins: &mut BTreeMap<Field, Layer>,
        field: Field,
        get: impl Fn(&SeoPatch) -> Option<&T>,
        fallback: T,
    ) -> T {
        for (layer, patch) in layers {
            if let Some(value) = get(patch) {
                origins.insert(field, *layer);
                return value.clone();
            }
        }
        origins.insert(field, Layer::Fallback);
        fallback
    }

    let page = SeoPage {
        title: pick(&layers, &mut origins, Field::Title, |p| p.title.as_ref(), fallback.title),
        description: pick(
            &layers,
            &mut origins,
            Field::Description,
            |p| p.description.as_ref(),
            fallback.description,
        ),
        keywords: pick(
            &layers,
            &mut origins,
            Field::Keywords,
            |p| p.keywords.as_ref(),
            fallback.keywords,
        ),
        canonical_url: pick(
            &layers,
            &mut origins,
            Field::CanonicalUrl,
            |p| p.canonical_url.as_ref(),
            fallback.canonical_url,
        ),
        og_image: pick(
            &layers,
            &mut origins,
            Field::OgImage,
            |p| p.og_image.as_ref(),
            fallback.og_image,
        ),
        og_type: pick(
            &layers,
            &mut origins,
            Field::OgType,
            |p| p.og_type.as_ref(),
            fallback.og_type,
        ),
        h1: pick(&layers, &mut origins, Field::H1, |p| p.h1.as_ref(), fallback.h1),
        structured_data: pick(
            &layers,
            &mut origins,
            Field::StructuredData,
            |p| p.structured_data.as_ref(),
            fallback.structured_data,
        ),
        no_index: pick(
            &layers,
            &mut origins,
            Field::NoIndex,
            |p| p.no_index.as_ref(),
            fallback.no_index,
        ),
        no_follow: pick(
            &layers,
            &mut origins,
            Field::NoFollow,
            |p| p.no_follow.as_ref(),
            fallback.no_follow,
        ),
    };

    ResolvedSeo { page, origins }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokersite_shared::{FeedEnvelope, PageOverride};

    fn fixture_feed() -> ContentFeed {
        let fixture = std::fs::read_to_string("../../../fixtures/json/feed.fixture.json")
            .expect("read fixture");
        let envelope: FeedEnvelope = serde_json::from_str(&fixture).expect("parse fixture");
        envelope.data.expect("fixture data")
    }

    fn resolver_with_table(rows: &[(&str, PageOverride)]) -> SeoResolver {
        let mut seo = SeoConfig::default();
        for (key, row) in rows {
            seo.pages.insert((*key).to_string(), row.clone());
        }
        SeoResolver::new(SiteConfig::default(), &seo)
    }

    #[test]
    fn no_feed_no_overrides_is_all_fallback() {
        let resolver = resolver_with_table(&[]);
        for key in PageKey::KNOWN
            .into_iter()
            .chain([PageKey::Custom("anything-at-all".into())])
        {
            let resolved = resolver.resolve(&key, None, None);
            assert_eq!(resolved.origins.len(), Field::ALL.len(), "{key}");
            for field in Field::ALL {
                assert_eq!(resolved.origin(field), Layer::Fallback, "{key}.{field}");
            }
            assert!(!resolved.page.title.is_empty());
            assert!(!resolved.page.description.is_empty());
            assert!(!resolved.page.canonical_url.is_empty());
        }
    }

    #[test]
    fn blank_site_keywords_and_custom_label_still_resolve() {
        let site = SiteConfig {
            default_keywords: Vec::new(),
            ..SiteConfig::default()
        };
        let resolver = SeoResolver::new(site, &SeoConfig::default());

        let not_found = resolver.resolve(&PageKey::NotFound, None, None);
        assert!(!not_found.page.keywords.is_empty());
        assert_eq!(not_found.origin(Field::Keywords), Layer::Fallback);

        let custom = resolver.resolve(&PageKey::Custom(String::new()), None, None);
        assert_eq!(custom.page.h1, "Page");
        assert!(!custom.page.keywords.is_empty());
    }

    #[test]
    fn service_url_encodes_id() {
        let resolver = resolver_with_table(&[]);
        assert_eq!(
            resolver.service_url("home-loans"),
            "https://nepeanmortgage.com.au/services/home-loans"
        );
        assert_eq!(
            resolver.service_url("car & boat/loans"),
            "https://nepeanmortgage.com.au/services/car%20&%20boat%2Floans"
        );
    }

    #[test]
    fn override_title_beats_table_and_feed() {
        let resolver = resolver_with_table(&[(
            "home",
            PageOverride {
                title: Some("From the table".into()),
                ..PageOverride::default()
            },
        )]);
        let feed = fixture_feed();
        let patch = SeoPatch {
            title: Some("From the caller".into()),
            ..SeoPatch::default()
        };

        let resolved = resolver.resolve(&PageKey::Home, Some(&feed), Some(&patch));
        assert_eq!(resolved.page.title, "From the caller");
        assert_eq!(resolved.origin(Field::Title), Layer::Override);
        // Fields the caller left alone still come from lower layers.
        assert_eq!(resolved.page.description, feed.hero_section.description);
        assert_eq!(resolved.origin(Field::Description), Layer::Feed);
    }

    #[test]
    fn table_beats_feed() {
        let resolver = resolver_with_table(&[(
            "faq",
            PageOverride {
                description: Some("Answers to the questions we hear most.".into()),
                no_index: Some(true),
                ..PageOverride::default()
            },
        )]);
        let feed = fixture_feed();

        let resolved = resolver.resolve(&PageKey::Faq, Some(&feed), None);
        assert_eq!(
            resolved.page.description,
            "Answers to the questions we hear most."
        );
        assert_eq!(resolved.origin(Field::Description), Layer::Table);
        assert!(resolved.page.no_index);
        assert_eq!(resolved.page.h1, feed.faq.title);
        assert_eq!(resolved.origin(Field::H1), Layer::Feed);
    }

    #[test]
    fn feed_beats_fallback() {
        let resolver = resolver_with_table(&[]);
        let feed = fixture_feed();

        let resolved = resolver.resolve(&PageKey::Home, Some(&feed), None);
        assert_eq!(resolved.page.title, "Home loans made simple in Western Sydney");
        assert_eq!(resolved.origin(Field::Title), Layer::Feed);
        assert_eq!(resolved.origin(Field::CanonicalUrl), Layer::Fallback);
        assert_eq!(resolved.page.canonical_url, "https://nepeanmortgage.com.au/");
    }

    #[test]
    fn blank_override_falls_through() {
        let resolver = resolver_with_table(&[]);
        let patch = SeoPatch {
            title: Some(String::new()),
            keywords: Some(Vec::new()),
            ..SeoPatch::default()
        };
        let resolved = resolver.resolve(&PageKey::Contact, None, Some(&patch));
        assert_eq!(
            resolved.page.title,
            "Contact Nepean Mortgage - Get Your Free Consultation"
        );
        assert_eq!(resolved.origin(Field::Title), Layer::Fallback);
        assert_eq!(resolved.origin(Field::Keywords), Layer::Fallback);
    }

    #[test]
    fn blank_feed_values_fall_through() {
        let resolver = resolver_with_table(&[]);
        let feed = ContentFeed::default();
        let resolved = resolver.resolve(&PageKey::Home, Some(&feed), None);
        assert_eq!(resolved.origin(Field::Title), Layer::Fallback);
        assert_eq!(
            resolved.page.title,
            "Expert Mortgage Broker Services in Nepean & Western Sydney"
        );
    }

    #[test]
    fn services_page_derives_from_feed_items() {
        let resolver = resolver_with_table(&[]);
        let feed = fixture_feed();
        let resolved = resolver.resolve(&PageKey::Services, Some(&feed), None);

        assert!(resolved.page.description.starts_with(
            "Comprehensive mortgage services including home loans, refinancing"
        ));
        assert_eq!(
            resolved.page.keywords,
            feed.services
                .items
                .iter()
                .map(|s| s.title.to_lowercase())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn service_page_for_known_id() {
        let resolver = resolver_with_table(&[]);
        let feed = fixture_feed();
        let service = feed.service("refinancing").expect("fixture service").clone();

        let resolved = resolver.resolve_service("refinancing", Some(&feed), None);
        assert_eq!(resolved.page.title, format!("{} - Nepean Mortgage", service.title));
        assert_eq!(resolved.page.h1, service.title);
        assert_eq!(
            resolved.page.canonical_url,
            "https://nepeanmortgage.com.au/services/refinancing"
        );
        assert_eq!(resolved.page.structured_data[0]["@type"], "Service");
        assert_eq!(resolved.page.keywords.len(), 4);
    }

    #[test]
    fn service_page_for_unknown_id_is_services_page() {
        let resolver = resolver_with_table(&[]);
        let feed = fixture_feed();
        let unknown = resolver.resolve_service("crypto", Some(&feed), None);
        let services = resolver.resolve(&PageKey::Services, Some(&feed), None);
        assert_eq!(unknown, services);

        let offline = resolver.resolve_service("refinancing", None, None);
        assert_eq!(offline.page.canonical_url, "https://nepeanmortgage.com.au/services");
    }

    #[test]
    fn document_title_applies_template() {
        let resolver = resolver_with_table(&[]);
        let page = resolver.resolve(&PageKey::Faq, None, None).page;
        assert_eq!(
            resolver.document_title(&page, None),
            "Mortgage FAQ - Common Home Loan Questions Answered | Nepean Mortgage"
        );

        let mut named = page.clone();
        named.title = "Refinancing - Nepean Mortgage".into();
        assert_eq!(
            resolver.document_title(&named, None),
            "Refinancing - Nepean Mortgage"
        );
    }

    #[test]
    fn faq_structured_data_comes_from_feed() {
        let resolver = resolver_with_table(&[]);
        let feed = fixture_feed();
        let resolved = resolver.resolve(&PageKey::Faq, Some(&feed), None);
        assert_eq!(resolved.origin(Field::StructuredData), Layer::Feed);
        assert_eq!(
            resolved.page.structured_data[0]["mainEntity"]
                .as_array()
                .map(Vec::len),
            Some(feed.faq.items.len())
        );
    }
}
