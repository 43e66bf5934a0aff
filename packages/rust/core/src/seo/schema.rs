//! schema.org JSON-LD builders.

use brokersite_shared::{ContentFeed, ServiceItem, SiteConfig};
use serde_json::{Value, json};

use super::fallback::{self, DEFAULT_FAQS};
use super::page::PageKey;

const CONTEXT: &str = "https://schema.org";

/// Structured data for a page, from the feed when given, otherwise from
/// static site facts only.
pub fn page_schemas(site: &SiteConfig, key: &PageKey, feed: Option<&ContentFeed>) -> Vec<Value> {
    let home = (fallback::label(&PageKey::Home), fallback::canonical_url(site, &PageKey::Home));
    let here = (fallback::label(key), fallback::canonical_url(site, key));

    match key {
        PageKey::Home => vec![local_business(site, feed)],
        PageKey::Services => vec![
            service(site, feed, feed.and_then(|f| f.services.items.first())),
            breadcrumbs(&[home, here]),
        ],
        PageKey::Faq => vec![faq_page(feed), breadcrumbs(&[home, here])],
        PageKey::NotFound => Vec::new(),
        _ => vec![breadcrumbs(&[home, here])],
    }
}

/// `FinancialService` describing the business.
pub fn local_business(site: &SiteConfig, feed: Option<&ContentFeed>) -> Value {
    let name = business_name(site, feed);
    let description = feed
        .map(|f| f.about.description.as_str())
        .filter(|d| !d.is_empty())
        .unwrap_or(&site.default_description);
    let (telephone, email) = feed
        .map(|f| (f.footer.contact.phone.as_str(), f.footer.contact.email.as_str()))
        .unwrap_or_default();
    let services: Vec<&str> = feed
        .map(|f| f.services.items.iter().map(|s| s.title.as_str()).collect())
        .unwrap_or_default();

    json!({
        "@context": CONTEXT,
        "@type": "FinancialService",
        "name": name,
        "legalName": site.legal_name,
        "description": description,
        "address": {
            "@type": "PostalAddress",
            "addressLocality": site.locality,
            "addressRegion": site.region,
            "addressCountry": site.country,
        },
        "telephone": telephone,
        "email": email,
        "url": site.url,
        "serviceArea": site
            .service_areas
            .iter()
            .map(|area| json!({ "@type": "City", "name": area }))
            .collect::<Vec<_>>(),
        "hasOfferCatalog": {
            "@type": "OfferCatalog",
            "name": "Mortgage Services",
            "itemListElement": services
                .iter()
                .map(|title| json!({
                    "@type": "Offer",
                    "itemOffered": {
                        "@type": "Service",
                        "name": title,
                        "description": format!("Professional {} services", title.to_lowercase()),
                    },
                }))
                .collect::<Vec<_>>(),
        },
        "sameAs": site.social.links(),
    })
}

/// `Service` for one offering, or a generic one when `item` is `None`.
pub fn service(site: &SiteConfig, feed: Option<&ContentFeed>, item: Option<&ServiceItem>) -> Value {
    let name = item
        .map(|s| s.title.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or("Mortgage Services");
    let description = item
        .map(|s| s.description.as_str())
        .filter(|d| !d.is_empty())
        .unwrap_or("Professional mortgage broker services");

    json!({
        "@context": CONTEXT,
        "@type": "Service",
        "name": name,
        "description": description,
        "provider": {
            "@type": "Organization",
            "name": business_name(site, feed),
            "url": site.url,
        },
        "serviceType": "FinancialService",
        "areaServed": site.service_areas,
    })
}

/// `FAQPage` from the feed's questions, or the default mortgage FAQs when
/// there is no feed or it has none.
pub fn faq_page(feed: Option<&ContentFeed>) -> Value {
    let from_feed: Vec<(&str, &str)> = feed
        .map(|f| {
            f.faq
                .items
                .iter()
                .map(|item| (item.title.as_str(), item.description.as_str()))
                .collect()
        })
        .unwrap_or_default();
    let questions: &[(&str, &str)] = if from_feed.is_empty() {
        DEFAULT_FAQS
    } else {
        &from_feed
    };

    json!({
        "@context": CONTEXT,
        "@type": "FAQPage",
        "mainEntity": questions
            .iter()
            .map(|(question, answer)| json!({
                "@type": "Question",
                "name": question,
                "acceptedAnswer": { "@type": "Answer", "text": answer },
            }))
            .collect::<Vec<_>>(),
    })
}

/// `BreadcrumbList` from `(name, url)` pairs, positions starting at 1.
pub fn breadcrumbs(trail: &[(String, String)]) -> Value {
    json!({
        "@context": CONTEXT,
        "@type": "BreadcrumbList",
        "itemListElement": trail
            .iter()
            .enumerate()
            .map(|(i, (name, url))| json!({
                "@type": "ListItem",
                "position": i + 1,
                "name": name,
                "item": url,
            }))
            .collect::<Vec<_>>(),
    })
}

fn business_name<'a>(site: &'a SiteConfig, feed: Option<&'a ContentFeed>) -> &'a str {
    feed.map(|f| f.name.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or(&site.name)
}
