//! Public routes of the site and the page key each one renders.

use crate::seo::PageKey;

/// A routable page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    PrivacyPolicy,
    WebsitePolicy,
    FeedbackAndComplaints,
    NotFound,
}

impl Route {
    /// Every route with a real path, in navigation order.
    pub const PUBLIC: [Route; 4] = [
        Route::Home,
        Route::PrivacyPolicy,
        Route::WebsitePolicy,
        Route::FeedbackAndComplaints,
    ];

    /// Match a request path. Query strings, fragments, and a trailing slash
    /// are ignored; anything unrecognised is [`Route::NotFound`].
    pub fn from_path(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');

        match path {
            "" => Route::Home,
            "/privacy-policy" => Route::PrivacyPolicy,
            "/website-policy" => Route::WebsitePolicy,
            "/feedback-and-complaints" => Route::FeedbackAndComplaints,
            _ => Route::NotFound,
        }
    }

    /// Canonical path. `NotFound` has none of its own and reports `/404`.
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::PrivacyPolicy => "/privacy-policy",
            Route::WebsitePolicy => "/website-policy",
            Route::FeedbackAndComplaints => "/feedback-and-complaints",
            Route::NotFound => "/404",
        }
    }

    pub fn page_key(&self) -> PageKey {
        match self {
            Route::Home => PageKey::Home,
            Route::PrivacyPolicy => PageKey::PrivacyPolicy,
            Route::WebsitePolicy => PageKey::WebsitePolicy,
            Route::FeedbackAndComplaints => PageKey::FeedbackAndComplaints,
            Route::NotFound => PageKey::NotFound,
        }
    }

    /// Whether the route belongs in the sitemap.
    pub fn in_sitemap(&self) -> bool {
        !matches!(self, Route::NotFound)
    }
}
