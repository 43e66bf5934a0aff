//! Per-page SEO metadata.
//!
//! - [`SeoResolver`] merges override, table, feed, and fallback layers
//! - [`schema`] builds schema.org JSON-LD
//! - [`tags`] renders Open Graph, Twitter, and robots values
//! - [`audit`] checks lengths and suggests keywords
//! - [`sitemap`] emits `sitemap.xml` and `robots.txt`

pub mod audit;
pub mod fallback;
pub mod page;
pub mod resolver;
pub mod schema;
pub mod sitemap;
pub mod tags;

pub use audit::{KeywordDensity, SeoAudit, audit, keyword_density, optimize_keywords};
pub use page::{Field, Layer, PageKey, ResolvedSeo, SeoPage, SeoPatch};
pub use resolver::SeoResolver;
pub use sitemap::{ChangeFreq, SitemapEntry};
