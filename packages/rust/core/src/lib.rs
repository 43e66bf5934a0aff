//! Domain logic for the brokersite backend.
//!
//! This crate wires the API client and the local mirror into the pieces the
//! site actually consumes: the content store, the contact submitter, the SEO
//! resolver, the icon registry, and the route table.

pub mod cancel;
pub mod contact;
pub mod feed_store;
pub mod icons;
pub mod routes;
pub mod seo;

pub use cancel::CancelToken;
pub use contact::{ContactOutcome, ContactSubmitter, SubmissionState};
pub use feed_store::{ContentStore, FeedState, StoreOptions};
pub use icons::{IconRegistry, IconRenderer, IconStyle};
pub use routes::Route;
pub use seo::{PageKey, ResolvedSeo, SeoPage, SeoPatch, SeoResolver};
