//! `GET /feeds`: fetch the content feed.

use brokersite_shared::{BrokerSiteError, ContentFeed, FeedEnvelope, Result, is_success_status};
use tracing::{info, instrument};

use crate::ApiClient;

impl ApiClient {
    /// Fetch the current content feed.
    ///
    /// The envelope `status` must be `success` when present; an empty status
    /// with a `data` payload is accepted. A success envelope without `data`
    /// is an API error.
    #[instrument(skip_all, fields(path = %self.settings().feeds_path))]
    pub async fn get_feeds(&self) -> Result<ContentFeed> {
        let envelope: FeedEnvelope = self.get_json(&self.settings().feeds_path).await?;

        if !envelope.status.is_empty() && !is_success_status(&envelope.status) {
            let message = if envelope.message.is_empty() {
                format!("feed request failed with status '{}'", envelope.status)
            } else {
                envelope.message
            };
            return Err(BrokerSiteError::api(message));
        }

        let feed = envelope
            .data
            .ok_or_else(|| BrokerSiteError::api("feed response contained no data"))?;

        info!(
            name = %feed.name,
            services = feed.services.items.len(),
            faqs = feed.faq.items.len(),
            "content feed fetched"
        );

        Ok(feed)
    }
}
