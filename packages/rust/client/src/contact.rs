//! `POST /send-mail`: deliver a contact form.

use brokersite_shared::{ContactResponse, ContactSubmission, Result};
use tracing::{info, instrument};

use crate::ApiClient;

impl ApiClient {
    /// Send a contact submission. Exactly one request, no retries.
    ///
    /// The verification token, if any, travels in the configured captcha
    /// header; it is never part of the JSON body. The returned envelope is
    /// passed back as-is; deciding what a non-success status means is up to
    /// the caller.
    #[instrument(skip_all, fields(path = %self.settings().send_mail_path))]
    pub async fn send_message(&self, form: &ContactSubmission) -> Result<ContactResponse> {
        let header = self.settings().captcha_header.clone();
        let headers: Vec<(&str, &str)> = match form.token() {
            Some(token) => vec![(header.as_str(), token)],
            None => Vec::new(),
        };

        let response: ContactResponse = self
            .post_json(&self.settings().send_mail_path, &form.payload(), &headers)
            .await?;

        info!(
            status = %response.status,
            verified = form.token().is_some(),
            "contact submission answered"
        );

        Ok(response)
    }
}
