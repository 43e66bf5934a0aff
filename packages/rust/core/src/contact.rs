//! Contact form submission with a single in-flight guard.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

use brokersite_client::ApiClient;
use brokersite_shared::{BrokerSiteError, ContactSubmission, Result};
use regex::Regex;
use tokio::sync::watch;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Message shown when the server reports failure without saying why.
const DEFAULT_FAILURE_MESSAGE: &str = "Failed to send message";

/// `local@domain.tld`, no whitespace.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

/// Where the submitter is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Sent,
    Failed(String),
}

/// A delivered submission.
#[derive(Debug, Clone)]
pub struct ContactOutcome {
    /// Local id used to correlate logs for this submission.
    pub request_id: Uuid,
    /// Confirmation message from the server.
    pub message: String,
}

/// Sends contact forms, at most one at a time.
pub struct ContactSubmitter {
    client: ApiClient,
    in_flight: AtomicBool,
    state: watch::Sender<SubmissionState>,
}

/// Clears the in-flight flag when the submission ends, including when its
/// future is dropped mid-request.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ContactSubmitter {
    pub fn new(client: ApiClient) -> Self {
        let (state, _rx) = watch::channel(SubmissionState::Idle);
        Self {
            client,
            in_flight: AtomicBool::new(false),
            state,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Return to `Idle` after a finished submission. Has no effect while one
    /// is in flight.
    pub fn reset(&self) {
        if !self.is_submitting() {
            self.state.send_replace(SubmissionState::Idle);
        }
    }

    /// Validate and send `form`.
    ///
    /// Makes exactly one request, never retries. Rejected with
    /// [`BrokerSiteError::Busy`] without any request if another submission is
    /// still in flight.
    #[instrument(skip_all, fields(request_id))]
    pub async fn submit(&self, form: &ContactSubmission) -> Result<ContactOutcome> {
        validate(form)?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("contact submission rejected, another is in flight");
            return Err(BrokerSiteError::Busy("contact submission"));
        }
        let _guard = InFlightGuard(&self.in_flight);

        let request_id = Uuid::now_v7();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));
        self.state.send_replace(SubmissionState::Submitting);

        match self.client.send_message(form).await {
            Ok(response) if response.is_success() => {
                info!("contact submission sent");
                self.state.send_replace(SubmissionState::Sent);
                Ok(ContactOutcome {
                    request_id,
                    message: response.message,
                })
            }
            Ok(response) => {
                let message = if response.message.is_empty() {
                    DEFAULT_FAILURE_MESSAGE.to_string()
                } else {
                    response.message
                };
                warn!(status = %response.status, %message, "contact submission refused");
                self.state
                    .send_replace(SubmissionState::Failed(message.clone()));
                Err(BrokerSiteError::api(message))
            }
            Err(e) => {
                warn!(error = %e, "contact submission failed");
                self.state
                    .send_replace(SubmissionState::Failed(e.to_string()));
                Err(e)
            }
        }
    }
}

/// Client-side checks run before anything is sent.
pub fn validate(form: &ContactSubmission) -> Result<()> {
    if form.name.trim().is_empty() {
        return Err(BrokerSiteError::validation("name is required"));
    }
    let email = form.email.trim();
    if email.is_empty() {
        return Err(BrokerSiteError::validation("email is required"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(BrokerSiteError::validation(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brokersite_shared::{ApiSettings, AppConfig};
    use std::sync::Arc;
    use std::time::Duration;

    fn submitter_for(uri: &str) -> ContactSubmitter {
        let settings =
            ApiSettings::resolve(&AppConfig::default(), Some(uri)).expect("resolve settings");
        ContactSubmitter::new(ApiClient::new(settings).expect("build client"))
    }

    fn form() -> ContactSubmission {
        ContactSubmission {
            name: "Jo Citizen".into(),
            email: "jo@example.com".into(),
            phone: "0400 000 000".into(),
            message: Some("Can I refinance?".into()),
            verification_token: Some("tok".into()),
        }
    }

    fn success() -> wiremock::ResponseTemplate {
        wiremock::ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "status": "success", "message": "Mail sent" }))
    }

    #[test]
    fn validation_rules() {
        assert!(validate(&form()).is_ok());

        let blank_name = ContactSubmission {
            name: "   ".into(),
            ..form()
        };
        assert!(validate(&blank_name).unwrap_err().to_string().contains("name"));

        for bad in ["", "jo", "jo@example", "jo @example.com", "@example.com"] {
            let f = ContactSubmission {
                email: bad.into(),
                ..form()
            };
            assert!(validate(&f).is_err(), "accepted {bad:?}");
        }
    }

    #[tokio::test]
    async fn successful_submit_moves_to_sent() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/send-mail"))
            .respond_with(success())
            .expect(1)
            .mount(&server)
            .await;

        let submitter = submitter_for(&server.uri());
        assert_eq!(submitter.state(), SubmissionState::Idle);

        let outcome = submitter.submit(&form()).await.expect("submit");
        assert_eq!(outcome.message, "Mail sent");
        assert_eq!(submitter.state(), SubmissionState::Sent);
        assert!(!submitter.is_submitting());

        submitter.reset();
        assert_eq!(submitter.state(), SubmissionState::Idle);
    }

    #[tokio::test]
    async fn subscribers_observe_submitting_then_sent() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/send-mail"))
            .respond_with(success().set_delay(Duration::from_millis(200)))
            .expect(1)
            .mount(&server)
            .await;

        let submitter = Arc::new(submitter_for(&server.uri()));
        let mut rx = submitter.subscribe();
        assert_eq!(*rx.borrow_and_update(), SubmissionState::Idle);

        let task = {
            let submitter = Arc::clone(&submitter);
            tokio::spawn(async move { submitter.submit(&form()).await })
        };

        rx.changed().await.expect("submitting");
        assert_eq!(*rx.borrow_and_update(), SubmissionState::Submitting);

        rx.changed().await.expect("sent");
        assert_eq!(*rx.borrow_and_update(), SubmissionState::Sent);

        task.await.expect("join").expect("submit");
    }

    #[tokio::test]
    async fn concurrent_submits_make_one_call() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/send-mail"))
            .respond_with(success().set_delay(Duration::from_millis(300)))
            .expect(1)
            .mount(&server)
            .await;

        let submitter = Arc::new(submitter_for(&server.uri()));
        let first = {
            let submitter = Arc::clone(&submitter);
            tokio::spawn(async move { submitter.submit(&form()).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(submitter.is_submitting());
        let second = submitter.submit(&form()).await;
        assert!(matches!(second, Err(BrokerSiteError::Busy(_))));

        first.await.expect("join").expect("first submit");
        assert!(!submitter.is_submitting());
        server.verify().await;
    }

    #[tokio::test]
    async fn refused_submission_surfaces_server_message() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "status": "error", "message": "Captcha failed" })),
            )
            .mount(&server)
            .await;

        let submitter = submitter_for(&server.uri());
        let err = submitter.submit(&form()).await.unwrap_err();
        assert_eq!(err.to_string(), "Captcha failed");
        assert_eq!(
            submitter.state(),
            SubmissionState::Failed("Captcha failed".into())
        );
    }

    #[tokio::test]
    async fn refused_without_message_uses_default() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "status": "error" })),
            )
            .mount(&server)
            .await;

        let submitter = submitter_for(&server.uri());
        let err = submitter.submit(&form()).await.unwrap_err();
        assert_eq!(err.to_string(), DEFAULT_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn transport_failure_is_failed_state() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let submitter = submitter_for(&server.uri());
        let err = submitter.submit(&form()).await.unwrap_err();
        assert!(matches!(err, BrokerSiteError::Http { status: 503 }));
        assert_eq!(
            submitter.state(),
            SubmissionState::Failed("HTTP error! status: 503".into())
        );

        // The guard is released, so the next submit goes out.
        let err = submitter.submit(&form()).await.unwrap_err();
        assert!(matches!(err, BrokerSiteError::Http { .. }));
    }

    #[tokio::test]
    async fn invalid_form_makes_no_call() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(success())
            .expect(0)
            .mount(&server)
            .await;

        let submitter = submitter_for(&server.uri());
        let bad = ContactSubmission {
            email: "not-an-email".into(),
            ..form()
        };
        let err = submitter.submit(&bad).await.unwrap_err();
        assert!(matches!(err, BrokerSiteError::Validation { .. }));
        assert_eq!(submitter.state(), SubmissionState::Idle);
    }
}
