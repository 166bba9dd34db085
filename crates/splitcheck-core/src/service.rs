//! Receipt extraction flow
//!
//! Ties the attempt limiter, the stores, and the AI backend together:
//!
//! 1. read the user's attempt state and the global policy
//! 2. ask the limiter whether this attempt is allowed
//! 3. send the image to the backend and parse its answer
//! 4. persist the new attempt state
//!
//! The attempt is only recorded once the backend answered with a parseable
//! receipt, so failed calls do not use up a slot. The read in step 1 and the
//! write in step 4 are separate store calls with no lock between them.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::ai::{parse_extraction_as, ExtractionBackend, ExtractionClient, ExtractionRequest};
use crate::ai::{ImageInput, SchemaVariant};
use crate::config::PolicyStore;
use crate::error::{Error, Result};
use crate::limiter::evaluate_attempt;
use crate::models::{LineItem, Receipt, ReceiptWithItems};
use crate::store::AttemptStore;

const FALLBACK_PROMPT: &str = "Read data from receipt image";
const NATIVE_LANGUAGE: &str = "English";

/// Source of the current time in milliseconds since the Unix epoch
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually driven clock (for testing)
#[derive(Debug, Default)]
pub struct FixedClock {
    now_ms: AtomicI64,
}

impl FixedClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// A successful extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    pub receipt: Receipt,
    pub items: Vec<LineItem>,
    /// Extractions still available to the user in the current window
    pub attempts_left: u32,
}

/// Build the prompt and schema for an optional translation language
///
/// No language, or English, means a plain extraction.
pub fn prompt_for(base_prompt: &str, language: Option<&str>) -> (String, SchemaVariant) {
    let base = if base_prompt.trim().is_empty() {
        FALLBACK_PROMPT
    } else {
        base_prompt
    };

    match language.map(str::trim) {
        Some(lang) if !lang.is_empty() && !lang.eq_ignore_ascii_case(NATIVE_LANGUAGE) => (
            format!("{} and translated language is {}", base, lang),
            SchemaVariant::Translated,
        ),
        _ => (base.to_string(), SchemaVariant::Plain),
    }
}

/// Rate-limited receipt extraction
#[derive(Clone)]
pub struct ExtractionService {
    attempts: Arc<dyn AttemptStore>,
    policy: Arc<dyn PolicyStore>,
    client: ExtractionClient,
    clock: Arc<dyn Clock>,
}

impl ExtractionService {
    pub fn new(
        attempts: Arc<dyn AttemptStore>,
        policy: Arc<dyn PolicyStore>,
        client: ExtractionClient,
    ) -> Self {
        Self {
            attempts,
            policy,
            client,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock (for testing)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Extract a receipt from an image on behalf of `user_id`
    ///
    /// `language` requests translated item names; `None` or "English" does a
    /// plain extraction.
    pub async fn generate_receipt(
        &self,
        user_id: &str,
        image: &ImageInput,
        language: Option<&str>,
    ) -> Result<ExtractionOutcome> {
        let previous = self.attempts.get_attempts(user_id)?;
        let policy = self.policy.get_policy()?.ok_or(Error::PolicyUnavailable)?;

        let decision = match evaluate_attempt(previous.as_ref(), &policy, self.clock.now_ms()) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(user = user_id, "Extraction refused: {}", e);
                return Err(e);
            }
        };

        let (prompt, schema) = prompt_for(&policy.extraction_prompt, language);
        let request = ExtractionRequest {
            prompt: &prompt,
            schema,
            image,
            model: &policy.model_identifier,
        };

        let text = self.client.extract(&request).await.map_err(|e| {
            warn!(backend = self.client.name(), "Extraction call failed: {}", e);
            e
        })?;
        let ReceiptWithItems { receipt, items } = parse_extraction_as(&text, schema)?;

        self.attempts.set_attempts(user_id, &decision.next)?;
        info!(
            user = user_id,
            attempts = decision.next.attempts,
            attempts_left = decision.attempts_left,
            items = items.len(),
            "Receipt extracted"
        );

        Ok(ExtractionOutcome {
            receipt,
            items,
            attempts_left: decision.attempts_left,
        })
    }

    /// Forget a user's attempt history (account removal)
    pub fn delete_user(&self, user_id: &str) -> Result<()> {
        self.attempts.delete_attempts(user_id)?;
        info!(user = user_id, "Deleted attempt history");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockBackend;
    use crate::models::{AttemptState, RateLimitPolicy};
    use crate::store::MemoryStore;

    const RESPONSE: &str = r#"{
        "receipt_name": "Noodle Bar",
        "date": "2024-03-03",
        "total_sum": 24.0,
        "orders": [{"name": "Ramen", "quantity": 2, "price": 12.0}]
    }"#;

    const TRANSLATED_RESPONSE: &str = r#"{
        "receipt_name": "Nudelbar",
        "translated_receipt_name": "Noodle Bar",
        "date": "2024-03-03",
        "total_sum": 24.0,
        "orders": [{"name": "Ramen", "translated_name": "Ramen soup", "quantity": 2, "price": 12.0}]
    }"#;

    fn policy() -> RateLimitPolicy {
        RateLimitPolicy {
            cooldown_window_ms: 60_000,
            max_attempts_per_window: 2,
            extraction_prompt: "Extract the receipt".into(),
            model_identifier: "gemini-test".into(),
        }
    }

    fn image() -> ImageInput {
        ImageInput::new(vec![0xFF, 0xD8], "image/jpeg")
    }

    fn service(
        store: Arc<MemoryStore>,
        backend: MockBackend,
        clock: Arc<FixedClock>,
    ) -> ExtractionService {
        ExtractionService::new(store.clone(), store, ExtractionClient::Mock(backend))
            .with_clock(clock)
    }

    #[test]
    fn test_prompt_for_plain() {
        assert_eq!(
            prompt_for("Extract", None),
            ("Extract".to_string(), SchemaVariant::Plain)
        );
        assert_eq!(
            prompt_for("Extract", Some("english")),
            ("Extract".to_string(), SchemaVariant::Plain)
        );
    }

    #[test]
    fn test_prompt_for_translated() {
        assert_eq!(
            prompt_for("Extract", Some("German")),
            (
                "Extract and translated language is German".to_string(),
                SchemaVariant::Translated
            )
        );
    }

    #[test]
    fn test_prompt_for_empty_base_uses_fallback() {
        assert_eq!(prompt_for("  ", None).0, "Read data from receipt image");
    }

    #[tokio::test]
    async fn test_generate_receipt_records_attempt() {
        let store = Arc::new(MemoryStore::with_policy(policy()));
        let backend = MockBackend::with_response(RESPONSE);
        let clock = Arc::new(FixedClock::new(1_000));
        let service = service(store.clone(), backend.clone(), clock);

        let outcome = service.generate_receipt("u1", &image(), None).await.unwrap();
        assert_eq!(outcome.receipt.name, "Noodle Bar");
        assert_eq!(outcome.items.len(), 1);
        assert_eq!(outcome.attempts_left, 1);

        assert_eq!(
            store.get_attempts("u1").unwrap(),
            Some(AttemptState {
                last_attempt_timestamp_ms: 1_000,
                attempts: 1
            })
        );

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, "Extract the receipt");
        assert_eq!(calls[0].model, "gemini-test");
        assert_eq!(calls[0].schema, SchemaVariant::Plain);
    }

    #[tokio::test]
    async fn test_rate_limit_blocks_without_calling_backend() {
        let store = Arc::new(MemoryStore::with_policy(policy()));
        let backend = MockBackend::with_response(RESPONSE);
        let clock = Arc::new(FixedClock::new(0));
        let service = service(store.clone(), backend.clone(), clock.clone());

        service.generate_receipt("u1", &image(), None).await.unwrap();
        clock.advance(1_000);
        let second = service.generate_receipt("u1", &image(), None).await.unwrap();
        assert_eq!(second.attempts_left, 0);

        clock.advance(1_000);
        let err = service
            .generate_receipt("u1", &image(), None)
            .await
            .unwrap_err();
        match err {
            Error::RateLimitExceeded {
                attempts_left,
                wait_time_ms,
            } => {
                assert_eq!(attempts_left, 0);
                assert_eq!(wait_time_ms, 58_000);
            }
            other => panic!("unexpected error: {}", other),
        }

        assert_eq!(backend.calls().len(), 2);
        assert_eq!(store.get_attempts("u1").unwrap().unwrap().attempts, 2);
    }

    #[tokio::test]
    async fn test_window_reset_allows_again() {
        let store = Arc::new(MemoryStore::with_policy(policy()));
        let clock = Arc::new(FixedClock::new(0));
        let service = service(store.clone(), MockBackend::with_response(RESPONSE), clock.clone());

        service.generate_receipt("u1", &image(), None).await.unwrap();
        service.generate_receipt("u1", &image(), None).await.unwrap();
        clock.set(60_000);

        let outcome = service.generate_receipt("u1", &image(), None).await.unwrap();
        assert_eq!(outcome.attempts_left, 1);
        assert_eq!(
            store.get_attempts("u1").unwrap().unwrap().last_attempt_timestamp_ms,
            60_000
        );
    }

    #[tokio::test]
    async fn test_missing_policy_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        let backend = MockBackend::with_response(RESPONSE);
        let service = service(store.clone(), backend.clone(), Arc::new(FixedClock::new(0)));

        let err = service
            .generate_receipt("u1", &image(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PolicyUnavailable));
        assert!(backend.calls().is_empty());
        assert_eq!(store.get_attempts("u1").unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_backend_does_not_consume_attempt() {
        let store = Arc::new(MemoryStore::with_policy(policy()));
        let service = service(
            store.clone(),
            MockBackend::failing(),
            Arc::new(FixedClock::new(0)),
        );

        let err = service
            .generate_receipt("u1", &image(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
        assert_eq!(store.get_attempts("u1").unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_response_does_not_consume_attempt() {
        let store = Arc::new(MemoryStore::with_policy(policy()));
        let service = service(
            store.clone(),
            MockBackend::with_response("sorry, no receipt here"),
            Arc::new(FixedClock::new(0)),
        );

        let err = service
            .generate_receipt("u1", &image(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedExtraction(_)));
        assert_eq!(store.get_attempts("u1").unwrap(), None);
    }

    #[tokio::test]
    async fn test_translated_request_uses_translated_schema() {
        let store = Arc::new(MemoryStore::with_policy(policy()));
        let backend = MockBackend::with_response(TRANSLATED_RESPONSE);
        let service = service(store, backend.clone(), Arc::new(FixedClock::new(0)));

        let outcome = service
            .generate_receipt("u1", &image(), Some("Japanese"))
            .await
            .unwrap();
        assert_eq!(outcome.items[0].translated_name.as_deref(), Some("Ramen soup"));

        let calls = backend.calls();
        assert_eq!(calls[0].schema, SchemaVariant::Translated);
        assert_eq!(
            calls[0].prompt,
            "Extract the receipt and translated language is Japanese"
        );
    }

    #[tokio::test]
    async fn test_untranslated_response_to_translated_request_is_rejected() {
        let store = Arc::new(MemoryStore::with_policy(policy()));
        let service = service(
            store.clone(),
            MockBackend::with_response(
                r#"{"receipt_name":"Cafe","date":"","total_sum":5,
                    "orders":[{"name":"Kaffee","quantity":1,"price":5}]}"#,
            ),
            Arc::new(FixedClock::new(0)),
        );

        let err = service
            .generate_receipt("u1", &image(), Some("German"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedExtraction(_)));
        assert_eq!(store.get_attempts("u1").unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_user_clears_history() {
        let store = Arc::new(MemoryStore::with_policy(policy()));
        let service = service(
            store.clone(),
            MockBackend::with_response(RESPONSE),
            Arc::new(FixedClock::new(0)),
        );

        service.generate_receipt("u1", &image(), None).await.unwrap();
        service.delete_user("u1").unwrap();
        assert_eq!(store.get_attempts("u1").unwrap(), None);
    }
}
