//! The ingestion pipeline: hash, validate, normalize, idempotent insert.

use serde_json::Value;

use crate::error::{Error, RejectReason, Result};
use crate::hash::PepperedHasher;
use crate::payload::PayloadRepresentation;
use crate::validate::{is_present, validate};

/// Which beacon surface produced a log row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// JSON body beacon (`POST /api/log`).
    Log,
    /// Query-parameter beacon (`GET /api/log-csp`).
    Csp,
}

impl LogKind {
    /// Value stored in the `log_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Csp => "csp",
        }
    }
}

/// A validated, fully derived log row ready for insertion.
///
/// `uid` and `data_hash` are already digests; nothing here can be traced
/// back to the visitor's IP.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub project_id: String,
    pub uid: String,
    pub event_type: String,
    pub current_url: String,
    pub referrer: Option<String>,
    pub time_on_page: i64,
    pub event_timestamp: String,
    /// Canonical payload string.
    pub data: String,
    /// Digest of `data`; deduplication key together with `project_id`.
    pub data_hash: String,
    pub log_type: LogKind,
}

/// Write seam between the pipeline and the log store.
///
/// Implementations issue a single atomic insert-if-absent keyed on
/// `(project_id, data_hash)`. Concurrent identical submissions race safely
/// at the store's uniqueness constraint; no application-level locking.
pub trait LogSink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert `entry` unless a row with its `(project_id, data_hash)` key
    /// already exists. Returns `true` when a new row was written, `false`
    /// for a deduplicated replay. Both are success.
    fn insert_if_absent(
        &self,
        entry: &NewLogEntry,
    ) -> impl Future<Output = std::result::Result<bool, Self::Error>> + Send;
}

/// One inbound beacon submission.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub project_id: String,
    /// Raw visitor IP as reported by the edge. Hashed immediately; never
    /// stored or logged.
    pub visitor_ip: Option<String>,
    pub data: PayloadRepresentation,
    /// Byte ceiling for the canonical payload string.
    pub size_limit: usize,
    pub kind: LogKind,
}

/// Outcome of an ingest call.
///
/// A deduplicated replay reports [`Accepted`](Self::Accepted) exactly like a
/// fresh insert; callers cannot distinguish the two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Accepted,
    Rejected(RejectReason),
}

/// Orchestrates hashing, validation, normalization, and the idempotent
/// insert for one beacon.
///
/// Stateless apart from the hasher; constructed once per process and passed
/// into request handlers explicitly.
#[derive(Debug, Clone)]
pub struct IngestPipeline {
    hasher: PepperedHasher,
}

impl IngestPipeline {
    pub fn new(hasher: PepperedHasher) -> Self {
        Self { hasher }
    }

    /// Run one submission through the pipeline.
    ///
    /// Returns `Ok(Rejected(..))` for validation failures and `Err` only for
    /// store-layer failures, which are terminal and never retried here.
    pub async fn ingest<S: LogSink>(
        &self,
        sink: &S,
        request: IngestRequest,
    ) -> Result<IngestOutcome> {
        let Some(visitor_ip) = request
            .visitor_ip
            .as_deref()
            .filter(|ip| !ip.is_empty())
        else {
            return Ok(IngestOutcome::Rejected(RejectReason::MissingVisitorIdentity));
        };
        let uid = self.hasher.digest(visitor_ip);

        let payload = match validate(&request.project_id, &request.data, request.size_limit) {
            Ok(payload) => payload,
            Err(reason) => return Ok(IngestOutcome::Rejected(reason)),
        };

        let data_hash = self.hasher.digest(&payload.canonical);
        let entry = NewLogEntry {
            project_id: request.project_id,
            uid,
            event_type: field_text(&payload.parsed, "eventType"),
            current_url: field_text(&payload.parsed, "currentURL"),
            referrer: optional_field_text(&payload.parsed, "referrer"),
            time_on_page: time_on_page(&payload.parsed),
            event_timestamp: field_text(&payload.parsed, "timestamp"),
            data: payload.canonical,
            data_hash,
            log_type: request.kind,
        };

        let created = sink
            .insert_if_absent(&entry)
            .await
            .map_err(|err| Error::Store(Box::new(err)))?;
        if created {
            tracing::debug!(
                project_id = %entry.project_id,
                log_type = entry.log_type.as_str(),
                "log entry created"
            );
        } else {
            tracing::debug!(project_id = %entry.project_id, "duplicate beacon ignored");
        }
        Ok(IngestOutcome::Accepted)
    }
}

/// Render a payload field as text: strings verbatim, everything else in its
/// JSON form (a numeric timestamp becomes `"1000"`).
fn field_text(parsed: &Value, field: &str) -> String {
    match parsed.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn optional_field_text(parsed: &Value, field: &str) -> Option<String> {
    parsed
        .get(field)
        .filter(|v| is_present(v))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}

/// `timeOnPage` in milliseconds: absent or non-numeric defaults to 0,
/// negative values clamp to 0.
fn time_on_page(parsed: &Value) -> i64 {
    parsed
        .get("timeOnPage")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(0)
        .max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::convert::Infallible;
    use std::sync::Mutex;

    /// Sink that records inserts and reports duplicates by key.
    #[derive(Default)]
    struct RecordingSink {
        rows: Mutex<Vec<NewLogEntry>>,
    }

    impl LogSink for RecordingSink {
        type Error = Infallible;

        async fn insert_if_absent(
            &self,
            entry: &NewLogEntry,
        ) -> std::result::Result<bool, Infallible> {
            let mut rows = self.rows.lock().unwrap();
            let seen = rows
                .iter()
                .any(|r| r.project_id == entry.project_id && r.data_hash == entry.data_hash);
            if !seen {
                rows.push(entry.clone());
            }
            Ok(!seen)
        }
    }

    /// Sink that always fails.
    struct FailingSink;

    impl LogSink for FailingSink {
        type Error = std::io::Error;

        async fn insert_if_absent(
            &self,
            _entry: &NewLogEntry,
        ) -> std::result::Result<bool, std::io::Error> {
            Err(std::io::Error::other("no such table: logs"))
        }
    }

    fn pipeline() -> IngestPipeline {
        IngestPipeline::new(PepperedHasher::new("test-pepper").unwrap())
    }

    fn request(data: PayloadRepresentation) -> IngestRequest {
        IngestRequest {
            project_id: "p1".to_string(),
            visitor_ip: Some("203.0.113.7".to_string()),
            data,
            size_limit: 51200,
            kind: LogKind::Log,
        }
    }

    fn click_payload() -> PayloadRepresentation {
        PayloadRepresentation::Structured(json!({
            "eventType": "click",
            "timestamp": 1000,
            "currentURL": "https://x",
            "referrer": "direct",
            "timeOnPage": 1234,
        }))
    }

    #[tokio::test]
    async fn accepts_and_derives_fields() {
        let sink = RecordingSink::default();
        let outcome = pipeline().ingest(&sink, request(click_payload())).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Accepted);

        let rows = sink.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.event_type, "click");
        assert_eq!(row.current_url, "https://x");
        assert_eq!(row.event_timestamp, "1000");
        assert_eq!(row.referrer.as_deref(), Some("direct"));
        assert_eq!(row.time_on_page, 1234);
        assert!(is_sha256_like(&row.uid));
        assert!(is_sha256_like(&row.data_hash));
        assert_ne!(row.uid, row.data_hash);
    }

    #[tokio::test]
    async fn duplicate_submission_is_accepted_once_stored() {
        let sink = RecordingSink::default();
        let p = pipeline();
        assert_eq!(
            p.ingest(&sink, request(click_payload())).await.unwrap(),
            IngestOutcome::Accepted
        );
        assert_eq!(
            p.ingest(&sink, request(click_payload())).await.unwrap(),
            IngestOutcome::Accepted
        );
        assert_eq!(sink.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_visitor_ip_is_rejected_before_anything_else() {
        let sink = RecordingSink::default();
        let mut req = request(click_payload());
        req.visitor_ip = None;
        let outcome = pipeline().ingest(&sink, req).await.unwrap();
        assert_eq!(
            outcome,
            IngestOutcome::Rejected(RejectReason::MissingVisitorIdentity)
        );
        assert!(sink.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn validation_rejection_propagates_verbatim() {
        let sink = RecordingSink::default();
        let req = request(PayloadRepresentation::RawString(
            r#"{"eventType":"click"}"#.to_string(),
        ));
        let outcome = pipeline().ingest(&sink, req).await.unwrap();
        assert_eq!(
            outcome,
            IngestOutcome::Rejected(RejectReason::MissingPayloadFields(vec![
                "timestamp",
                "currentURL"
            ]))
        );
        assert!(sink.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn defaults_apply_for_optional_fields() {
        let sink = RecordingSink::default();
        let req = request(PayloadRepresentation::Structured(json!({
            "eventType": "quit",
            "timestamp": "2026-01-01T00:00:00Z",
            "currentURL": "https://x",
        })));
        pipeline().ingest(&sink, req).await.unwrap();
        let rows = sink.rows.lock().unwrap();
        assert_eq!(rows[0].referrer, None);
        assert_eq!(rows[0].time_on_page, 0);
    }

    #[tokio::test]
    async fn negative_time_on_page_clamps_to_zero() {
        let sink = RecordingSink::default();
        let req = request(PayloadRepresentation::Structured(json!({
            "eventType": "quit",
            "timestamp": "t",
            "currentURL": "https://x",
            "timeOnPage": -500,
        })));
        pipeline().ingest(&sink, req).await.unwrap();
        assert_eq!(sink.rows.lock().unwrap()[0].time_on_page, 0);
    }

    #[tokio::test]
    async fn string_and_structured_shapes_hash_independently() {
        // The same logical payload in two shapes is two distinct rows:
        // dedup is syntactic over the canonical string.
        let sink = RecordingSink::default();
        let p = pipeline();
        p.ingest(
            &sink,
            request(PayloadRepresentation::RawString(
                r#"{ "eventType": "click", "timestamp": 1000, "currentURL": "https://x" }"#
                    .to_string(),
            )),
        )
        .await
        .unwrap();
        p.ingest(
            &sink,
            request(PayloadRepresentation::Structured(json!({
                "eventType": "click",
                "timestamp": 1000,
                "currentURL": "https://x",
            }))),
        )
        .await
        .unwrap();
        assert_eq!(sink.rows.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_error() {
        let outcome = pipeline().ingest(&FailingSink, request(click_payload())).await;
        let err = outcome.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert!(err.to_string().contains("no such table"));
    }

    fn is_sha256_like(s: &str) -> bool {
        s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
    }
}
