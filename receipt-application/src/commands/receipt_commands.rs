use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

use receipt_domain::{decode_notification, ExtractionOutcome, StorageEventDescriptor};

use crate::{AppError, AppState};

#[derive(Debug, Clone)]
pub struct ProcessedReceipt {
    pub receipt_id: i64,
    pub item_count: usize,
    pub event: StorageEventDescriptor,
}

/// Runs one upload notification through decode, fetch, extract and persist,
/// strictly in that order. The first failing stage ends the request.
///
/// All stages share one deadline of `request_timeout_seconds`; the stage
/// running when it passes is reported as timed out.
pub async fn process_storage_event(
    state: &AppState,
    body: &[u8],
) -> Result<ProcessedReceipt, AppError> {
    state.metrics.record_event();
    let result = run_pipeline(state, body).await;
    if let Err(err) = &result {
        if let Some(stage) = err.stage() {
            state.metrics.record_failure(stage);
        }
    }
    result
}

async fn run_pipeline(state: &AppState, body: &[u8]) -> Result<ProcessedReceipt, AppError> {
    let event = decode_notification(body).map_err(|err| AppError::MalformedEvent(err.to_string()))?;
    info!(
        bucket = %event.bucket_name,
        key = %event.object_key,
        size = event.object_size,
        event_name = event.event_name.as_deref().unwrap_or("<none>"),
        "storage event received"
    );

    let seconds = state.config.request_timeout_seconds.max(1);
    let deadline = Instant::now() + Duration::from_secs(seconds);

    let scratch = before_deadline(
        deadline,
        seconds,
        "fetch",
        state.fetcher.fetch(&event.bucket_name, &event.object_key),
    )
    .await?
    .map_err(AppError::FetchFailed)?;

    let outcome = before_deadline(
        deadline,
        seconds,
        "extract",
        state.extractor.extract(scratch.path(), &event.content_type),
    )
    .await?;
    // The downloaded image is only needed by the extractor.
    drop(scratch);

    let receipt = match outcome {
        Ok(ExtractionOutcome::Receipt(receipt)) => receipt,
        Ok(ExtractionOutcome::Failed { error }) => {
            warn!(key = %event.object_key, "extraction returned no receipt: {}", error);
            return Err(AppError::ExtractionFailed(error));
        }
        Err(err) => return Err(AppError::ExtractionFailed(format!("{:#}", err))),
    };

    let item_count = receipt.line_items().len();
    let receipt_id = before_deadline(
        deadline,
        seconds,
        "persist",
        state.receipt_repo.save_receipt(&receipt),
    )
    .await?
    .map_err(AppError::PersistenceFailed)?;
    state.metrics.record_saved(item_count);
    info!(
        receipt_id,
        items = item_count,
        key = %event.object_key,
        "receipt saved"
    );

    Ok(ProcessedReceipt {
        receipt_id,
        item_count,
        event,
    })
}

async fn before_deadline<T>(
    deadline: Instant,
    seconds: u64,
    stage: &'static str,
    work: impl Future<Output = T>,
) -> Result<T, AppError> {
    timeout_at(deadline, work).await.map_err(|_| {
        warn!(stage, seconds, "pipeline deadline passed");
        AppError::TimedOut { stage, seconds }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use anyhow::anyhow;
    use async_trait::async_trait;
    use receipt_domain::{
        scratch_path, ObjectFetcher, ReceiptExtraction, ReceiptExtractor, ReceiptRepository,
        RuntimeConfig, ScratchFile, StoredReceipt,
    };
    use serde_json::json;

    use crate::Metrics;

    struct DirFetcher {
        dir: PathBuf,
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ObjectFetcher for DirFetcher {
        async fn fetch(&self, _bucket: &str, key: &str) -> anyhow::Result<ScratchFile> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("NoSuchKey"));
            }
            let path = scratch_path(&self.dir, key)?;
            let file = ScratchFile::new(path);
            if let Some(parent) = file.path().parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(file.path(), b"\xff\xd8jpeg")?;
            Ok(file)
        }
    }

    struct FixedExtractor {
        outcome: ExtractionOutcome,
        delay: Option<Duration>,
        seen: Mutex<Vec<(PathBuf, bool)>>,
    }

    #[async_trait]
    impl ReceiptExtractor for FixedExtractor {
        async fn extract(
            &self,
            image: &Path,
            _content_type: &str,
        ) -> anyhow::Result<ExtractionOutcome> {
            self.seen
                .lock()
                .expect("lock")
                .push((image.to_path_buf(), image.exists()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.outcome.clone())
        }
    }

    #[derive(Default)]
    struct MemoryRepo {
        saved: Mutex<Vec<ReceiptExtraction>>,
    }

    #[async_trait]
    impl ReceiptRepository for MemoryRepo {
        async fn ensure_schema(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn save_receipt(&self, receipt: &ReceiptExtraction) -> anyhow::Result<i64> {
            let mut saved = self.saved.lock().expect("lock");
            saved.push(receipt.clone());
            Ok(saved.len() as i64)
        }

        async fn fetch_receipt(&self, _id: i64) -> anyhow::Result<Option<StoredReceipt>> {
            Ok(None)
        }

        async fn ping(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Harness {
        state: AppState,
        fetcher: Arc<DirFetcher>,
        extractor: Arc<FixedExtractor>,
        repo: Arc<MemoryRepo>,
        _dir: tempfile::TempDir,
    }

    fn harness(outcome: ExtractionOutcome, fetch_fails: bool) -> Harness {
        harness_with(outcome, fetch_fails, None, 5)
    }

    fn harness_with(
        outcome: ExtractionOutcome,
        fetch_fails: bool,
        extract_delay: Option<Duration>,
        timeout_seconds: u64,
    ) -> Harness {
        let dir = tempfile::tempdir().expect("tempdir");
        let fetcher = Arc::new(DirFetcher {
            dir: dir.path().to_path_buf(),
            calls: AtomicUsize::new(0),
            fail: fetch_fails,
        });
        let extractor = Arc::new(FixedExtractor {
            outcome,
            delay: extract_delay,
            seen: Mutex::new(Vec::new()),
        });
        let repo = Arc::new(MemoryRepo::default());
        let state = AppState {
            config: RuntimeConfig {
                bind_addr: "127.0.0.1:0".to_string(),
                scratch_dir: dir.path().to_string_lossy().to_string(),
                log_dir: None,
                max_body_bytes: 1024 * 1024,
                request_timeout_seconds: timeout_seconds,
                ready_timeout_seconds: 1,
            },
            fetcher: fetcher.clone(),
            extractor: extractor.clone(),
            receipt_repo: repo.clone(),
            metrics: Arc::new(Metrics::default()),
        };
        Harness {
            state,
            fetcher,
            extractor,
            repo,
            _dir: dir,
        }
    }

    fn notification() -> Vec<u8> {
        json!({
            "EventName": "s3:ObjectCreated:Put",
            "Records": [{
                "eventTime": "2024-01-01T09:00:00Z",
                "s3": {
                    "bucket": {"name": "uploads"},
                    "object": {
                        "key": "receipts/2024-01-01.jpg",
                        "size": 2048,
                        "contentType": "image/jpeg"
                    }
                }
            }]
        })
        .to_string()
        .into_bytes()
    }

    fn cafe_luna() -> ReceiptExtraction {
        serde_json::from_value(json!({
            "businessName": "Cafe Luna",
            "date": "2024-01-01",
            "total": 12.5,
            "tax": 1.0,
            "items": [{"name": "Coffee", "price": 4.5}, {"name": "Bagel", "price": 3.0}]
        }))
        .expect("receipt")
    }

    #[tokio::test]
    async fn processes_event_end_to_end() {
        let h = harness(ExtractionOutcome::Receipt(cafe_luna()), false);
        let processed = process_storage_event(&h.state, &notification())
            .await
            .expect("processed");

        assert_eq!(processed.receipt_id, 1);
        assert_eq!(processed.item_count, 2);
        assert_eq!(processed.event.object_key, "receipts/2024-01-01.jpg");
        assert_eq!(h.repo.saved.lock().expect("lock")[0], cafe_luna());

        let seen = h.extractor.seen.lock().expect("lock");
        let (path, existed) = &seen[0];
        assert!(path.ends_with("receipts/2024-01-01.jpg"));
        assert!(*existed, "image must exist while extracting");
        assert!(!path.exists(), "scratch file must be removed afterwards");
    }

    #[tokio::test]
    async fn malformed_event_never_reaches_fetcher() {
        let h = harness(ExtractionOutcome::Receipt(cafe_luna()), false);
        for body in [
            json!({"EventName": "x"}).to_string(),
            json!({"Records": []}).to_string(),
            json!({"Records": [{"eventTime": "2024-01-01T09:00:00Z"}]}).to_string(),
        ] {
            let err = process_storage_event(&h.state, body.as_bytes())
                .await
                .expect_err("must fail");
            assert!(matches!(err, AppError::MalformedEvent(_)), "got {err:?}");
        }
        assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 0);
        assert!(h.state.metrics.render_prometheus().contains("stage=\"decode\"} 3"));
    }

    #[tokio::test]
    async fn fetch_failure_aborts_pipeline() {
        let h = harness(ExtractionOutcome::Receipt(cafe_luna()), true);
        let err = process_storage_event(&h.state, &notification())
            .await
            .expect_err("must fail");
        assert!(matches!(err, AppError::FetchFailed(_)));
        assert_eq!(err.stage(), Some("fetch"));
        assert!(h.extractor.seen.lock().expect("lock").is_empty());
        assert!(h.repo.saved.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn extraction_sentinel_is_a_hard_failure() {
        let h = harness(
            ExtractionOutcome::failed("Failed to parse response as JSON"),
            false,
        );
        let err = process_storage_event(&h.state, &notification())
            .await
            .expect_err("must fail");
        match &err {
            AppError::ExtractionFailed(reason) => {
                assert_eq!(reason, "Failed to parse response as JSON")
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(h.repo.saved.lock().expect("lock").is_empty());

        let seen = h.extractor.seen.lock().expect("lock");
        assert!(!seen[0].0.exists(), "scratch file removed on failure too");
    }

    #[tokio::test]
    async fn slow_extraction_times_out_with_extract_stage() {
        let h = harness_with(
            ExtractionOutcome::Receipt(cafe_luna()),
            false,
            Some(Duration::from_secs(3)),
            1,
        );
        let started = std::time::Instant::now();
        let err = process_storage_event(&h.state, &notification())
            .await
            .expect_err("must time out");

        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(
            matches!(err, AppError::TimedOut { stage: "extract", seconds: 1 }),
            "got {err:?}"
        );
        assert_eq!(err.stage(), Some("extract"));
        assert!(h.repo.saved.lock().expect("lock").is_empty());
        assert!(h
            .state
            .metrics
            .render_prometheus()
            .contains("receipt_hook_stage_errors_total{stage=\"extract\"} 1"));

        let seen = h.extractor.seen.lock().expect("lock");
        assert!(!seen[0].0.exists(), "scratch file removed after timeout");
    }
}
