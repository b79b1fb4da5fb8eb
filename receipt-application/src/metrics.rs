use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    events_received: AtomicU64,
    receipts_saved: AtomicU64,
    items_saved: AtomicU64,
    decode_errors: AtomicU64,
    fetch_errors: AtomicU64,
    extract_errors: AtomicU64,
    persist_errors: AtomicU64,
}

impl Metrics {
    pub fn record_event(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_saved(&self, item_count: usize) {
        self.receipts_saved.fetch_add(1, Ordering::Relaxed);
        self.items_saved
            .fetch_add(item_count as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self, stage: &str) {
        let counter = match stage {
            "decode" => &self.decode_errors,
            "fetch" => &self.fetch_errors,
            "extract" => &self.extract_errors,
            "persist" => &self.persist_errors,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let events = self.events_received.load(Ordering::Relaxed);
        let receipts = self.receipts_saved.load(Ordering::Relaxed);
        let items = self.items_saved.load(Ordering::Relaxed);

        format!(
            "# TYPE receipt_hook_events_total counter\n\
receipt_hook_events_total {}\n\
# TYPE receipt_hook_receipts_saved_total counter\n\
receipt_hook_receipts_saved_total {}\n\
# TYPE receipt_hook_items_saved_total counter\n\
receipt_hook_items_saved_total {}\n\
# TYPE receipt_hook_stage_errors_total counter\n\
receipt_hook_stage_errors_total{{stage=\"decode\"}} {}\n\
receipt_hook_stage_errors_total{{stage=\"fetch\"}} {}\n\
receipt_hook_stage_errors_total{{stage=\"extract\"}} {}\n\
receipt_hook_stage_errors_total{{stage=\"persist\"}} {}\n",
            events,
            receipts,
            items,
            self.decode_errors.load(Ordering::Relaxed),
            self.fetch_errors.load(Ordering::Relaxed),
            self.extract_errors.load(Ordering::Relaxed),
            self.persist_errors.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_counters_per_stage() {
        let metrics = Metrics::default();
        metrics.record_event();
        metrics.record_event();
        metrics.record_saved(3);
        metrics.record_failure("fetch");
        metrics.record_failure("unknown");
        let text = metrics.render_prometheus();
        assert!(text.contains("receipt_hook_events_total 2\n"));
        assert!(text.contains("receipt_hook_items_saved_total 3\n"));
        assert!(text.contains("receipt_hook_stage_errors_total{stage=\"fetch\"} 1\n"));
        assert!(text.contains("receipt_hook_stage_errors_total{stage=\"decode\"} 0\n"));
    }
}
