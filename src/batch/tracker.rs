//! Batch-scoped status aggregation.
//!
//! A [`BatchStatusTracker`] is created when a batch starts, threaded by
//! ownership through every pipeline stage, and discarded when the batch
//! finishes. It is never persisted and never shared ambiently; serializing
//! updates for one id is guaranteed by `&mut self`.

use std::collections::HashMap;

use chrono::Utc;

use super::record::{RecordInfo, RecordStatus};
use super::status::{IndexingStatus, OperationType};

/// Collaborator receiving the batch-level debug lines when a batch is
/// finalized.
pub trait TelemetrySink {
    fn log_warning(&self, lines: Vec<String>);
}

/// Production sink: one `warn` event per debug line.
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn log_warning(&self, lines: Vec<String>) {
        for line in lines {
            tracing::warn!(target: "flowstat::batch", "{line}");
        }
    }
}

/// Tracks the per-record outcome of one batch and folds repeated updates
/// into a single worst-case status per record.
///
/// All operations are lenient by design: unknown ids are recorded rather
/// than rejected (late and out-of-order events are expected), and nothing
/// here errors. The one hard invariant is that a stored status only ever
/// moves to an equal-or-worse severity.
pub struct BatchStatusTracker<T: TelemetrySink> {
    entries: HashMap<String, RecordStatus>,
    debug_infos: Vec<String>,
    lenient_creates: u32,
    sink: T,
}

impl<T: TelemetrySink> BatchStatusTracker<T> {
    pub fn new(sink: T) -> Self {
        Self {
            entries: HashMap::new(),
            debug_infos: Vec::new(),
            lenient_creates: 0,
            sink,
        }
    }

    /// Registers the announced batch items, each starting in PROCESSING.
    ///
    /// Ids already present are left untouched; repeated calls are additive.
    /// Empty input is a no-op.
    pub fn initialize(&mut self, records: &[RecordInfo]) {
        for info in records {
            self.entries
                .entry(info.id.clone())
                .or_insert_with(|| RecordStatus::tracked(info));
        }
    }

    /// Applies a status event to one record.
    ///
    /// For a known id: a non-empty message is appended to the trace, the
    /// status code and update time are set unconditionally, and the stored
    /// status is replaced only when the incoming one is strictly worse.
    /// For an unknown id an entry is created directly with the given status.
    pub fn add_or_update(
        &mut self,
        id: &str,
        status: IndexingStatus,
        status_code: i32,
        message: Option<&str>,
    ) {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.progress.status_code = status_code;
                entry.progress.last_update = Utc::now();
                if let Some(msg) = message
                    && !msg.is_empty()
                {
                    entry.progress.push_trace(msg);
                }
                if status.is_worse_than(entry.status) {
                    entry.status = status;
                }
            }
            None => {
                let mut entry = RecordStatus::lenient(id, status);
                entry.progress.status_code = status_code;
                if let Some(msg) = message
                    && !msg.is_empty()
                {
                    entry.progress.push_trace(msg);
                }
                self.lenient_creates += 1;
                tracing::debug!(
                    target: "flowstat::batch",
                    id,
                    %status,
                    "status event for an id never announced to this batch"
                );
                self.entries.insert(id.to_string(), entry);
            }
        }
    }

    /// [`add_or_update`](Self::add_or_update) over a set of ids.
    pub fn add_or_update_many(
        &mut self,
        ids: &[String],
        status: IndexingStatus,
        status_code: i32,
        message: Option<&str>,
    ) {
        for id in ids {
            self.add_or_update(id, status, status_code, message);
        }
    }

    /// Like [`add_or_update`](Self::add_or_update), additionally appending a
    /// line to the batch-level debug list. The debug line is recorded
    /// regardless of the per-id outcome.
    pub fn add_or_update_with_debug(
        &mut self,
        id: &str,
        status: IndexingStatus,
        status_code: i32,
        message: Option<&str>,
        debug_info: &str,
    ) {
        self.debug_infos.push(debug_info.to_string());
        self.add_or_update(id, status, status_code, message);
    }

    /// Multi-id variant of
    /// [`add_or_update_with_debug`](Self::add_or_update_with_debug).
    pub fn add_or_update_many_with_debug(
        &mut self,
        ids: &[String],
        status: IndexingStatus,
        status_code: i32,
        message: Option<&str>,
        debug_info: &str,
    ) {
        self.debug_infos.push(debug_info.to_string());
        self.add_or_update_many(ids, status, status_code, message);
    }

    /// Ids whose current status equals `status` exactly (never "at least as
    /// severe as").
    pub fn ids_with_status(&self, status: IndexingStatus) -> Vec<String> {
        self.entries
            .values()
            .filter(|entry| entry.status == status)
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// Kind of a tracked record; `None` both for unknown ids and for entries
    /// created leniently. An absent result is a normal outcome.
    pub fn kind_of(&self, id: &str) -> Option<&str> {
        self.entries.get(id).and_then(|e| e.kind.as_deref())
    }

    pub fn entry_for(&self, id: &str) -> Option<&RecordStatus> {
        self.entries.get(id)
    }

    /// Entries matching the status exactly and carrying the given operation
    /// type.
    pub fn entries_where(
        &self,
        status: IndexingStatus,
        operation_type: OperationType,
    ) -> Vec<&RecordStatus> {
        self.entries
            .values()
            .filter(|e| e.status == status && e.operation_type == Some(operation_type))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries created from events for ids never announced via
    /// [`initialize`](Self::initialize).
    pub fn lenient_creates(&self) -> u32 {
        self.lenient_creates
    }

    /// Forces every record still in PROCESSING to FAIL, appending
    /// `error_message` to its trace, then flushes the accumulated debug
    /// lines to the telemetry sink.
    ///
    /// This is the completeness guarantee: after finalization no entry is
    /// left non-terminal, whether the batch completed or was abandoned.
    /// Unresolved items are degraded instead of raising.
    pub fn finalize(&mut self, error_message: &str) {
        for entry in self.entries.values_mut() {
            if entry.status == IndexingStatus::Processing {
                entry.status = IndexingStatus::Fail;
                entry.progress.push_trace(error_message);
                entry.progress.last_update = Utc::now();
            }
        }

        let debug_infos = std::mem::take(&mut self.debug_infos);
        if !debug_infos.is_empty() {
            self.sink.log_warning(debug_infos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records flushed debug lines for assertions.
    #[derive(Default)]
    struct RecordingSink {
        flushed: Mutex<Vec<Vec<String>>>,
    }

    impl TelemetrySink for &RecordingSink {
        fn log_warning(&self, lines: Vec<String>) {
            self.flushed.lock().unwrap().push(lines);
        }
    }

    fn info(id: &str, op: OperationType) -> RecordInfo {
        RecordInfo {
            id: id.into(),
            kind: "tenant:wellbore:1.0.0".into(),
            op,
        }
    }

    fn tracker(sink: &RecordingSink) -> BatchStatusTracker<&RecordingSink> {
        BatchStatusTracker::new(sink)
    }

    #[test]
    fn initialize_registers_all_ids_as_processing() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[
            info("r1", OperationType::Create),
            info("r2", OperationType::Update),
        ]);

        assert_eq!(t.len(), 2);
        assert_eq!(t.entry_for("r1").unwrap().status, IndexingStatus::Processing);
        assert_eq!(t.entry_for("r2").unwrap().status, IndexingStatus::Processing);
    }

    #[test]
    fn initialize_is_additive_and_keeps_existing_entries() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[info("r1", OperationType::Create)]);
        t.add_or_update("r1", IndexingStatus::Warn, 200, Some("mapping gap"));

        // Re-announcing r1 must not reset it.
        t.initialize(&[info("r1", OperationType::Create), info("r2", OperationType::Create)]);

        assert_eq!(t.len(), 2);
        assert_eq!(t.entry_for("r1").unwrap().status, IndexingStatus::Warn);
    }

    #[test]
    fn initialize_empty_is_noop() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[]);
        assert!(t.is_empty());
    }

    // The final status is the worst supplied, independent of order.
    #[test]
    fn severity_never_regresses() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[info("r1", OperationType::Create)]);

        for status in [
            IndexingStatus::Success,
            IndexingStatus::Warn,
            IndexingStatus::Success,
        ] {
            t.add_or_update("r1", status, 200, None);
        }

        assert_eq!(t.entry_for("r1").unwrap().status, IndexingStatus::Warn);
    }

    #[test]
    fn worst_status_wins_in_any_order() {
        let permutations: [[IndexingStatus; 3]; 3] = [
            [IndexingStatus::Fail, IndexingStatus::Success, IndexingStatus::Warn],
            [IndexingStatus::Success, IndexingStatus::Fail, IndexingStatus::Warn],
            [IndexingStatus::Warn, IndexingStatus::Success, IndexingStatus::Fail],
        ];
        for statuses in permutations {
            let sink = RecordingSink::default();
            let mut t = tracker(&sink);
            t.initialize(&[info("r1", OperationType::Create)]);
            for status in statuses {
                t.add_or_update("r1", status, 200, None);
            }
            assert_eq!(t.entry_for("r1").unwrap().status, IndexingStatus::Fail);
        }
    }

    // WARN then a late SUCCESS keeps WARN, trace in order.
    #[test]
    fn late_success_does_not_overwrite_warn() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[info("r1", OperationType::Create)]);

        t.add_or_update("r1", IndexingStatus::Warn, 200, Some("partial mapping mismatch"));
        t.add_or_update("r1", IndexingStatus::Success, 200, Some("late duplicate event"));

        let entry = t.entry_for("r1").unwrap();
        assert_eq!(entry.status, IndexingStatus::Warn);
        assert_eq!(
            entry.progress.trace,
            vec!["partial mapping mismatch", "late duplicate event"]
        );
        assert_eq!(entry.progress.latest_trace(), Some("late duplicate event"));
    }

    #[test]
    fn status_code_and_update_time_change_unconditionally() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[info("r1", OperationType::Create)]);

        t.add_or_update("r1", IndexingStatus::Fail, 500, Some("boom"));
        let first_update = t.entry_for("r1").unwrap().progress.last_update;

        // A better status still refreshes code and timestamp.
        t.add_or_update("r1", IndexingStatus::Success, 200, None);
        let entry = t.entry_for("r1").unwrap();
        assert_eq!(entry.status, IndexingStatus::Fail);
        assert_eq!(entry.progress.status_code, 200);
        assert!(entry.progress.last_update >= first_update);
    }

    #[test]
    fn empty_message_is_not_appended_to_trace() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[info("r1", OperationType::Create)]);

        t.add_or_update("r1", IndexingStatus::Success, 200, Some(""));
        t.add_or_update("r1", IndexingStatus::Success, 200, None);

        assert!(t.entry_for("r1").unwrap().progress.trace.is_empty());
    }

    #[test]
    fn unknown_id_is_created_leniently() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);

        t.add_or_update("never-announced", IndexingStatus::Skip, 404, Some("no schema"));

        let entry = t.entry_for("never-announced").unwrap();
        assert_eq!(entry.status, IndexingStatus::Skip);
        assert!(entry.kind.is_none());
        assert_eq!(entry.progress.trace, vec!["no schema"]);
        assert_eq!(t.lenient_creates(), 1);
    }

    #[test]
    fn add_or_update_many_touches_each_id() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[info("r1", OperationType::Create), info("r2", OperationType::Create)]);

        t.add_or_update_many(
            &["r1".to_string(), "r2".to_string()],
            IndexingStatus::Success,
            200,
            Some("indexed"),
        );

        assert_eq!(t.entry_for("r1").unwrap().status, IndexingStatus::Success);
        assert_eq!(t.entry_for("r2").unwrap().status, IndexingStatus::Success);
    }

    // Exact-match filtering, not "at least as severe as".
    #[test]
    fn ids_with_status_matches_exactly() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[
            info("ok", OperationType::Create),
            info("warned", OperationType::Create),
            info("failed", OperationType::Create),
            info("pending", OperationType::Create),
        ]);
        t.add_or_update("ok", IndexingStatus::Success, 200, None);
        t.add_or_update("warned", IndexingStatus::Warn, 200, None);
        t.add_or_update("failed", IndexingStatus::Fail, 500, None);

        let successes = t.ids_with_status(IndexingStatus::Success);
        assert_eq!(successes, vec!["ok".to_string()]);
        assert_eq!(t.ids_with_status(IndexingStatus::Processing), vec!["pending".to_string()]);
    }

    #[test]
    fn entries_where_filters_status_and_operation() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[
            info("c1", OperationType::Create),
            info("u1", OperationType::Update),
        ]);
        t.add_or_update("c1", IndexingStatus::Success, 200, None);
        t.add_or_update("u1", IndexingStatus::Success, 200, None);

        let creates = t.entries_where(IndexingStatus::Success, OperationType::Create);
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].id, "c1");

        // Lenient entries have no operation type and never match.
        t.add_or_update("loose", IndexingStatus::Success, 200, None);
        let creates = t.entries_where(IndexingStatus::Success, OperationType::Create);
        assert_eq!(creates.len(), 1);
    }

    #[test]
    fn point_lookups_return_none_for_unknown_ids() {
        let sink = RecordingSink::default();
        let t = tracker(&sink);
        assert!(t.entry_for("missing").is_none());
        assert!(t.kind_of("missing").is_none());
    }

    // Finalization completeness: nothing stays PROCESSING.
    #[test]
    fn finalize_fails_all_unresolved_entries() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[
            info("r1", OperationType::Create),
            info("r2", OperationType::Create),
            info("r3", OperationType::Create),
        ]);

        t.finalize("indexing aborted");

        for id in ["r1", "r2", "r3"] {
            let entry = t.entry_for(id).unwrap();
            assert_eq!(entry.status, IndexingStatus::Fail);
            assert_eq!(entry.progress.latest_trace(), Some("indexing aborted"));
        }
        assert!(t.ids_with_status(IndexingStatus::Processing).is_empty());
    }

    #[test]
    fn finalize_leaves_resolved_entries_untouched() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[info("done", OperationType::Create), info("stuck", OperationType::Create)]);
        t.add_or_update("done", IndexingStatus::Success, 200, Some("indexed"));

        t.finalize("batch abandoned");

        assert_eq!(t.entry_for("done").unwrap().status, IndexingStatus::Success);
        assert_eq!(t.entry_for("done").unwrap().progress.trace, vec!["indexed"]);
        assert_eq!(t.entry_for("stuck").unwrap().status, IndexingStatus::Fail);
    }

    #[test]
    fn finalize_flushes_debug_infos_to_sink() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[info("r1", OperationType::Create)]);

        t.add_or_update_with_debug(
            "r1",
            IndexingStatus::Warn,
            200,
            Some("partial"),
            "mapper fell back to defaults",
        );
        t.add_or_update_many_with_debug(
            &["r1".to_string()],
            IndexingStatus::Success,
            200,
            None,
            "second pass",
        );
        t.finalize("done");

        let flushed = sink.flushed.lock().unwrap();
        assert_eq!(flushed.len(), 1);
        assert_eq!(
            flushed[0],
            vec!["mapper fell back to defaults".to_string(), "second pass".to_string()]
        );
    }

    #[test]
    fn finalize_without_debug_infos_does_not_flush() {
        let sink = RecordingSink::default();
        let mut t = tracker(&sink);
        t.initialize(&[info("r1", OperationType::Create)]);
        t.finalize("done");
        assert!(sink.flushed.lock().unwrap().is_empty());
    }
}
