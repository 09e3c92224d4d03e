//! Deferred-operation transaction log.
//!
//! A transaction is a frame on a stack. While any frame is active, engine
//! mutations append to it instead of touching the indices. Committing an
//! inner frame only retargets the active pointer; nothing executes until
//! the outermost frame commits, at which point every frame's ops run in
//! order and the memoized queries are linked into one related group.
//!
//! The `invalidated` set spans the whole stack: queries invalidated during
//! the session (including during commit execution) are excluded from
//! linking.

use graphcache_core::Error;
use serde_json::Value;
use std::collections::HashSet;

/// A mutation captured for deferred execution.
#[derive(Clone, Debug, PartialEq)]
pub enum DeferredOp {
    Remember { query: String, result: Value },
    InvalidateQuery { query: String },
    InvalidateGraph { graph_uri: String },
}

/// Lifecycle of a transaction frame. There is no rollback state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    Active,
    Finished,
}

/// One entry on the transaction stack.
#[derive(Debug)]
pub struct TransactionFrame {
    /// Dense ID, assigned in push order starting at 0
    pub id: usize,
    pub state: FrameState,
    /// Deferred operations in placement order
    pub placed_ops: Vec<DeferredOp>,
}

/// What `finish_active` concluded.
#[derive(Debug, PartialEq, Eq)]
pub enum FinishOutcome {
    /// An inner frame finished; ops stay deferred and `next_active` is the
    /// enclosing frame
    Inner { next_active: usize },
    /// The outermost frame finished; all deferred ops are due
    Outermost,
}

/// The per-engine transaction stack.
#[derive(Debug, Default)]
pub struct TransactionLog {
    frames: Vec<TransactionFrame>,
    active: Option<usize>,
    invalidated: HashSet<String>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new active frame, returning its ID.
    pub fn begin(&mut self) -> usize {
        let id = self.frames.len();
        self.frames.push(TransactionFrame {
            id,
            state: FrameState::Active,
            placed_ops: Vec::new(),
        });
        self.active = Some(id);
        id
    }

    /// Whether a frame is currently accepting deferred ops.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Whether a transaction session is open at all. Stays true while the
    /// outermost commit is executing, so invalidations during execution are
    /// still recorded.
    pub fn is_open(&self) -> bool {
        !self.frames.is_empty()
    }

    /// ID of the frame accepting ops, if any.
    pub fn active_id(&self) -> Option<usize> {
        self.active
    }

    /// Number of frames still active.
    pub fn running(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| f.state == FrameState::Active)
            .count()
    }

    /// Append an op to the active frame.
    pub fn defer(&mut self, op: DeferredOp) {
        let idx = self.active.expect("defer requires an active frame");
        self.frames[idx].placed_ops.push(op);
    }

    /// Record a query invalidated while the session is open, so the commit
    /// step knows not to re-link it.
    pub fn note_invalidated(&mut self, qid: &str) {
        if self.is_open() {
            self.invalidated.insert(qid.to_string());
        }
    }

    pub fn was_invalidated(&self, qid: &str) -> bool {
        self.invalidated.contains(qid)
    }

    /// Finish the active frame. Errors when no frame is active.
    pub fn finish_active(&mut self) -> Result<FinishOutcome, Error> {
        let Some(idx) = self.active else {
            return Err(Error::NoActiveTransaction);
        };
        self.frames[idx].state = FrameState::Finished;

        match self
            .frames
            .iter()
            .rposition(|f| f.state == FrameState::Active)
        {
            Some(next) => {
                self.active = Some(next);
                Ok(FinishOutcome::Inner { next_active: next })
            }
            None => {
                self.active = None;
                Ok(FinishOutcome::Outermost)
            }
        }
    }

    /// Drain every frame's ops, in frame order then placement order. The
    /// frames themselves stay until [`clear`](Self::clear) so invalidation
    /// recording keeps working during execution.
    pub fn take_all_ops(&mut self) -> Vec<DeferredOp> {
        self.frames
            .iter_mut()
            .flat_map(|f| std::mem::take(&mut f.placed_ops))
            .collect()
    }

    /// Tear down the session: frames, active pointer, invalidation set.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.active = None;
        self.invalidated.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_assigns_dense_ids() {
        let mut log = TransactionLog::new();
        assert_eq!(log.begin(), 0);
        assert_eq!(log.begin(), 1);
        assert_eq!(log.begin(), 2);
        assert_eq!(log.active_id(), Some(2));
        assert_eq!(log.running(), 3);
    }

    #[test]
    fn test_finish_retargets_active() {
        let mut log = TransactionLog::new();
        log.begin();
        log.begin();

        assert_eq!(
            log.finish_active().unwrap(),
            FinishOutcome::Inner { next_active: 0 }
        );
        assert_eq!(log.active_id(), Some(0));
        assert_eq!(log.running(), 1);

        assert_eq!(log.finish_active().unwrap(), FinishOutcome::Outermost);
        assert_eq!(log.active_id(), None);
        // Frames remain until clear()
        assert!(log.is_open());

        log.clear();
        assert!(!log.is_open());
    }

    #[test]
    fn test_finish_without_begin_errors() {
        let mut log = TransactionLog::new();
        assert!(matches!(
            log.finish_active(),
            Err(Error::NoActiveTransaction)
        ));
    }

    #[test]
    fn test_ops_drain_in_frame_order() {
        let mut log = TransactionLog::new();
        log.begin();
        log.defer(DeferredOp::InvalidateGraph {
            graph_uri: "g0".into(),
        });
        log.begin();
        log.defer(DeferredOp::InvalidateGraph {
            graph_uri: "g1".into(),
        });
        log.finish_active().unwrap();
        // Back on the outer frame
        log.defer(DeferredOp::InvalidateGraph {
            graph_uri: "g0-later".into(),
        });
        log.finish_active().unwrap();

        let uris: Vec<String> = log
            .take_all_ops()
            .into_iter()
            .map(|op| match op {
                DeferredOp::InvalidateGraph { graph_uri } => graph_uri,
                other => panic!("unexpected op {other:?}"),
            })
            .collect();
        assert_eq!(uris, vec!["g0", "g0-later", "g1"]);
    }

    #[test]
    fn test_invalidation_recording_scoped_to_session() {
        let mut log = TransactionLog::new();
        // No session open: nothing recorded
        log.note_invalidated("qc-x");
        assert!(!log.was_invalidated("qc-x"));

        log.begin();
        log.note_invalidated("qc-x");
        assert!(log.was_invalidated("qc-x"));

        log.finish_active().unwrap();
        // Still open mid-commit
        log.note_invalidated("qc-y");
        assert!(log.was_invalidated("qc-y"));

        log.clear();
        assert!(!log.was_invalidated("qc-x"));
    }
}
