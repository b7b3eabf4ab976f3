//! Streaming query results: iterates a resolved id list in fixed-size
//! batches, pinning each batch's nodes in the partial loader for the
//! duration of the batch via `begin_usage`/`end_usage`.
//!
//! Grounded on the batched-result iteration implied by spec §4.8's
//! "Streaming results" subsection, layered on the same `PartialLoader`
//! used for `load_temporal_window`/`load_spatial_region`.

use super::PartialLoader;
use crate::cancel::CancellationToken;
use crate::error::MeridianResult;
use crate::node::Node;
use std::sync::Arc;
use uuid::Uuid;

pub struct StreamingQueryResult {
    loader: Arc<PartialLoader>,
    ids: Vec<Uuid>,
    batch_size: usize,
    cursor: usize,
    cancel: CancellationToken,
    in_flight: Vec<Uuid>,
}

impl StreamingQueryResult {
    pub fn new(loader: Arc<PartialLoader>, ids: Vec<Uuid>, batch_size: usize) -> Self {
        Self {
            loader,
            ids,
            batch_size: batch_size.max(1),
            cursor: 0,
            cancel: CancellationToken::new(),
            in_flight: Vec::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.ids.len()
    }

    fn release_in_flight(&mut self) {
        for id in self.in_flight.drain(..) {
            self.loader.end_usage(id);
        }
    }

    /// Fetches and returns the next batch, or `None` once the id list is
    /// exhausted or cancellation has been signalled. Each returned batch's
    /// nodes remain pinned (ref-counted) until the following call, so the
    /// caller's clones stay valid even if GC runs in between.
    pub fn next_batch(&mut self) -> MeridianResult<Option<Vec<Node>>> {
        self.release_in_flight();
        if self.is_exhausted() || self.cancel.is_cancelled() {
            return Ok(None);
        }

        let end = (self.cursor + self.batch_size).min(self.ids.len());
        let slice = &self.ids[self.cursor..end];
        self.cursor = end;

        let mut batch = Vec::with_capacity(slice.len());
        for id in slice {
            self.loader.begin_usage(*id);
            self.in_flight.push(*id);
            if let Some(node) = self.loader.get(*id)? {
                batch.push(node);
            }
        }
        Ok(Some(batch))
    }
}

impl Drop for StreamingQueryResult {
    fn drop(&mut self) {
        self.release_in_flight();
    }
}
