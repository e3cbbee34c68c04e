use crate::media::file::MediaFile;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Issues preview handles and tracks how many are still alive.
///
/// Handles release themselves on drop, so replacing a slot or tearing down
/// the workflow can never leak one.
#[derive(Debug, Clone, Default)]
pub struct PreviewLedger {
    inner: Arc<LedgerInner>,
}

#[derive(Debug, Default)]
struct LedgerInner {
    next_id: AtomicU64,
    live: AtomicUsize,
}

impl PreviewLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, media: &MediaFile) -> PreviewHandle {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.inner.live.fetch_add(1, Ordering::AcqRel);
        log::debug!("preview #{} created for {}", id, media.file_name());
        PreviewHandle {
            id,
            bytes: media.shared_bytes(),
            ledger: Arc::clone(&self.inner),
        }
    }

    /// Number of handles not yet released.
    pub fn live(&self) -> usize {
        self.inner.live.load(Ordering::Acquire)
    }
}

/// Display-only reference to a slot's image bytes.
///
/// Not `Clone`: each handle has exactly one owner. Frontends key their own
/// texture caches on [`PreviewHandle::id`].
#[derive(Debug)]
pub struct PreviewHandle {
    id: u64,
    bytes: Arc<[u8]>,
    ledger: Arc<LedgerInner>,
}

impl PreviewHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.ledger.live.fetch_sub(1, Ordering::AcqRel);
        log::debug!("preview #{} released", self.id);
    }
}
