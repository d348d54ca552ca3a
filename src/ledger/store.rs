// ============================================================================
// Auction Store
// Persistence seam for auctions, clearing results and allocations
// ============================================================================

use crate::domain::{Allocation, AllocationId, Auction, AuctionId, ClearingResult};
use crate::error::{AuctionError, AuctionResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Storage contract the engine runs against.
///
/// The single non-trivial obligation is `commit_clearing`: "does a clearing
/// result already exist" is the single-writer guard, checked and settled in
/// the same atomic step that persists the result, never an in-memory flag.
pub trait AuctionStore: Send + Sync {
    fn insert_auction(&self, auction: Arc<Auction>);

    fn auction(&self, auction_id: AuctionId) -> Option<Arc<Auction>>;

    fn clearing_result(&self, auction_id: AuctionId) -> Option<Arc<ClearingResult>>;

    fn allocation(&self, allocation_id: AllocationId) -> Option<Arc<Allocation>>;

    /// Allocations for an auction, in clearing order.
    fn allocations_for(&self, auction_id: AuctionId) -> Vec<Arc<Allocation>>;

    /// Persist one clearing run as a single atomic unit: reject if a result
    /// already exists (`AlreadyCleared`), otherwise write the result, every
    /// allocation, and the auction's Completed status together. Partial
    /// persistence must never be observable.
    fn commit_clearing(
        &self,
        result: ClearingResult,
        allocations: Vec<Allocation>,
    ) -> AuctionResult<(Arc<ClearingResult>, Vec<Arc<Allocation>>)>;
}

// ============================================================================
// In-Memory Store
// ============================================================================

#[derive(Default)]
struct StoreInner {
    auctions: HashMap<AuctionId, Arc<Auction>>,
    results: HashMap<AuctionId, Arc<ClearingResult>>,
    allocations: HashMap<AllocationId, Arc<Allocation>>,
    /// Allocation ids per auction, in clearing order
    by_auction: HashMap<AuctionId, Vec<AllocationId>>,
}

/// In-memory store. One RwLock over the whole record set: the write lock is
/// what makes `commit_clearing` all-or-nothing under concurrent triggers.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuctionStore for InMemoryStore {
    fn insert_auction(&self, auction: Arc<Auction>) {
        self.inner.write().auctions.insert(auction.id, auction);
    }

    fn auction(&self, auction_id: AuctionId) -> Option<Arc<Auction>> {
        self.inner.read().auctions.get(&auction_id).cloned()
    }

    fn clearing_result(&self, auction_id: AuctionId) -> Option<Arc<ClearingResult>> {
        self.inner.read().results.get(&auction_id).cloned()
    }

    fn allocation(&self, allocation_id: AllocationId) -> Option<Arc<Allocation>> {
        self.inner.read().allocations.get(&allocation_id).cloned()
    }

    fn allocations_for(&self, auction_id: AuctionId) -> Vec<Arc<Allocation>> {
        let inner = self.inner.read();
        inner
            .by_auction
            .get(&auction_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.allocations.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn commit_clearing(
        &self,
        result: ClearingResult,
        allocations: Vec<Allocation>,
    ) -> AuctionResult<(Arc<ClearingResult>, Vec<Arc<Allocation>>)> {
        let auction_id = result.auction_id;
        let mut inner = self.inner.write();

        // Idempotency guard: losing a race here is a normal outcome
        if inner.results.contains_key(&auction_id) {
            return Err(AuctionError::AlreadyCleared { auction_id });
        }

        let auction = inner
            .auctions
            .get(&auction_id)
            .cloned()
            .ok_or(AuctionError::UnknownAuction(auction_id))?;

        // Status flip is validated before anything is written; a cancel that
        // slipped in ahead of us aborts the whole commit
        auction.try_complete(result.clearing_price, result.total_demand)?;

        let result = Arc::new(result);
        inner.results.insert(auction_id, Arc::clone(&result));

        let mut stored = Vec::with_capacity(allocations.len());
        let mut ids = Vec::with_capacity(allocations.len());
        for allocation in allocations {
            let allocation = Arc::new(allocation);
            ids.push(allocation.id);
            inner
                .allocations
                .insert(allocation.id, Arc::clone(&allocation));
            stored.push(allocation);
        }
        inner.by_auction.insert(auction_id, ids);

        Ok((result, stored))
    }
}
