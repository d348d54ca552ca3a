// ============================================================================
// Clearing Orchestrator
// Guards when and how the calculator may run against an auction
// ============================================================================

use crate::domain::clearing::{BidSnapshot, ClearingSnapshot};
use crate::domain::{Allocation, AuctionId, AuctionStatus, AuctionTransition, ClearingResult};
use crate::engine::calculator::compute_clearing;
use crate::error::{AuctionError, AuctionResult};
use crate::interfaces::{Clock, EngineEvent, EventHandler};
use crate::ledger::{AuctionStore, BidLedger};
use std::sync::Arc;

/// Why clearing was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearingTrigger {
    /// A scheduled check observed the collection window had ended
    WindowExpired,
    /// An authorized operator requested clearing now, overriding the window
    Manual,
}

/// Drives one auction from collected bids to a persisted clearing result.
///
/// Safe to invoke from concurrent callers: the automatic window-close check
/// and a manual operator trigger may race, and the loser receives
/// `AlreadyCleared` from the store's single-writer guard with no state
/// disturbed. The orchestrator itself holds no locks across the computation.
pub struct ClearingOrchestrator {
    store: Arc<dyn AuctionStore>,
    ledger: Arc<BidLedger>,
    clock: Arc<dyn Clock>,
    event_handler: Arc<dyn EventHandler>,
}

impl ClearingOrchestrator {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        ledger: Arc<BidLedger>,
        clock: Arc<dyn Clock>,
        event_handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            store,
            ledger,
            clock,
            event_handler,
        }
    }

    /// Run clearing for an auction.
    ///
    /// Preconditions: status `CollectingBids`, and either the collection
    /// window has ended or the trigger is `Manual`. The result, every
    /// allocation, and the auction's Completed status persist as one atomic
    /// unit; allocations with shares start settlement at `PendingPayment`.
    ///
    /// Calculator failures abort before anything is written; the auction's
    /// status is unchanged and the caller receives the typed error.
    pub fn trigger_clearing(
        &self,
        auction_id: AuctionId,
        trigger: ClearingTrigger,
    ) -> AuctionResult<Arc<ClearingResult>> {
        let auction = self
            .store
            .auction(auction_id)
            .ok_or(AuctionError::UnknownAuction(auction_id))?;

        // Fast-path report; the commit re-checks under the store's guard
        if self.store.clearing_result(auction_id).is_some() {
            return Err(AuctionError::AlreadyCleared { auction_id });
        }

        let status = auction.status();
        match status {
            AuctionStatus::CollectingBids => {},
            AuctionStatus::Completed => {
                return Err(AuctionError::AlreadyCleared { auction_id });
            },
            _ => {
                return Err(AuctionError::InvalidAuctionTransition {
                    auction_id,
                    current: status,
                    attempted: AuctionTransition::Complete,
                });
            },
        }

        let now = self.clock.now();
        if trigger != ClearingTrigger::Manual {
            if let Some(ends_at) = auction.bid_collection_end_time() {
                if now < ends_at {
                    return Err(AuctionError::CollectionWindowOpen {
                        auction_id,
                        ends_at,
                    });
                }
            }
        }

        // Snapshot the active bids; these exact tuples are stored with the
        // result so the computation is reproducible
        let bids: Vec<BidSnapshot> = self
            .ledger
            .active_bids(auction_id)
            .iter()
            .map(|bid| BidSnapshot {
                bidder_id: bid.bidder_id,
                quantity_requested: bid.quantity_requested,
                max_price: bid.max_price,
                bid_time: bid.bid_time,
            })
            .collect();

        let outcome = compute_clearing(&bids, auction.shares_count, auction.min_price)?;

        let result = ClearingResult {
            auction_id,
            clearing_price: outcome.clearing_price,
            total_bids_count: bids.len() as u64,
            total_demand: outcome.total_demand,
            shares_allocated: outcome.shares_allocated,
            shares_remaining: outcome.shares_remaining,
            pro_rata_applied: outcome.pro_rata_applied,
            cleared_at: now,
            inputs: ClearingSnapshot {
                shares_count: auction.shares_count,
                min_price: auction.min_price,
                max_price: auction.max_price,
                bids,
            },
        };

        let mut allocations = Vec::with_capacity(outcome.allocations.len());
        for entry in &outcome.allocations {
            allocations.push(Allocation::new(
                auction_id,
                entry.bid.bidder_id,
                entry.bid.quantity_requested,
                entry.allocated_quantity,
                outcome.clearing_price,
                entry.allocation_type,
            )?);
        }

        // All-or-nothing: a concurrent trigger that got here first turns
        // this into a plain AlreadyCleared report
        let (result, stored) = self.store.commit_clearing(result, allocations)?;

        tracing::info!(
            auction_id = %auction_id,
            trigger = ?trigger,
            clearing_price = %result.clearing_price,
            total_demand = result.total_demand,
            shares_allocated = result.shares_allocated,
            pro_rata = result.pro_rata_applied,
            "auction cleared"
        );

        self.event_handler.on_event(EngineEvent::AuctionCleared {
            auction_id,
            clearing_result: (*result).clone(),
            allocation_ids: stored.iter().map(|a| a.id).collect(),
            timestamp: now,
        });

        Ok(result)
    }
}
