// ============================================================================
// Event Handler Interface
// Defines the contract for handling auction and settlement events
// ============================================================================

use crate::domain::{AllocationId, AuctionId, BidId, BidderId, ClearingResult, SettlementStatus};
use crate::engine::reporting::SettlementReport;
use crate::numeric::Price;
use chrono::{DateTime, Utc};
use crossbeam::queue::SegQueue;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events emitted by the auction engine.
///
/// Emission is fire-and-forget: the engine's persisted state is authoritative
/// regardless of what a handler does with the event. The external notifier
/// fans these out to bidders and operators.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EngineEvent {
    /// Collection window opened
    AuctionStarted {
        auction_id: AuctionId,
        bid_collection_end_time: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    /// Auction withdrawn before clearing
    AuctionCancelled {
        auction_id: AuctionId,
        timestamp: DateTime<Utc>,
    },

    /// Bid accepted into the ledger
    BidAccepted {
        auction_id: AuctionId,
        bid_id: BidId,
        bidder_id: BidderId,
        quantity_requested: u64,
        max_price: Price,
        timestamp: DateTime<Utc>,
    },

    /// A resubmission replaced the bidder's previous active bid
    BidSuperseded {
        auction_id: AuctionId,
        bidder_id: BidderId,
        previous_bid_id: BidId,
        replacement_bid_id: BidId,
        timestamp: DateTime<Utc>,
    },

    /// Bid rejected with reason
    BidRejected {
        auction_id: AuctionId,
        bidder_id: BidderId,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Clearing completed; results and allocations are persisted
    AuctionCleared {
        auction_id: AuctionId,
        clearing_result: ClearingResult,
        allocation_ids: Vec<AllocationId>,
        timestamp: DateTime<Utc>,
    },

    /// One allocation moved forward in the settlement workflow
    SettlementStatusChanged {
        auction_id: AuctionId,
        allocation_id: AllocationId,
        bidder_id: BidderId,
        old_status: SettlementStatus,
        new_status: SettlementStatus,
        timestamp: DateTime<Utc>,
    },

    /// Bridge signal for the external cap-table ledger: the operator
    /// confirmed the shares moved. This engine never writes share
    /// ownership itself.
    SharesTransferConfirmed {
        auction_id: AuctionId,
        allocation_id: AllocationId,
        bidder_id: BidderId,
        quantity: u64,
        timestamp: DateTime<Utc>,
    },

    /// Every successful allocation for the auction reached Completed
    AllSettlementsCompleted {
        auction_id: AuctionId,
        summary: SettlementReport,
        timestamp: DateTime<Utc>,
    },
}

/// Event handler trait for processing engine events
/// Implementations can handle logging, metrics, notification fan-out, etc.
pub trait EventHandler: Send + Sync {
    /// Handle an engine event
    fn on_event(&self, event: EngineEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: Vec<EngineEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event handler for testing
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: EngineEvent) {
        // Do nothing
    }
}

/// Logging event handler
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn on_event(&self, event: EngineEvent) {
        tracing::debug!("Auction engine event: {:?}", event);
    }
}

/// Queueing event handler backed by a lock-free queue.
///
/// The engine pushes synchronously; an asynchronous notifier drains at its
/// own pace. Delivery failures stay on the notifier's side of the fence and
/// never roll back clearing or settlement state.
#[derive(Default)]
pub struct QueueingEventHandler {
    queue: SegQueue<EngineEvent>,
}

impl QueueingEventHandler {
    pub fn new() -> Self {
        Self {
            queue: SegQueue::new(),
        }
    }

    /// Drain all queued events in emission order.
    pub fn drain(&self) -> Vec<EngineEvent> {
        let mut events = Vec::with_capacity(self.queue.len());
        while let Some(event) = self.queue.pop() {
            events.push(event);
        }
        events
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl EventHandler for QueueingEventHandler {
    fn on_event(&self, event: EngineEvent) {
        self.queue.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_handler() {
        let handler = NoOpEventHandler;
        handler.on_event(EngineEvent::AuctionCancelled {
            auction_id: AuctionId::new(),
            timestamp: Utc::now(),
        });
        // Should not panic
    }

    #[test]
    fn test_queueing_handler_preserves_order() {
        let handler = QueueingEventHandler::new();
        let auction_id = AuctionId::new();

        handler.on_event(EngineEvent::AuctionStarted {
            auction_id,
            bid_collection_end_time: Utc::now(),
            timestamp: Utc::now(),
        });
        handler.on_event(EngineEvent::AuctionCancelled {
            auction_id,
            timestamp: Utc::now(),
        });

        assert_eq!(handler.len(), 2);
        let events = handler.drain();
        assert!(matches!(events[0], EngineEvent::AuctionStarted { .. }));
        assert!(matches!(events[1], EngineEvent::AuctionCancelled { .. }));
        assert!(handler.is_empty());
    }
}
