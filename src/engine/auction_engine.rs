// ============================================================================
// Auction Engine
// Facade wiring the ledger, store, clearing and settlement together
// ============================================================================

use crate::domain::{
    Allocation, AllocationId, Auction, AuctionConfig, AuctionId, Bid, BidderId, ClearingResult,
    SettlementTransition,
};
use crate::engine::orchestrator::{ClearingOrchestrator, ClearingTrigger};
use crate::engine::reporting::{settlement_report, SettlementReport};
use crate::engine::settlement::{BatchTransitionReport, SettlementProcessor};
use crate::error::{AuctionError, AuctionResult};
use crate::interfaces::{Clock, EngineEvent, EventHandler};
use crate::ledger::{AuctionStore, BidLedger, SubmitOutcome};
use crate::numeric::Price;
use std::sync::Arc;

/// The engine's inbound contract: create and start auctions, take bids,
/// trigger clearing, drive settlement, and report progress.
///
/// Invoked by short-lived request/job handlers; every operation is a single
/// synchronous call whose safety under concurrent invocation comes from the
/// store guard, the ledger locks and the per-allocation CAS, not from any
/// engine-wide lock.
pub struct AuctionEngine {
    store: Arc<dyn AuctionStore>,
    ledger: Arc<BidLedger>,
    clock: Arc<dyn Clock>,
    event_handler: Arc<dyn EventHandler>,
    orchestrator: ClearingOrchestrator,
    settlement: SettlementProcessor,
}

impl AuctionEngine {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        clock: Arc<dyn Clock>,
        event_handler: Arc<dyn EventHandler>,
    ) -> Self {
        let ledger = Arc::new(BidLedger::new());

        let orchestrator = ClearingOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&ledger),
            Arc::clone(&clock),
            Arc::clone(&event_handler),
        );
        let settlement = SettlementProcessor::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&event_handler),
        );

        Self {
            store,
            ledger,
            clock,
            event_handler,
            orchestrator,
            settlement,
        }
    }

    // ========================================================================
    // Auction Lifecycle
    // ========================================================================

    /// Create a draft auction from validated parameters.
    pub fn create_auction(&self, config: &AuctionConfig) -> AuctionResult<Arc<Auction>> {
        config.validate()?;

        let auction = Arc::new(Auction::new(
            config.company_id,
            config.shares_count,
            config.min_price,
            config.max_price,
            config.bid_collection_duration,
        ));
        self.store.insert_auction(Arc::clone(&auction));

        tracing::info!(
            auction_id = %auction.id,
            company_id = %auction.company_id,
            shares = auction.shares_count,
            floor = %auction.min_price,
            ceiling = %auction.max_price,
            "auction created"
        );

        Ok(auction)
    }

    /// Open the bid collection window: end time = now + configured duration.
    pub fn start_auction(&self, auction_id: AuctionId) -> AuctionResult<Arc<Auction>> {
        let auction = self.auction(auction_id)?;

        let now = self.clock.now();
        let end_time = now + auction.bid_collection_duration;
        auction.try_start(end_time)?;

        self.event_handler.on_event(EngineEvent::AuctionStarted {
            auction_id,
            bid_collection_end_time: end_time,
            timestamp: now,
        });

        Ok(auction)
    }

    /// Withdraw an auction before clearing. Collected bids are retained.
    pub fn cancel_auction(&self, auction_id: AuctionId) -> AuctionResult<Arc<Auction>> {
        let auction = self.auction(auction_id)?;
        auction.try_cancel()?;

        self.event_handler.on_event(EngineEvent::AuctionCancelled {
            auction_id,
            timestamp: self.clock.now(),
        });

        Ok(auction)
    }

    // ========================================================================
    // Bids
    // ========================================================================

    /// Submit or replace a bid. Rejections emit a `BidRejected` event naming
    /// the violated bound before returning the typed error.
    pub fn submit_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: BidderId,
        quantity_requested: u64,
        max_price: Price,
    ) -> AuctionResult<SubmitOutcome> {
        let auction = self.auction(auction_id)?;
        let now = self.clock.now();

        match self
            .ledger
            .submit(&auction, bidder_id, quantity_requested, max_price, now)
        {
            Ok(outcome) => {
                if let Some(ref superseded) = outcome.superseded {
                    self.event_handler.on_event(EngineEvent::BidSuperseded {
                        auction_id,
                        bidder_id,
                        previous_bid_id: superseded.id,
                        replacement_bid_id: outcome.bid.id,
                        timestamp: now,
                    });
                }
                self.event_handler.on_event(EngineEvent::BidAccepted {
                    auction_id,
                    bid_id: outcome.bid.id,
                    bidder_id,
                    quantity_requested,
                    max_price,
                    timestamp: now,
                });
                Ok(outcome)
            },
            Err(error) => {
                self.event_handler.on_event(EngineEvent::BidRejected {
                    auction_id,
                    bidder_id,
                    reason: error.to_string(),
                    timestamp: now,
                });
                Err(error)
            },
        }
    }

    // ========================================================================
    // Clearing
    // ========================================================================

    /// Trigger clearing, either from the scheduled window check or a manual
    /// operator override. Concurrent triggers are safe; the loser receives
    /// `AlreadyCleared`.
    pub fn trigger_clearing(
        &self,
        auction_id: AuctionId,
        trigger: ClearingTrigger,
    ) -> AuctionResult<Arc<ClearingResult>> {
        self.orchestrator.trigger_clearing(auction_id, trigger)
    }

    // ========================================================================
    // Settlement
    // ========================================================================

    /// Apply one settlement transition to one allocation.
    pub fn apply_transition(
        &self,
        allocation_id: AllocationId,
        transition: SettlementTransition,
        payment_reference: Option<String>,
    ) -> AuctionResult<Arc<Allocation>> {
        self.settlement
            .apply_transition(allocation_id, transition, payment_reference)
    }

    /// Apply one settlement transition to a batch of allocations with
    /// partial-success semantics.
    pub fn apply_transition_bulk(
        &self,
        allocation_ids: &[AllocationId],
        transition: SettlementTransition,
        payment_reference: Option<&str>,
    ) -> BatchTransitionReport {
        self.settlement
            .apply_transition_bulk(allocation_ids, transition, payment_reference)
    }

    /// Settlement progress for one auction, recomputed from the allocation
    /// records on every call.
    pub fn settlement_report(&self, auction_id: AuctionId) -> AuctionResult<SettlementReport> {
        self.auction(auction_id)?;
        let allocations = self.store.allocations_for(auction_id);
        settlement_report(auction_id, &allocations)
    }

    // ========================================================================
    // Read Accessors
    // ========================================================================

    pub fn auction(&self, auction_id: AuctionId) -> AuctionResult<Arc<Auction>> {
        self.store
            .auction(auction_id)
            .ok_or(AuctionError::UnknownAuction(auction_id))
    }

    pub fn clearing_result(&self, auction_id: AuctionId) -> Option<Arc<ClearingResult>> {
        self.store.clearing_result(auction_id)
    }

    pub fn allocations(&self, auction_id: AuctionId) -> Vec<Arc<Allocation>> {
        self.store.allocations_for(auction_id)
    }

    pub fn allocation(&self, allocation_id: AllocationId) -> Option<Arc<Allocation>> {
        self.store.allocation(allocation_id)
    }

    /// Active bids in clearing order.
    pub fn active_bids(&self, auction_id: AuctionId) -> Vec<Arc<Bid>> {
        self.ledger.active_bids(auction_id)
    }

    /// The bidder's current active bid, if any.
    pub fn bid_for(&self, auction_id: AuctionId, bidder_id: BidderId) -> Option<Arc<Bid>> {
        self.ledger.bid_for(auction_id, bidder_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CompanyId;
    use crate::interfaces::{FixedClock, QueueingEventHandler};
    use crate::ledger::InMemoryStore;
    use chrono::{Duration, Utc};

    struct Fixture {
        clock: Arc<FixedClock>,
        events: Arc<QueueingEventHandler>,
        engine: AuctionEngine,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let events = Arc::new(QueueingEventHandler::new());
        let engine = AuctionEngine::new(
            Arc::new(InMemoryStore::new()),
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::clone(&events) as Arc<dyn EventHandler>,
        );
        Fixture {
            clock,
            events,
            engine,
        }
    }

    fn config() -> AuctionConfig {
        AuctionConfig::new(
            CompanyId::new(),
            100,
            Price::from_integer(50).unwrap(),
            Price::from_integer(150).unwrap(),
        )
        .with_collection_duration(Duration::days(3))
    }

    #[test]
    fn test_create_validates_parameters() {
        let fx = fixture();

        let mut bad = config();
        bad.shares_count = 0;
        assert!(matches!(
            fx.engine.create_auction(&bad).unwrap_err(),
            AuctionError::InvalidAuctionParameters(_)
        ));

        let auction = fx.engine.create_auction(&config()).unwrap();
        assert_eq!(fx.engine.auction(auction.id).unwrap().id, auction.id);
    }

    #[test]
    fn test_start_sets_window_from_duration() {
        let fx = fixture();
        let auction = fx.engine.create_auction(&config()).unwrap();

        fx.engine.start_auction(auction.id).unwrap();
        assert_eq!(
            auction.bid_collection_end_time(),
            Some(fx.clock.now() + Duration::days(3))
        );

        let events = fx.events.drain();
        assert!(matches!(events[0], EngineEvent::AuctionStarted { .. }));
    }

    #[test]
    fn test_bid_rejection_emits_event() {
        let fx = fixture();
        let auction = fx.engine.create_auction(&config()).unwrap();
        fx.engine.start_auction(auction.id).unwrap();
        fx.events.drain();

        let err = fx
            .engine
            .submit_bid(
                auction.id,
                BidderId::new(),
                10,
                Price::from_integer(40).unwrap(),
            )
            .unwrap_err();
        assert!(matches!(err, AuctionError::BidOutOfRange(_)));

        let events = fx.events.drain();
        assert_eq!(events.len(), 1);
        match &events[0] {
            EngineEvent::BidRejected { reason, .. } => {
                assert!(reason.contains("below auction minimum"));
            },
            other => panic!("expected BidRejected, got {:?}", other),
        }
    }

    #[test]
    fn test_resubmission_emits_superseded_then_accepted() {
        let fx = fixture();
        let auction = fx.engine.create_auction(&config()).unwrap();
        fx.engine.start_auction(auction.id).unwrap();
        let bidder = BidderId::new();

        fx.engine
            .submit_bid(auction.id, bidder, 10, Price::from_integer(90).unwrap())
            .unwrap();
        fx.events.drain();

        fx.engine
            .submit_bid(auction.id, bidder, 25, Price::from_integer(110).unwrap())
            .unwrap();

        let events = fx.events.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], EngineEvent::BidSuperseded { .. }));
        assert!(matches!(events[1], EngineEvent::BidAccepted { .. }));
        assert_eq!(fx.engine.active_bids(auction.id).len(), 1);
    }

    #[test]
    fn test_unknown_auction_everywhere() {
        let fx = fixture();
        let missing = AuctionId::new();

        assert!(matches!(
            fx.engine.start_auction(missing).unwrap_err(),
            AuctionError::UnknownAuction(_)
        ));
        assert!(matches!(
            fx.engine
                .submit_bid(
                    missing,
                    BidderId::new(),
                    1,
                    Price::from_integer(100).unwrap()
                )
                .unwrap_err(),
            AuctionError::UnknownAuction(_)
        ));
        assert!(matches!(
            fx.engine.settlement_report(missing).unwrap_err(),
            AuctionError::UnknownAuction(_)
        ));
    }
}
