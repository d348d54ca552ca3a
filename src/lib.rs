// ============================================================================
// Auction Engine Library
// Uniform-price batch auction clearing and settlement for private shares
// ============================================================================

//! # Auction Engine
//!
//! A single-shot, uniform-price ("modified Dutch") batch auction engine for
//! selling private company shares to invited buyers.
//!
//! ## Features
//!
//! - **Sealed-bid ledger** with one active bid per bidder and
//!   latest-write-wins replacement
//! - **Pure clearing calculator**: deterministic uniform price, pro-rata
//!   splitting at the marginal tier, reproducible from stored inputs
//! - **Idempotent clearing orchestration** guarded at the persistence layer,
//!   safe under racing triggers
//! - **Settlement state machine** (payment, transfer, completion) with
//!   validated transitions and partial-success bulk actions
//! - **Outbound events** for an external notifier and cap-table ledger
//!
//! ## Example
//!
//! ```rust
//! use auction_engine::prelude::*;
//! use auction_engine::numeric::Price;
//! use std::sync::Arc;
//!
//! let engine = AuctionEngineBuilder::new()
//!     .with_event_handler(Arc::new(NoOpEventHandler))
//!     .build();
//!
//! // Offer 100 shares between $50 and $150
//! let config = AuctionConfig::new(
//!     CompanyId::new(),
//!     100,
//!     Price::from_integer(50).unwrap(),
//!     Price::from_integer(150).unwrap(),
//! );
//! let auction = engine.create_auction(&config).unwrap();
//! engine.start_auction(auction.id).unwrap();
//!
//! // Collect sealed bids
//! engine
//!     .submit_bid(auction.id, BidderId::new(), 60, Price::from_integer(120).unwrap())
//!     .unwrap();
//! engine
//!     .submit_bid(auction.id, BidderId::new(), 40, Price::from_integer(100).unwrap())
//!     .unwrap();
//!
//! // Operator clears without waiting for the window
//! let result = engine
//!     .trigger_clearing(auction.id, ClearingTrigger::Manual)
//!     .unwrap();
//! assert_eq!(result.clearing_price, Price::from_integer(100).unwrap());
//! assert_eq!(result.shares_allocated, 100);
//! ```

pub mod domain;
pub mod engine;
pub mod error;
pub mod interfaces;
pub mod ledger;
pub mod numeric;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::allocation::settlement::{SettlementStatus, SettlementTransition};
    pub use crate::domain::auction::state::{AuctionStatus, AuctionTransition};
    pub use crate::domain::{
        Allocation, AllocationId, AllocationType, Auction, AuctionConfig, AuctionId, Bid, BidId,
        BidderId, ClearingResult, CompanyId,
    };
    pub use crate::engine::{
        compute_clearing, AuctionEngine, AuctionEngineBuilder, BatchTransitionReport,
        ClearingTrigger, SettlementReport,
    };
    pub use crate::error::{AuctionError, AuctionResult};
    pub use crate::interfaces::{
        Clock, EngineEvent, EventHandler, LoggingEventHandler, NoOpEventHandler,
        QueueingEventHandler, SystemClock,
    };
    pub use crate::ledger::{AuctionStore, BidLedger, InMemoryStore};
}

#[cfg(test)]
mod integration_tests {
    use super::prelude::*;
    use crate::interfaces::FixedClock;
    use crate::numeric::Price;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    #[test]
    fn test_end_to_end_auction_lifecycle() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let events = Arc::new(QueueingEventHandler::new());
        let engine = AuctionEngineBuilder::new()
            .with_clock(Arc::clone(&clock) as Arc<dyn Clock>)
            .with_event_handler(Arc::clone(&events) as Arc<dyn EventHandler>)
            .build();

        // Offer 100 shares between $50 and $150, window of 7 days
        let config = AuctionConfig::new(
            CompanyId::new(),
            100,
            Price::from_integer(50).unwrap(),
            Price::from_integer(150).unwrap(),
        )
        .with_collection_duration(Duration::days(7));
        let auction = engine.create_auction(&config).unwrap();
        engine.start_auction(auction.id).unwrap();

        // Three bidders; the two at $100 will share the marginal tier
        let strong = BidderId::new();
        let partial_a = BidderId::new();
        let partial_b = BidderId::new();
        engine
            .submit_bid(auction.id, strong, 80, Price::from_integer(120).unwrap())
            .unwrap();
        engine
            .submit_bid(auction.id, partial_a, 60, Price::from_integer(100).unwrap())
            .unwrap();
        clock.advance(Duration::seconds(1));
        engine
            .submit_bid(auction.id, partial_b, 40, Price::from_integer(100).unwrap())
            .unwrap();

        // Automatic trigger refuses while the window is open
        assert!(matches!(
            engine
                .trigger_clearing(auction.id, ClearingTrigger::WindowExpired)
                .unwrap_err(),
            AuctionError::CollectionWindowOpen { .. }
        ));

        // Window passes; the scheduled check clears
        clock.advance(Duration::days(8));
        let result = engine
            .trigger_clearing(auction.id, ClearingTrigger::WindowExpired)
            .unwrap();
        assert_eq!(result.clearing_price, Price::from_integer(100).unwrap());
        assert_eq!(result.shares_allocated, 100);
        assert!(result.pro_rata_applied);

        // 80 full + 12/8 pro-rata in clearing order
        let allocations = engine.allocations(auction.id);
        assert_eq!(allocations.len(), 3);
        assert_eq!(allocations[0].bidder_id, strong);
        assert_eq!(allocations[0].allocated_quantity, 80);
        assert_eq!(allocations[0].allocation_type, AllocationType::Full);
        assert_eq!(allocations[1].bidder_id, partial_a);
        assert_eq!(allocations[1].allocated_quantity, 12);
        assert_eq!(allocations[2].bidder_id, partial_b);
        assert_eq!(allocations[2].allocated_quantity, 8);

        // Repeat trigger is a safe no-op
        assert!(matches!(
            engine
                .trigger_clearing(auction.id, ClearingTrigger::Manual)
                .unwrap_err(),
            AuctionError::AlreadyCleared { .. }
        ));

        // Bulk-confirm payments, then walk everyone to completion
        let ids: Vec<AllocationId> = allocations.iter().map(|a| a.id).collect();
        let report = engine.apply_transition_bulk(
            &ids,
            SettlementTransition::ConfirmPayment,
            Some("BATCH-1"),
        );
        assert!(report.is_full_success());

        for transition in [SettlementTransition::ConfirmTransfer, SettlementTransition::Complete] {
            let report = engine.apply_transition_bulk(&ids, transition, None);
            assert!(report.is_full_success());
        }

        let report = engine.settlement_report(auction.id).unwrap();
        assert!(report.all_complete);
        assert_eq!(report.successful_allocations, 3);
        // Everyone pays the uniform price: 100 shares * $100
        assert_eq!(
            report.completed.total_amount,
            crate::numeric::Amount::from_integer(10_000).unwrap()
        );

        // The notifier saw the cleared event, the cap-table confirmations,
        // and the final completion summary
        let seen = events.drain();
        assert!(seen
            .iter()
            .any(|e| matches!(e, EngineEvent::AuctionCleared { .. })));
        assert_eq!(
            seen.iter()
                .filter(|e| matches!(e, EngineEvent::SharesTransferConfirmed { .. }))
                .count(),
            3
        );
        assert_eq!(
            seen.iter()
                .filter(|e| matches!(e, EngineEvent::AllSettlementsCompleted { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_bids_frozen_after_window() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let engine = AuctionEngineBuilder::new()
            .with_clock(Arc::clone(&clock) as Arc<dyn Clock>)
            .build();

        let config = AuctionConfig::new(
            CompanyId::new(),
            100,
            Price::from_integer(50).unwrap(),
            Price::from_integer(150).unwrap(),
        )
        .with_collection_duration(Duration::days(1));
        let auction = engine.create_auction(&config).unwrap();
        engine.start_auction(auction.id).unwrap();

        let bidder = BidderId::new();
        engine
            .submit_bid(auction.id, bidder, 10, Price::from_integer(100).unwrap())
            .unwrap();

        clock.advance(Duration::days(2));
        let err = engine
            .submit_bid(auction.id, bidder, 99, Price::from_integer(150).unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            AuctionError::AuctionNotAcceptingBids {
                window_closed: true,
                ..
            }
        ));

        // The original bid is untouched
        let bid = engine.bid_for(auction.id, bidder).unwrap();
        assert_eq!(bid.quantity_requested, 10);
    }
}
