// ============================================================================
// Basic Usage Example
// ============================================================================

use auction_engine::numeric::Price;
use auction_engine::prelude::*;
use std::sync::Arc;

fn main() {
    println!("=== Share Auction Example ===\n");

    let events = Arc::new(QueueingEventHandler::new());
    let engine = AuctionEngineBuilder::new()
        .with_event_handler(Arc::clone(&events) as Arc<dyn EventHandler>)
        .build();

    // Offer 100 shares between $50 and $150
    let config = AuctionConfig::new(
        CompanyId::new(),
        100,
        Price::from_integer(50).unwrap(),
        Price::from_integer(150).unwrap(),
    );
    let auction = engine.create_auction(&config).unwrap();
    engine.start_auction(auction.id).unwrap();
    println!(
        "Created auction {} for 100 shares, floor {} ceiling {}\n",
        auction.id, auction.min_price, auction.max_price
    );

    // Collect sealed bids
    println!("Collecting bids...");
    let bids = [(80u64, 120i64), (60, 100), (40, 100)];
    for (quantity, price) in bids {
        let bidder = BidderId::new();
        engine
            .submit_bid(
                auction.id,
                bidder,
                quantity,
                Price::from_integer(price).unwrap(),
            )
            .unwrap();
        println!("  bidder {} wants {} shares at up to {}", bidder, quantity, price);
    }

    // Operator clears without waiting for the window
    println!("\nClearing...");
    let result = engine
        .trigger_clearing(auction.id, ClearingTrigger::Manual)
        .unwrap();
    println!(
        "  clearing price {} | demand {} | allocated {} | pro-rata: {}",
        result.clearing_price, result.total_demand, result.shares_allocated,
        result.pro_rata_applied
    );

    println!("\nAllocations:");
    let allocations = engine.allocations(auction.id);
    for allocation in &allocations {
        println!(
            "  {} -> {}/{} shares ({:?}), amount due {}",
            allocation.bidder_id,
            allocation.allocated_quantity,
            allocation.original_quantity,
            allocation.allocation_type,
            allocation.total_amount
        );
    }

    // Walk every winner through settlement
    println!("\nSettling...");
    let ids: Vec<AllocationId> = allocations.iter().map(|a| a.id).collect();
    for transition in [
        SettlementTransition::ConfirmPayment,
        SettlementTransition::ConfirmTransfer,
        SettlementTransition::Complete,
    ] {
        let report = engine.apply_transition_bulk(&ids, transition, None);
        println!(
            "  {:?}: {} applied, {} failed",
            transition,
            report.applied.len(),
            report.failed.len()
        );
    }

    let report = engine.settlement_report(auction.id).unwrap();
    println!(
        "\nSettlement report: {}/{} complete ({}%), collected {}",
        report.completed.count,
        report.successful_allocations,
        report.completion_percentage.round_dp(0),
        report.completed.total_amount
    );

    println!("\nEvents emitted for the notifier: {}", events.len());
    for event in events.drain() {
        let name = match event {
            EngineEvent::AuctionStarted { .. } => "AuctionStarted",
            EngineEvent::AuctionCancelled { .. } => "AuctionCancelled",
            EngineEvent::BidAccepted { .. } => "BidAccepted",
            EngineEvent::BidSuperseded { .. } => "BidSuperseded",
            EngineEvent::BidRejected { .. } => "BidRejected",
            EngineEvent::AuctionCleared { .. } => "AuctionCleared",
            EngineEvent::SettlementStatusChanged { .. } => "SettlementStatusChanged",
            EngineEvent::SharesTransferConfirmed { .. } => "SharesTransferConfirmed",
            EngineEvent::AllSettlementsCompleted { .. } => "AllSettlementsCompleted",
        };
        println!("  {}", name);
    }
}
