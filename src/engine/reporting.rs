// ============================================================================
// Settlement Reporting View
// Read-only aggregation over an auction's allocations
// ============================================================================

use crate::domain::{Allocation, AuctionId, SettlementStatus};
use crate::error::AuctionResult;
use crate::numeric::Amount;
use rust_decimal::Decimal;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Count and summed amount due for one settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatusBreakdown {
    pub count: u64,
    pub total_amount: Amount,
}

/// Derived snapshot of settlement progress for one auction.
///
/// Recomputed on every read from the allocation records; never the system of
/// record and never cached as authoritative state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SettlementReport {
    pub auction_id: AuctionId,
    /// All allocation rows, including rejected audit rows
    pub total_allocations: u64,
    /// Allocations with shares (the ones that settle)
    pub successful_allocations: u64,
    pub rejected_allocations: u64,

    pub pending_payment: StatusBreakdown,
    pub payment_received: StatusBreakdown,
    pub shares_transferred: StatusBreakdown,
    pub completed: StatusBreakdown,

    /// completed / successful, as a percentage (display only)
    pub completion_percentage: Decimal,
    /// (payment_received + shares_transferred + completed) / successful
    pub payment_collection_percentage: Decimal,
    /// True once every successful allocation reached Completed
    pub all_complete: bool,
}

/// Build the settlement report for one auction's allocations.
///
/// # Errors
/// `Numeric` if summing amounts due overflows the fixed-point range.
pub fn settlement_report(
    auction_id: AuctionId,
    allocations: &[Arc<Allocation>],
) -> AuctionResult<SettlementReport> {
    let mut pending_payment = StatusBreakdown::default();
    let mut payment_received = StatusBreakdown::default();
    let mut shares_transferred = StatusBreakdown::default();
    let mut completed = StatusBreakdown::default();
    let mut rejected_allocations = 0u64;

    for allocation in allocations {
        let bucket = match allocation.settlement_status() {
            None => {
                rejected_allocations += 1;
                continue;
            },
            Some(SettlementStatus::PendingPayment) => &mut pending_payment,
            Some(SettlementStatus::PaymentReceived) => &mut payment_received,
            Some(SettlementStatus::SharesTransferred) => &mut shares_transferred,
            Some(SettlementStatus::Completed) => &mut completed,
        };
        bucket.count += 1;
        bucket.total_amount = bucket.total_amount.checked_add(allocation.total_amount)?;
    }

    let successful_allocations = pending_payment.count
        + payment_received.count
        + shares_transferred.count
        + completed.count;
    let collected = payment_received.count + shares_transferred.count + completed.count;

    let percentage = |part: u64| -> Decimal {
        if successful_allocations == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(part) / Decimal::from(successful_allocations) * Decimal::from(100)
        }
    };

    Ok(SettlementReport {
        auction_id,
        total_allocations: allocations.len() as u64,
        successful_allocations,
        rejected_allocations,
        completion_percentage: percentage(completed.count),
        payment_collection_percentage: percentage(collected),
        all_complete: successful_allocations > 0 && completed.count == successful_allocations,
        pending_payment,
        payment_received,
        shares_transferred,
        completed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AllocationType, BidderId, SettlementTransition};
    use crate::numeric::Price;
    use chrono::Utc;

    fn allocation(auction_id: AuctionId, quantity: u64) -> Arc<Allocation> {
        Arc::new(
            Allocation::new(
                auction_id,
                BidderId::new(),
                quantity.max(1),
                quantity,
                Price::from_integer(100).unwrap(),
                if quantity == 0 {
                    AllocationType::Rejected
                } else {
                    AllocationType::Full
                },
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_empty_report() {
        let auction_id = AuctionId::new();
        let report = settlement_report(auction_id, &[]).unwrap();

        assert_eq!(report.total_allocations, 0);
        assert_eq!(report.successful_allocations, 0);
        assert_eq!(report.completion_percentage, Decimal::ZERO);
        assert!(!report.all_complete);
    }

    #[test]
    fn test_counts_and_amounts_per_status() {
        let auction_id = AuctionId::new();
        let now = Utc::now();

        let a = allocation(auction_id, 10); // stays pending
        let b = allocation(auction_id, 20); // payment received
        let c = allocation(auction_id, 30); // completed
        let rejected = allocation(auction_id, 0);

        b.try_transition(SettlementTransition::ConfirmPayment, None, now)
            .unwrap();
        c.try_transition(SettlementTransition::ConfirmPayment, None, now)
            .unwrap();
        c.try_transition(SettlementTransition::ConfirmTransfer, None, now)
            .unwrap();
        c.try_transition(SettlementTransition::Complete, None, now)
            .unwrap();

        let report = settlement_report(auction_id, &[a, b, c, rejected]).unwrap();

        assert_eq!(report.total_allocations, 4);
        assert_eq!(report.successful_allocations, 3);
        assert_eq!(report.rejected_allocations, 1);

        assert_eq!(report.pending_payment.count, 1);
        assert_eq!(
            report.pending_payment.total_amount,
            Amount::from_integer(1000).unwrap()
        );
        assert_eq!(report.payment_received.count, 1);
        assert_eq!(
            report.payment_received.total_amount,
            Amount::from_integer(2000).unwrap()
        );
        assert_eq!(report.completed.count, 1);
        assert_eq!(
            report.completed.total_amount,
            Amount::from_integer(3000).unwrap()
        );

        // 1/3 completed, 2/3 collected
        assert_eq!(
            report.completion_percentage.round_dp(2),
            Decimal::new(3333, 2)
        );
        assert_eq!(
            report.payment_collection_percentage.round_dp(2),
            Decimal::new(6667, 2)
        );
        assert!(!report.all_complete);
    }

    #[test]
    fn test_all_complete() {
        let auction_id = AuctionId::new();
        let now = Utc::now();
        let a = allocation(auction_id, 10);

        for transition in [
            SettlementTransition::ConfirmPayment,
            SettlementTransition::ConfirmTransfer,
            SettlementTransition::Complete,
        ] {
            a.try_transition(transition, None, now).unwrap();
        }

        let report = settlement_report(auction_id, &[a]).unwrap();
        assert!(report.all_complete);
        assert_eq!(report.completion_percentage, Decimal::from(100));
    }
}
