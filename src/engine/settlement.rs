// ============================================================================
// Settlement Processor
// Operator-driven settlement transitions, single and bulk
// ============================================================================

use crate::domain::{Allocation, AllocationId, SettlementStatus, SettlementTransition};
use crate::engine::reporting::settlement_report;
use crate::error::{AuctionError, AuctionResult};
use crate::interfaces::{Clock, EngineEvent, EventHandler};
use crate::ledger::AuctionStore;
use smallvec::SmallVec;
use std::sync::Arc;

/// Per-id outcome of a bulk settlement transition.
///
/// Bulk semantics are partial-success by design: every id validates
/// independently, valid ones commit, and the caller gets the full breakdown
/// rather than an all-or-nothing answer.
#[derive(Debug)]
pub struct BatchTransitionReport {
    pub transition: SettlementTransition,
    /// Ids whose transition committed
    pub applied: Vec<AllocationId>,
    /// Ids that failed validation, each with its typed error
    pub failed: Vec<(AllocationId, AuctionError)>,
}

impl BatchTransitionReport {
    pub fn is_full_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Collapse into a single result for callers that want all-or-nothing
    /// signaling. Partial failures become `PartialBatchFailure`; the applied
    /// transitions stay committed either way.
    pub fn into_result(self) -> AuctionResult<Vec<AllocationId>> {
        if self.failed.is_empty() {
            Ok(self.applied)
        } else {
            Err(AuctionError::PartialBatchFailure {
                failures: self
                    .failed
                    .into_iter()
                    .map(|(id, error)| (id, Box::new(error)))
                    .collect(),
            })
        }
    }
}

/// Applies settlement transitions and emits the notification events.
///
/// Transitions on different allocations are independent; transitions on the
/// same allocation serialize inside the allocation's own CAS. Event emission
/// is fire-and-forget: settlement state is authoritative regardless of what
/// the notifier does.
pub struct SettlementProcessor {
    store: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
    event_handler: Arc<dyn EventHandler>,
}

impl SettlementProcessor {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        clock: Arc<dyn Clock>,
        event_handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            store,
            clock,
            event_handler,
        }
    }

    /// Apply one settlement transition to one allocation.
    ///
    /// `payment_reference` is recorded only for `ConfirmPayment`. Reaching
    /// `SharesTransferred` emits the cap-table confirmation signal; the
    /// transition that completes the auction's final open allocation also
    /// emits the operator summary.
    pub fn apply_transition(
        &self,
        allocation_id: AllocationId,
        transition: SettlementTransition,
        payment_reference: Option<String>,
    ) -> AuctionResult<Arc<Allocation>> {
        let allocation = self
            .store
            .allocation(allocation_id)
            .ok_or(AuctionError::UnknownAllocation(allocation_id))?;

        let now = self.clock.now();
        let (old_status, new_status) =
            allocation.try_transition(transition, payment_reference, now)?;

        tracing::debug!(
            allocation_id = %allocation_id,
            auction_id = %allocation.auction_id,
            from = ?old_status,
            to = ?new_status,
            "settlement transition applied"
        );

        let mut events: SmallVec<[EngineEvent; 3]> = SmallVec::new();
        events.push(EngineEvent::SettlementStatusChanged {
            auction_id: allocation.auction_id,
            allocation_id,
            bidder_id: allocation.bidder_id,
            old_status,
            new_status,
            timestamp: now,
        });

        if new_status == SettlementStatus::SharesTransferred {
            events.push(EngineEvent::SharesTransferConfirmed {
                auction_id: allocation.auction_id,
                allocation_id,
                bidder_id: allocation.bidder_id,
                quantity: allocation.allocated_quantity,
                timestamp: now,
            });
        }

        if new_status == SettlementStatus::Completed {
            let all = self.store.allocations_for(allocation.auction_id);
            let all_complete = all
                .iter()
                .filter_map(|a| a.settlement_status())
                .all(|status| status == SettlementStatus::Completed);

            if all_complete {
                match settlement_report(allocation.auction_id, &all) {
                    Ok(summary) => events.push(EngineEvent::AllSettlementsCompleted {
                        auction_id: allocation.auction_id,
                        summary,
                        timestamp: now,
                    }),
                    Err(error) => tracing::warn!(
                        auction_id = %allocation.auction_id,
                        %error,
                        "settlement summary unavailable; completion event skipped"
                    ),
                }
            }
        }

        self.event_handler.on_events(events.into_vec());

        Ok(allocation)
    }

    /// Apply one transition to a batch of allocations.
    ///
    /// Members are validated independently: invalid-state ids are reported
    /// individually while valid ones still commit. The call itself always
    /// returns a report, never an error.
    pub fn apply_transition_bulk(
        &self,
        allocation_ids: &[AllocationId],
        transition: SettlementTransition,
        payment_reference: Option<&str>,
    ) -> BatchTransitionReport {
        let mut report = BatchTransitionReport {
            transition,
            applied: Vec::with_capacity(allocation_ids.len()),
            failed: Vec::new(),
        };

        for &allocation_id in allocation_ids {
            match self.apply_transition(
                allocation_id,
                transition,
                payment_reference.map(str::to_owned),
            ) {
                Ok(_) => report.applied.push(allocation_id),
                Err(error) => report.failed.push((allocation_id, error)),
            }
        }

        if !report.failed.is_empty() {
            tracing::warn!(
                transition = ?transition,
                applied = report.applied.len(),
                failed = report.failed.len(),
                "bulk settlement transition partially failed"
            );
        }

        report
    }
}
