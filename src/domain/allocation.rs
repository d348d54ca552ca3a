// ============================================================================
// Allocation Domain Model
// Clearing output per bid, with the settlement workflow attached
// ============================================================================

use crate::error::{AuctionError, AuctionResult};
use crate::numeric::{Amount, NumericResult, Price};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use uuid::Uuid;

use super::{AuctionId, BidderId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AllocationId(Uuid);

impl AllocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AllocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AllocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the bid fared against the clearing price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AllocationType {
    /// Full requested quantity granted
    Full,
    /// Partially filled at the marginal price tier
    ProRata,
    /// Bid below the clearing price; zero shares, kept as the audit record
    Rejected,
}

// ============================================================================
// Settlement State Machine
// ============================================================================

pub mod settlement {
    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    /// Post-clearing workflow status for a winning allocation.
    ///
    /// Strictly forward: no skipping, no backward moves.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[repr(u8)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub enum SettlementStatus {
        /// Waiting for the buyer's funds
        PendingPayment = 0,
        /// Operator confirmed funds received
        PaymentReceived = 1,
        /// Operator confirmed shares moved into the cap table
        SharesTransferred = 2,
        /// Settlement finished
        Completed = 3,
    }

    impl SettlementStatus {
        pub fn from_u8(val: u8) -> Self {
            match val {
                0 => SettlementStatus::PendingPayment,
                1 => SettlementStatus::PaymentReceived,
                2 => SettlementStatus::SharesTransferred,
                _ => SettlementStatus::Completed,
            }
        }

        pub fn is_terminal(&self) -> bool {
            matches!(self, SettlementStatus::Completed)
        }

        /// Payment has been collected at or past this status
        pub fn payment_collected(&self) -> bool {
            !matches!(self, SettlementStatus::PendingPayment)
        }
    }

    /// Valid operator actions on the settlement workflow
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub enum SettlementTransition {
        /// Funds received (optionally with a payment reference)
        ConfirmPayment,
        /// Shares moved into the company's cap table
        ConfirmTransfer,
        /// Settlement finished
        Complete,
    }

    impl SettlementStatus {
        /// Apply a transition; `None` means the move is not in the table.
        pub fn transition(&self, transition: SettlementTransition) -> Option<SettlementStatus> {
            match (self, transition) {
                (SettlementStatus::PendingPayment, SettlementTransition::ConfirmPayment) => {
                    Some(SettlementStatus::PaymentReceived)
                },
                (SettlementStatus::PaymentReceived, SettlementTransition::ConfirmTransfer) => {
                    Some(SettlementStatus::SharesTransferred)
                },
                (SettlementStatus::SharesTransferred, SettlementTransition::Complete) => {
                    Some(SettlementStatus::Completed)
                },
                _ => None,
            }
        }
    }
}

pub use settlement::{SettlementStatus, SettlementTransition};

/// Mutable settlement bookkeeping written by the transition that wins the CAS
#[derive(Debug, Clone, Default)]
struct SettlementDetails {
    payment_reference: Option<String>,
    payment_confirmed_at: Option<DateTime<Utc>>,
    shares_transferred_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

/// Settlement sub-record: atomic status word plus winner-written details.
///
/// Only allocations with `allocated_quantity > 0` carry one; rejected
/// allocations are terminal at clearing time.
#[derive(Debug)]
struct SettlementRecord {
    status: AtomicU8,
    details: RwLock<SettlementDetails>,
}

impl SettlementRecord {
    fn new() -> Self {
        Self {
            status: AtomicU8::new(SettlementStatus::PendingPayment as u8),
            details: RwLock::new(SettlementDetails::default()),
        }
    }

    fn status(&self) -> SettlementStatus {
        SettlementStatus::from_u8(self.status.load(Ordering::Acquire))
    }
}

// ============================================================================
// Allocation Entity
// ============================================================================

/// Clearing outcome for one bid. The clearing fields (`allocated_quantity`,
/// `total_amount`, `allocation_type`) are write-once at creation; settlement
/// progress evolves separately so it never re-derives clearing math.
#[derive(Debug)]
pub struct Allocation {
    pub id: AllocationId,
    pub auction_id: AuctionId,
    pub bidder_id: BidderId,
    /// Quantity the bidder asked for
    pub original_quantity: u64,
    /// Quantity granted (0 ≤ allocated ≤ original)
    pub allocated_quantity: u64,
    /// Uniform clearing price every winner pays
    pub clearing_price: Price,
    /// Amount due: clearing_price × allocated_quantity
    pub total_amount: Amount,
    pub allocation_type: AllocationType,
    /// Display-only fill ratio for pro-rata allocations; derived, never
    /// authoritative; audit math recomputes from the integer quantities
    pub pro_rata_percentage: Option<Decimal>,

    settlement: Option<SettlementRecord>,
}

impl Allocation {
    pub fn new(
        auction_id: AuctionId,
        bidder_id: BidderId,
        original_quantity: u64,
        allocated_quantity: u64,
        clearing_price: Price,
        allocation_type: AllocationType,
    ) -> NumericResult<Self> {
        debug_assert!(allocated_quantity <= original_quantity);

        let total_amount = clearing_price.checked_mul_int(allocated_quantity as i64)?;

        let pro_rata_percentage = match allocation_type {
            AllocationType::ProRata if original_quantity > 0 => Some(
                Decimal::from(allocated_quantity) / Decimal::from(original_quantity)
                    * Decimal::from(100),
            ),
            _ => None,
        };

        let settlement = (allocated_quantity > 0).then(SettlementRecord::new);

        Ok(Self {
            id: AllocationId::new(),
            auction_id,
            bidder_id,
            original_quantity,
            allocated_quantity,
            clearing_price,
            total_amount,
            allocation_type,
            pro_rata_percentage,
            settlement,
        })
    }

    // ========================================================================
    // Settlement Accessors
    // ========================================================================

    /// Current settlement status; `None` for rejected (zero) allocations.
    pub fn settlement_status(&self) -> Option<SettlementStatus> {
        self.settlement.as_ref().map(SettlementRecord::status)
    }

    pub fn payment_reference(&self) -> Option<String> {
        self.settlement
            .as_ref()
            .and_then(|s| s.details.read().payment_reference.clone())
    }

    pub fn payment_confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.settlement
            .as_ref()
            .and_then(|s| s.details.read().payment_confirmed_at)
    }

    pub fn shares_transferred_at(&self) -> Option<DateTime<Utc>> {
        self.settlement
            .as_ref()
            .and_then(|s| s.details.read().shares_transferred_at)
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.settlement
            .as_ref()
            .and_then(|s| s.details.read().completed_at)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.settlement_status(), Some(SettlementStatus::Completed))
    }

    // ========================================================================
    // Settlement Transitions
    // ========================================================================

    /// Atomically apply a settlement transition.
    ///
    /// The CAS serializes concurrent attempts on the same allocation: a
    /// double "confirm payment" loses the exchange, re-reads the advanced
    /// status, and is rejected by the transition table. It is never silently
    /// ignored and never double-applied. Only the winner records the timestamp and
    /// payment reference.
    ///
    /// # Returns
    /// `(old_status, new_status)` on success.
    pub fn try_transition(
        &self,
        transition: SettlementTransition,
        payment_reference: Option<String>,
        now: DateTime<Utc>,
    ) -> AuctionResult<(SettlementStatus, SettlementStatus)> {
        let record = self
            .settlement
            .as_ref()
            .ok_or(AuctionError::SettlementNotApplicable {
                allocation_id: self.id,
            })?;

        loop {
            let current_raw = record.status.load(Ordering::Acquire);
            let current = SettlementStatus::from_u8(current_raw);

            let next = current.transition(transition).ok_or(
                AuctionError::InvalidSettlementTransition {
                    allocation_id: self.id,
                    current,
                    attempted: transition,
                },
            )?;

            if record
                .status
                .compare_exchange(
                    current_raw,
                    next as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                let mut details = record.details.write();
                match transition {
                    SettlementTransition::ConfirmPayment => {
                        details.payment_reference = payment_reference;
                        details.payment_confirmed_at = Some(now);
                    },
                    SettlementTransition::ConfirmTransfer => {
                        details.shares_transferred_at = Some(now);
                    },
                    SettlementTransition::Complete => {
                        details.completed_at = Some(now);
                    },
                }
                return Ok((current, next));
            }
            // Lost the race; re-validate against the advanced status
        }
    }
}

// Clone implementation for Allocation (atomics are not Clone)
impl Clone for Allocation {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            auction_id: self.auction_id,
            bidder_id: self.bidder_id,
            original_quantity: self.original_quantity,
            allocated_quantity: self.allocated_quantity,
            clearing_price: self.clearing_price,
            total_amount: self.total_amount,
            allocation_type: self.allocation_type,
            pro_rata_percentage: self.pro_rata_percentage,
            settlement: self.settlement.as_ref().map(|s| SettlementRecord {
                status: AtomicU8::new(s.status.load(Ordering::Acquire)),
                details: RwLock::new(s.details.read().clone()),
            }),
        }
    }
}
