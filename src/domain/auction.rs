// ============================================================================
// Auction Domain Model
// ============================================================================

use crate::error::{AuctionError, AuctionResult};
use crate::numeric::Price;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AuctionId(Uuid);

impl AuctionId {
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

impl Default for AuctionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the company whose shares are being offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompanyId(Uuid);

impl CompanyId {
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

impl Default for CompanyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Auction Lifecycle State Machine
// ============================================================================

pub mod state {
    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[repr(u8)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub enum AuctionStatus {
        /// Created but not yet open for bids
        Draft = 0,
        /// Collection window open; bids may be submitted or replaced
        CollectingBids = 1,
        /// Cleared; results and allocations persisted
        Completed = 2,
        /// Withdrawn before clearing; bids are retained but frozen
        Cancelled = 3,
    }

    impl AuctionStatus {
        pub fn from_u8(val: u8) -> Self {
            match val {
                0 => AuctionStatus::Draft,
                1 => AuctionStatus::CollectingBids,
                2 => AuctionStatus::Completed,
                _ => AuctionStatus::Cancelled,
            }
        }

        pub fn is_terminal(&self) -> bool {
            matches!(self, AuctionStatus::Completed | AuctionStatus::Cancelled)
        }

        pub fn accepts_bids(&self) -> bool {
            matches!(self, AuctionStatus::CollectingBids)
        }
    }

    /// Valid lifecycle transitions for the auction state machine
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum AuctionTransition {
        /// Open the collection window
        Start,
        /// Record a successful clearing run
        Complete,
        /// Withdraw the auction before clearing
        Cancel,
    }

    impl AuctionStatus {
        /// Apply a transition; `None` means the move is not in the table.
        pub fn transition(&self, transition: AuctionTransition) -> Option<AuctionStatus> {
            match (self, transition) {
                (AuctionStatus::Draft, AuctionTransition::Start) => {
                    Some(AuctionStatus::CollectingBids)
                },
                (AuctionStatus::Draft, AuctionTransition::Cancel) => {
                    Some(AuctionStatus::Cancelled)
                },

                (AuctionStatus::CollectingBids, AuctionTransition::Complete) => {
                    Some(AuctionStatus::Completed)
                },
                (AuctionStatus::CollectingBids, AuctionTransition::Cancel) => {
                    Some(AuctionStatus::Cancelled)
                },

                _ => None,
            }
        }
    }
}

use state::{AuctionStatus, AuctionTransition};

// ============================================================================
// Auction Entity
// ============================================================================

/// One share offering: fixed supply, price bounds, and a sealed-bid
/// collection window that ends at a stored point in time.
///
/// Status lives in an atomic so concurrent triggers (scheduled window check
/// racing a manual operator action) serialize on compare-and-swap; the
/// clearing outcome fields are written once by whichever trigger wins.
#[derive(Debug)]
pub struct Auction {
    pub id: AuctionId,
    pub company_id: CompanyId,
    /// Total shares offered (fixed supply)
    pub shares_count: u64,
    /// Price ceiling per share
    pub max_price: Price,
    /// Price floor per share
    pub min_price: Price,
    /// Window length applied when the auction starts
    pub bid_collection_duration: Duration,
    pub created_at: DateTime<Utc>,

    status: AtomicU8,
    /// Set when the auction starts; compared against the clock at call time
    bid_collection_end_time: RwLock<Option<DateTime<Utc>>>,
    /// Uniform clearing price, written once at clearing
    clearing_price: RwLock<Option<Price>>,
    /// Sum of requested quantities at clearing, written once
    total_demand: RwLock<Option<u64>>,
}

impl Auction {
    pub fn new(
        company_id: CompanyId,
        shares_count: u64,
        min_price: Price,
        max_price: Price,
        bid_collection_duration: Duration,
    ) -> Self {
        Self {
            id: AuctionId::new(),
            company_id,
            shares_count,
            max_price,
            min_price,
            bid_collection_duration,
            created_at: Utc::now(),
            status: AtomicU8::new(AuctionStatus::Draft as u8),
            bid_collection_end_time: RwLock::new(None),
            clearing_price: RwLock::new(None),
            total_demand: RwLock::new(None),
        }
    }

    // ========================================================================
    // Atomic Getters
    // ========================================================================

    pub fn status(&self) -> AuctionStatus {
        AuctionStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn bid_collection_end_time(&self) -> Option<DateTime<Utc>> {
        *self.bid_collection_end_time.read()
    }

    pub fn clearing_price(&self) -> Option<Price> {
        *self.clearing_price.read()
    }

    pub fn total_demand(&self) -> Option<u64> {
        *self.total_demand.read()
    }

    /// Whether the collection window is open at `now`.
    ///
    /// Window expiry is a data comparison, not a live timer; an auction
    /// without an end time (never started) accepts no bids.
    pub fn window_open_at(&self, now: DateTime<Utc>) -> bool {
        match self.bid_collection_end_time() {
            Some(end) => now < end,
            None => false,
        }
    }

    // ========================================================================
    // Lifecycle Transitions
    // ========================================================================

    /// Open the collection window, recording its end time.
    ///
    /// The CAS serializes racing starts; only the winner writes the end time.
    pub fn try_start(&self, end_time: DateTime<Utc>) -> AuctionResult<()> {
        self.try_transition(AuctionTransition::Start)?;
        *self.bid_collection_end_time.write() = Some(end_time);
        Ok(())
    }

    /// Record a successful clearing run: status flip plus the write-once
    /// outcome fields.
    pub fn try_complete(&self, clearing_price: Price, total_demand: u64) -> AuctionResult<()> {
        self.try_transition(AuctionTransition::Complete)?;
        *self.clearing_price.write() = Some(clearing_price);
        *self.total_demand.write() = Some(total_demand);
        Ok(())
    }

    /// Withdraw the auction. Valid from any pre-completion status; bids
    /// already collected are retained, never deleted.
    pub fn try_cancel(&self) -> AuctionResult<()> {
        self.try_transition(AuctionTransition::Cancel)
    }

    fn try_transition(&self, transition: AuctionTransition) -> AuctionResult<()> {
        loop {
            let current_raw = self.status.load(Ordering::Acquire);
            let current = AuctionStatus::from_u8(current_raw);

            let next = current.transition(transition).ok_or(
                AuctionError::InvalidAuctionTransition {
                    auction_id: self.id,
                    current,
                    attempted: transition,
                },
            )?;

            if self
                .status
                .compare_exchange(
                    current_raw,
                    next as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                return Ok(());
            }
            // Lost the race; re-validate against the new status
        }
    }
}

// Clone implementation for Auction (atomics are not Clone)
impl Clone for Auction {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            company_id: self.company_id,
            shares_count: self.shares_count,
            max_price: self.max_price,
            min_price: self.min_price,
            bid_collection_duration: self.bid_collection_duration,
            created_at: self.created_at,
            status: AtomicU8::new(self.status.load(Ordering::Acquire)),
            bid_collection_end_time: RwLock::new(*self.bid_collection_end_time.read()),
            clearing_price: RwLock::new(*self.clearing_price.read()),
            total_demand: RwLock::new(*self.total_demand.read()),
        }
    }
}
