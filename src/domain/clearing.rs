// ============================================================================
// Clearing Result Domain Model
// ============================================================================

use crate::numeric::Price;
use chrono::{DateTime, Utc};

use super::{AuctionId, BidderId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The bid tuple a clearing run consumed, as it stood when the window closed
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BidSnapshot {
    pub bidder_id: BidderId,
    pub quantity_requested: u64,
    pub max_price: Price,
    pub bid_time: DateTime<Utc>,
}

/// The inputs and parameters of one clearing run, captured so the result can
/// be reproduced bit-for-bit from stored data
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClearingSnapshot {
    pub shares_count: u64,
    pub min_price: Price,
    pub max_price: Price,
    pub bids: Vec<BidSnapshot>,
}

/// Outcome of one clearing run. Created exactly once per auction and
/// immutable afterwards; a second run is rejected, never overwritten.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClearingResult {
    pub auction_id: AuctionId,
    /// The single uniform price every winning bidder pays
    pub clearing_price: Price,
    /// Number of active bids the run consumed
    pub total_bids_count: u64,
    /// Sum of all requested quantities
    pub total_demand: u64,
    /// Sum of allocated quantities (never exceeds supply)
    pub shares_allocated: u64,
    /// Supply left unallocated (zero whenever demand covered supply)
    pub shares_remaining: u64,
    /// Whether the marginal price tier was split pro-rata
    pub pro_rata_applied: bool,
    pub cleared_at: DateTime<Utc>,
    /// Inputs sufficient to reproduce this result
    pub inputs: ClearingSnapshot,
}

impl ClearingResult {
    /// True when demand at or above the clearing price consumed the full
    /// supply.
    pub fn fully_allocated(&self) -> bool {
        self.shares_remaining == 0
    }
}
