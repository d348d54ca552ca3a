// ============================================================================
// Bid Domain Model
// ============================================================================

use crate::numeric::{Amount, NumericResult, Price};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::AuctionId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BidId(Uuid);

impl BidId {
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

impl Default for BidId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an invited buyer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BidderId(Uuid);

impl BidderId {
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

impl Default for BidderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BidderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Bid Entity
// ============================================================================

/// One sealed bid: the quantity a buyer wants and the most they will pay
/// per share.
///
/// At most one bid per (auction, bidder) is active at a time; resubmission
/// supersedes the previous row in place rather than adding a second active
/// one. Bids freeze when the collection window closes.
#[derive(Debug)]
pub struct Bid {
    pub id: BidId,
    pub auction_id: AuctionId,
    pub bidder_id: BidderId,
    /// Shares requested (strictly positive)
    pub quantity_requested: u64,
    /// Maximum price per share, within the auction's [floor, ceiling]
    pub max_price: Price,
    /// Submission time; earlier bids win ties at equal price
    pub bid_time: DateTime<Utc>,

    active: AtomicBool,
}

impl Bid {
    pub fn new(
        auction_id: AuctionId,
        bidder_id: BidderId,
        quantity_requested: u64,
        max_price: Price,
        bid_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BidId::new(),
            auction_id,
            bidder_id,
            quantity_requested,
            max_price,
            bid_time,
            active: AtomicBool::new(true),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Flag this bid as replaced by a newer submission from the same bidder.
    ///
    /// Returns false if the bid was already superseded (a lost race is a
    /// no-op; the newest bid has already taken over).
    pub fn supersede(&self) -> bool {
        self.active
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Maximum spend this bid commits to (max_price × quantity).
    pub fn max_notional(&self) -> NumericResult<Amount> {
        self.max_price.checked_mul_int(self.quantity_requested as i64)
    }
}

// Clone implementation for Bid (atomics are not Clone)
impl Clone for Bid {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            auction_id: self.auction_id,
            bidder_id: self.bidder_id,
            quantity_requested: self.quantity_requested,
            max_price: self.max_price,
            bid_time: self.bid_time,
            active: AtomicBool::new(self.active.load(Ordering::Acquire)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bid_creation() {
        let bid = Bid::new(
            AuctionId::new(),
            BidderId::new(),
            400,
            Price::from_integer(90).unwrap(),
            Utc::now(),
        );

        assert!(bid.is_active());
        assert_eq!(bid.quantity_requested, 400);
        assert_eq!(
            bid.max_notional().unwrap(),
            Amount::from_integer(36_000).unwrap()
        );
    }

    #[test]
    fn test_supersede_is_one_shot() {
        let bid = Bid::new(
            AuctionId::new(),
            BidderId::new(),
            100,
            Price::from_integer(75).unwrap(),
            Utc::now(),
        );

        assert!(bid.supersede());
        assert!(!bid.is_active());
        // Second supersede loses the CAS
        assert!(!bid.supersede());
    }
}
