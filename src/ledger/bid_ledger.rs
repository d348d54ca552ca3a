// ============================================================================
// Bid Ledger
// One active bid per (auction, bidder); price-time ordered per auction
// ============================================================================

use crate::domain::{Auction, AuctionId, Bid, BidderId};
use crate::error::{AuctionError, AuctionResult, BidViolation};
use crate::numeric::Price;
use chrono::{DateTime, Utc};
use crossbeam_skiplist::SkipMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ============================================================================
// Sort Key
// ============================================================================

/// Total order over bids: price descending, then submission time ascending,
/// then bidder id ascending.
///
/// The third key exists so two bidders landing the same price in the same
/// tick still sort deterministically; clearing must be reproducible from
/// stored inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct BidBookKey {
    /// Negated raw price so ascending skip-list order is descending price
    neg_price_raw: i64,
    bid_time: DateTime<Utc>,
    bidder_id: BidderId,
}

impl BidBookKey {
    fn new(bid: &Bid) -> Self {
        Self {
            neg_price_raw: -bid.max_price.raw_value(),
            bid_time: bid.bid_time,
            bidder_id: bid.bidder_id,
        }
    }
}

// ============================================================================
// Per-Auction Bid Book
// ============================================================================

/// Sorted book of active bids for one auction.
///
/// The skip list keeps bids in clearing order; the bidder index enforces the
/// one-active-bid-per-bidder invariant with latest-write-wins replacement.
struct AuctionBidBook {
    /// Clearing-ordered active bids
    book: SkipMap<BidBookKey, Arc<Bid>>,
    /// Active bid per bidder; the write lock serializes submissions so a
    /// bidder racing their own resubmission cannot leave two active rows
    by_bidder: RwLock<HashMap<BidderId, Arc<Bid>>>,
    /// Sum of requested quantities across active bids
    total_demand: AtomicU64,
}

impl AuctionBidBook {
    fn new() -> Self {
        Self {
            book: SkipMap::new(),
            by_bidder: RwLock::new(HashMap::new()),
            total_demand: AtomicU64::new(0),
        }
    }

    /// Insert or replace the bidder's active bid. Returns the superseded bid
    /// if one existed.
    fn upsert(&self, bid: Arc<Bid>) -> Option<Arc<Bid>> {
        let mut index = self.by_bidder.write();

        let previous = index.insert(bid.bidder_id, Arc::clone(&bid));
        if let Some(ref old) = previous {
            old.supersede();
            self.book.remove(&BidBookKey::new(old));
            self.total_demand
                .fetch_sub(old.quantity_requested, Ordering::AcqRel);
        }

        self.book.insert(BidBookKey::new(&bid), Arc::clone(&bid));
        self.total_demand
            .fetch_add(bid.quantity_requested, Ordering::AcqRel);

        previous
    }

    /// Active bids in clearing order (price desc, time asc, bidder asc).
    fn snapshot(&self) -> Vec<Arc<Bid>> {
        self.book
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    fn len(&self) -> usize {
        self.book.len()
    }

    fn total_demand(&self) -> u64 {
        self.total_demand.load(Ordering::Acquire)
    }
}

// ============================================================================
// Bid Ledger
// ============================================================================

/// Outcome of a successful bid submission
#[derive(Clone, Debug)]
pub struct SubmitOutcome {
    /// The new active bid
    pub bid: Arc<Bid>,
    /// The previous bid this submission superseded, if any
    pub superseded: Option<Arc<Bid>>,
}

/// Append/replace store of active bids across auctions.
///
/// Pure data access: validation names the violated bound, storage keeps the
/// one-active-bid invariant, and clearing reads an ordered snapshot. No
/// clearing math lives here.
#[derive(Default)]
pub struct BidLedger {
    books: RwLock<HashMap<AuctionId, Arc<AuctionBidBook>>>,
}

impl BidLedger {
    pub fn new() -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
        }
    }

    /// Submit or replace a bid.
    ///
    /// Requires the auction to be collecting bids with the window open at
    /// `now`, the price within [floor, ceiling], and a positive quantity.
    /// A resubmission by the same bidder supersedes the previous bid in
    /// place; bids from different bidders need no coordination.
    pub fn submit(
        &self,
        auction: &Auction,
        bidder_id: BidderId,
        quantity_requested: u64,
        max_price: Price,
        now: DateTime<Utc>,
    ) -> AuctionResult<SubmitOutcome> {
        let status = auction.status();
        if !status.accepts_bids() {
            return Err(AuctionError::AuctionNotAcceptingBids {
                auction_id: auction.id,
                status,
                window_closed: false,
            });
        }

        if !auction.window_open_at(now) {
            return Err(AuctionError::AuctionNotAcceptingBids {
                auction_id: auction.id,
                status,
                window_closed: true,
            });
        }

        if quantity_requested == 0 {
            return Err(AuctionError::BidOutOfRange(BidViolation::ZeroQuantity));
        }

        if max_price < auction.min_price {
            return Err(AuctionError::BidOutOfRange(BidViolation::PriceBelowFloor {
                price: max_price,
                min_price: auction.min_price,
            }));
        }

        if max_price > auction.max_price {
            return Err(AuctionError::BidOutOfRange(
                BidViolation::PriceAboveCeiling {
                    price: max_price,
                    max_price: auction.max_price,
                },
            ));
        }

        let bid = Arc::new(Bid::new(
            auction.id,
            bidder_id,
            quantity_requested,
            max_price,
            now,
        ));

        let book = self.book(auction.id);
        let superseded = book.upsert(Arc::clone(&bid));

        tracing::debug!(
            auction_id = %auction.id,
            bidder_id = %bidder_id,
            quantity = quantity_requested,
            price = %max_price,
            replaced = superseded.is_some(),
            "bid recorded"
        );

        Ok(SubmitOutcome { bid, superseded })
    }

    /// Active bids for an auction in clearing order.
    pub fn active_bids(&self, auction_id: AuctionId) -> Vec<Arc<Bid>> {
        self.books
            .read()
            .get(&auction_id)
            .map(|book| book.snapshot())
            .unwrap_or_default()
    }

    /// The bidder's current active bid, if any.
    pub fn bid_for(&self, auction_id: AuctionId, bidder_id: BidderId) -> Option<Arc<Bid>> {
        self.books
            .read()
            .get(&auction_id)?
            .by_bidder
            .read()
            .get(&bidder_id)
            .cloned()
    }

    /// Number of active bids for an auction.
    pub fn bid_count(&self, auction_id: AuctionId) -> usize {
        self.books
            .read()
            .get(&auction_id)
            .map(|book| book.len())
            .unwrap_or(0)
    }

    /// Sum of requested quantities across active bids.
    pub fn total_demand(&self, auction_id: AuctionId) -> u64 {
        self.books
            .read()
            .get(&auction_id)
            .map(|book| book.total_demand())
            .unwrap_or(0)
    }

    fn book(&self, auction_id: AuctionId) -> Arc<AuctionBidBook> {
        if let Some(book) = self.books.read().get(&auction_id) {
            return Arc::clone(book);
        }

        let mut books = self.books.write();
        Arc::clone(
            books
                .entry(auction_id)
                .or_insert_with(|| Arc::new(AuctionBidBook::new())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CompanyId;
    use chrono::Duration;

    fn collecting_auction() -> Auction {
        let auction = Auction::new(
            CompanyId::new(),
            1000,
            Price::from_integer(50).unwrap(),
            Price::from_integer(150).unwrap(),
            Duration::days(7),
        );
        auction.try_start(Utc::now() + Duration::days(7)).unwrap();
        auction
    }

    #[test]
    fn test_submit_and_snapshot_order() {
        let ledger = BidLedger::new();
        let auction = collecting_auction();
        let now = Utc::now();

        let low = BidderId::new();
        let high = BidderId::new();
        let mid = BidderId::new();

        ledger
            .submit(&auction, low, 100, Price::from_integer(60).unwrap(), now)
            .unwrap();
        ledger
            .submit(
                &auction,
                high,
                200,
                Price::from_integer(120).unwrap(),
                now + Duration::seconds(1),
            )
            .unwrap();
        ledger
            .submit(
                &auction,
                mid,
                50,
                Price::from_integer(90).unwrap(),
                now + Duration::seconds(2),
            )
            .unwrap();

        let bids = ledger.active_bids(auction.id);
        assert_eq!(bids.len(), 3);
        assert_eq!(bids[0].bidder_id, high);
        assert_eq!(bids[1].bidder_id, mid);
        assert_eq!(bids[2].bidder_id, low);
        assert_eq!(ledger.total_demand(auction.id), 350);
    }

    #[test]
    fn test_equal_price_sorts_by_time() {
        let ledger = BidLedger::new();
        let auction = collecting_auction();
        let now = Utc::now();
        let price = Price::from_integer(100).unwrap();

        let second = BidderId::new();
        let first = BidderId::new();

        ledger
            .submit(&auction, second, 10, price, now + Duration::seconds(5))
            .unwrap();
        ledger.submit(&auction, first, 20, price, now).unwrap();

        let bids = ledger.active_bids(auction.id);
        assert_eq!(bids[0].bidder_id, first);
        assert_eq!(bids[1].bidder_id, second);
    }

    #[test]
    fn test_resubmission_supersedes_in_place() {
        let ledger = BidLedger::new();
        let auction = collecting_auction();
        let bidder = BidderId::new();
        let now = Utc::now();

        let first = ledger
            .submit(&auction, bidder, 100, Price::from_integer(80).unwrap(), now)
            .unwrap();
        assert!(first.superseded.is_none());

        let second = ledger
            .submit(
                &auction,
                bidder,
                250,
                Price::from_integer(110).unwrap(),
                now + Duration::minutes(1),
            )
            .unwrap();

        let replaced = second.superseded.expect("previous bid superseded");
        assert_eq!(replaced.id, first.bid.id);
        assert!(!replaced.is_active());

        // Exactly one active bid remains, with the new terms
        assert_eq!(ledger.bid_count(auction.id), 1);
        let active = ledger.bid_for(auction.id, bidder).unwrap();
        assert_eq!(active.quantity_requested, 250);
        assert_eq!(ledger.total_demand(auction.id), 250);
    }

    #[test]
    fn test_price_bounds_enforced() {
        let ledger = BidLedger::new();
        let auction = collecting_auction();
        let now = Utc::now();

        let below = ledger.submit(
            &auction,
            BidderId::new(),
            10,
            Price::from_integer(40).unwrap(),
            now,
        );
        assert!(matches!(
            below.unwrap_err(),
            AuctionError::BidOutOfRange(BidViolation::PriceBelowFloor { .. })
        ));

        let above = ledger.submit(
            &auction,
            BidderId::new(),
            10,
            Price::from_integer(200).unwrap(),
            now,
        );
        assert!(matches!(
            above.unwrap_err(),
            AuctionError::BidOutOfRange(BidViolation::PriceAboveCeiling { .. })
        ));

        let zero = ledger.submit(
            &auction,
            BidderId::new(),
            0,
            Price::from_integer(100).unwrap(),
            now,
        );
        assert!(matches!(
            zero.unwrap_err(),
            AuctionError::BidOutOfRange(BidViolation::ZeroQuantity)
        ));
    }

    #[test]
    fn test_window_closed_rejects_bids() {
        let ledger = BidLedger::new();
        let auction = collecting_auction();
        let end = auction.bid_collection_end_time().unwrap();

        let err = ledger
            .submit(
                &auction,
                BidderId::new(),
                10,
                Price::from_integer(100).unwrap(),
                end + Duration::seconds(1),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AuctionError::AuctionNotAcceptingBids {
                window_closed: true,
                ..
            }
        ));
    }

    #[test]
    fn test_draft_auction_rejects_bids() {
        let ledger = BidLedger::new();
        let auction = Auction::new(
            CompanyId::new(),
            1000,
            Price::from_integer(50).unwrap(),
            Price::from_integer(150).unwrap(),
            Duration::days(7),
        );

        let err = ledger
            .submit(
                &auction,
                BidderId::new(),
                10,
                Price::from_integer(100).unwrap(),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            AuctionError::AuctionNotAcceptingBids {
                window_closed: false,
                ..
            }
        ));
    }
}
