// ============================================================================
// Clearing Calculator
// Pure uniform-price clearing: no I/O, deterministic, reproducible
// ============================================================================

use crate::domain::clearing::BidSnapshot;
use crate::domain::AllocationType;
use crate::error::{AuctionError, AuctionResult, ParameterViolation};
use crate::numeric::Price;
use smallvec::SmallVec;

/// Clearing outcome for a single bid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidAllocation {
    pub bid: BidSnapshot,
    pub allocated_quantity: u64,
    pub allocation_type: AllocationType,
}

/// Output of one clearing computation
#[derive(Debug, Clone)]
pub struct ClearingOutcome {
    /// The single uniform price every winner pays
    pub clearing_price: Price,
    /// Whether the marginal price tier was split pro-rata
    pub pro_rata_applied: bool,
    /// Sum of all requested quantities
    pub total_demand: u64,
    /// Sum of allocated quantities
    pub shares_allocated: u64,
    /// Supply left unallocated
    pub shares_remaining: u64,
    /// Per-bid allocations in clearing order (price desc, time asc, bidder asc)
    pub allocations: Vec<BidAllocation>,
}

/// Compute the uniform clearing price and per-bid allocation for one auction.
///
/// The rules, in walk order over bids sorted by price descending (ties:
/// earliest submission first, then bidder id for a total order):
///
/// - Undersubscribed (cumulative demand never reaches supply): clearing
///   price is the floor and every bid fills in full.
/// - Otherwise the marginal bid (the first at which cumulative demand meets
///   or exceeds supply) sets the clearing price. Bids strictly above that
///   price fill in full; bids strictly below get zero. Bids at the marginal
///   price share the capacity left after the higher bids, floor-division
///   pro-rata by requested quantity, with each leftover unit granted to the
///   earliest-submitted tier member until the capacity is exactly exhausted.
///
/// Allocated shares never exceed supply, and equal supply exactly whenever
/// demand at or above the marginal price covers the remaining capacity.
///
/// # Errors
/// `InvalidAuctionParameters` when `shares_count` is zero. An empty bid list
/// is not an error: it clears at the floor with zero demand.
pub fn compute_clearing(
    bids: &[BidSnapshot],
    shares_count: u64,
    min_price: Price,
) -> AuctionResult<ClearingOutcome> {
    if shares_count == 0 {
        return Err(AuctionError::InvalidAuctionParameters(
            ParameterViolation::ZeroShareSupply,
        ));
    }

    if bids.is_empty() {
        return Ok(ClearingOutcome {
            clearing_price: min_price,
            pro_rata_applied: false,
            total_demand: 0,
            shares_allocated: 0,
            shares_remaining: shares_count,
            allocations: Vec::new(),
        });
    }

    // Total order: price desc, submission time asc, bidder id asc
    let mut sorted: Vec<&BidSnapshot> = bids.iter().collect();
    sorted.sort_by(|a, b| {
        b.max_price
            .cmp(&a.max_price)
            .then(a.bid_time.cmp(&b.bid_time))
            .then(a.bidder_id.cmp(&b.bidder_id))
    });

    let total_demand: u64 = sorted.iter().map(|b| b.quantity_requested).sum();

    // Find the marginal bid: first index where cumulative demand >= supply
    let mut cumulative: u128 = 0;
    let mut marginal_index: Option<usize> = None;
    for (index, bid) in sorted.iter().enumerate() {
        cumulative += bid.quantity_requested as u128;
        if cumulative >= shares_count as u128 {
            marginal_index = Some(index);
            break;
        }
    }

    let Some(marginal_index) = marginal_index else {
        // Undersubscribed: everyone fills in full at the floor
        let allocations = sorted
            .into_iter()
            .map(|bid| BidAllocation {
                bid: bid.clone(),
                allocated_quantity: bid.quantity_requested,
                allocation_type: AllocationType::Full,
            })
            .collect();
        return Ok(ClearingOutcome {
            clearing_price: min_price,
            pro_rata_applied: false,
            total_demand,
            shares_allocated: total_demand,
            shares_remaining: shares_count - total_demand,
            allocations,
        });
    };

    let clearing_price = sorted[marginal_index].max_price;

    // Capacity consumed by bids strictly above the marginal price
    let above_quantity: u64 = sorted
        .iter()
        .filter(|b| b.max_price > clearing_price)
        .map(|b| b.quantity_requested)
        .sum();
    let tier_capacity = shares_count - above_quantity;

    // The marginal tier, still in submission order
    let tier: SmallVec<[&BidSnapshot; 8]> = sorted
        .iter()
        .copied()
        .filter(|b| b.max_price == clearing_price)
        .collect();
    let tier_demand: u64 = tier.iter().map(|b| b.quantity_requested).sum();

    // Floor-division share of the tier capacity per tier member; leftover
    // units go one at a time to the earliest-submitted members
    let mut tier_allocated: SmallVec<[u64; 8]> = tier
        .iter()
        .map(|bid| {
            if tier_demand <= tier_capacity {
                bid.quantity_requested
            } else {
                ((bid.quantity_requested as u128 * tier_capacity as u128)
                    / tier_demand as u128) as u64
            }
        })
        .collect();

    let pro_rata_applied = tier_demand > tier_capacity;
    if pro_rata_applied {
        let mut leftover = tier_capacity - tier_allocated.iter().sum::<u64>();
        for (index, bid) in tier.iter().enumerate() {
            if leftover == 0 {
                break;
            }
            if tier_allocated[index] < bid.quantity_requested {
                tier_allocated[index] += 1;
                leftover -= 1;
            }
        }
        debug_assert_eq!(leftover, 0);
    }

    let mut tier_cursor = 0;
    let allocations: Vec<BidAllocation> = sorted
        .into_iter()
        .map(|bid| {
            let allocated_quantity = if bid.max_price > clearing_price {
                bid.quantity_requested
            } else if bid.max_price == clearing_price {
                let allocated = tier_allocated[tier_cursor];
                tier_cursor += 1;
                allocated
            } else {
                0
            };

            let allocation_type = if allocated_quantity == 0 {
                AllocationType::Rejected
            } else if allocated_quantity == bid.quantity_requested {
                AllocationType::Full
            } else {
                AllocationType::ProRata
            };

            BidAllocation {
                bid: bid.clone(),
                allocated_quantity,
                allocation_type,
            }
        })
        .collect();

    let shares_allocated: u64 = allocations.iter().map(|a| a.allocated_quantity).sum();

    Ok(ClearingOutcome {
        clearing_price,
        pro_rata_applied,
        total_demand,
        shares_allocated,
        shares_remaining: shares_count - shares_allocated,
        allocations,
    })
}
