// ============================================================================
// Engine Errors
// Typed error kinds for auction, bid, clearing and settlement operations
// ============================================================================

use crate::domain::allocation::{SettlementStatus, SettlementTransition};
use crate::domain::auction::state::{AuctionStatus, AuctionTransition};
use crate::domain::{AllocationId, AuctionId};
use crate::numeric::{NumericError, Price};
use chrono::{DateTime, Utc};
use std::fmt;

/// A violated auction-parameter invariant, carried inside
/// [`AuctionError::InvalidAuctionParameters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterViolation {
    /// Share supply must be strictly positive
    ZeroShareSupply,
    /// Price floor must be strictly positive
    NonPositiveFloor { min_price: Price },
    /// Price ceiling must be strictly above the floor
    CeilingNotAboveFloor { min_price: Price, max_price: Price },
    /// Bid collection window must have positive duration
    NonPositiveWindow,
}

impl fmt::Display for ParameterViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterViolation::ZeroShareSupply => {
                write!(f, "share supply must be greater than zero")
            },
            ParameterViolation::NonPositiveFloor { min_price } => {
                write!(f, "price floor {} must be greater than zero", min_price)
            },
            ParameterViolation::CeilingNotAboveFloor {
                min_price,
                max_price,
            } => write!(
                f,
                "price ceiling {} must be greater than price floor {}",
                max_price, min_price
            ),
            ParameterViolation::NonPositiveWindow => {
                write!(f, "bid collection window must have a positive duration")
            },
        }
    }
}

/// A violated bid invariant, carried inside [`AuctionError::BidOutOfRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidViolation {
    /// Bid price below the auction's price floor
    PriceBelowFloor { price: Price, min_price: Price },
    /// Bid price above the auction's price ceiling
    PriceAboveCeiling { price: Price, max_price: Price },
    /// Requested quantity must be strictly positive
    ZeroQuantity,
}

impl fmt::Display for BidViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidViolation::PriceBelowFloor { price, min_price } => {
                write!(f, "bid price {} below auction minimum {}", price, min_price)
            },
            BidViolation::PriceAboveCeiling { price, max_price } => {
                write!(f, "bid price {} above auction maximum {}", price, max_price)
            },
            BidViolation::ZeroQuantity => {
                write!(f, "bid quantity must be greater than zero")
            },
        }
    }
}

/// Errors produced by the auction engine.
///
/// Every rejection names the violated invariant with concrete values so
/// operators and bidders can self-correct. `AlreadyCleared` is a normal,
/// reportable outcome of the clearing idempotency guard, not a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuctionError {
    /// Auction creation/start parameters violate an invariant
    InvalidAuctionParameters(ParameterViolation),

    /// Lifecycle transition not permitted from the auction's current status
    InvalidAuctionTransition {
        auction_id: AuctionId,
        current: AuctionStatus,
        attempted: AuctionTransition,
    },

    /// Bid rejected for price or quantity bounds
    BidOutOfRange(BidViolation),

    /// Bid rejected because the auction is not collecting bids
    AuctionNotAcceptingBids {
        auction_id: AuctionId,
        status: AuctionStatus,
        /// True when the status was right but the collection window had closed
        window_closed: bool,
    },

    /// Clearing requested before the collection window closed, without a
    /// manual override
    CollectionWindowOpen {
        auction_id: AuctionId,
        ends_at: DateTime<Utc>,
    },

    /// Idempotency guard: a clearing result already exists for this auction
    AlreadyCleared { auction_id: AuctionId },

    /// Settlement transition not permitted from the allocation's current status
    InvalidSettlementTransition {
        allocation_id: AllocationId,
        current: SettlementStatus,
        attempted: SettlementTransition,
    },

    /// The allocation received zero shares and has no settlement workflow
    SettlementNotApplicable { allocation_id: AllocationId },

    /// Some members of a bulk settlement transition failed; the rest committed
    PartialBatchFailure {
        failures: Vec<(AllocationId, Box<AuctionError>)>,
    },

    /// No auction with the given id
    UnknownAuction(AuctionId),

    /// No allocation with the given id
    UnknownAllocation(AllocationId),

    /// Fixed-point arithmetic failure
    Numeric(NumericError),
}

impl fmt::Display for AuctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuctionError::InvalidAuctionParameters(violation) => {
                write!(f, "invalid auction parameters: {}", violation)
            },
            AuctionError::InvalidAuctionTransition {
                auction_id,
                current,
                attempted,
            } => write!(
                f,
                "auction {} cannot apply {:?} from status {:?}",
                auction_id, attempted, current
            ),
            AuctionError::BidOutOfRange(violation) => {
                write!(f, "bid out of range: {}", violation)
            },
            AuctionError::AuctionNotAcceptingBids {
                auction_id,
                status,
                window_closed,
            } => {
                if *window_closed {
                    write!(
                        f,
                        "auction {} is no longer accepting bids: collection window closed",
                        auction_id
                    )
                } else {
                    write!(
                        f,
                        "auction {} is not accepting bids in status {:?}",
                        auction_id, status
                    )
                }
            },
            AuctionError::CollectionWindowOpen { auction_id, ends_at } => write!(
                f,
                "auction {} collection window is open until {}; clearing requires \
                 window expiry or a manual override",
                auction_id, ends_at
            ),
            AuctionError::AlreadyCleared { auction_id } => {
                write!(f, "auction {} has already been cleared", auction_id)
            },
            AuctionError::InvalidSettlementTransition {
                allocation_id,
                current,
                attempted,
            } => write!(
                f,
                "allocation {} cannot apply {:?} from settlement status {:?}",
                allocation_id, attempted, current
            ),
            AuctionError::SettlementNotApplicable { allocation_id } => write!(
                f,
                "allocation {} received zero shares and has no settlement workflow",
                allocation_id
            ),
            AuctionError::PartialBatchFailure { failures } => {
                write!(f, "{} settlement transition(s) failed:", failures.len())?;
                for (allocation_id, error) in failures {
                    write!(f, " [{}: {}]", allocation_id, error)?;
                }
                Ok(())
            },
            AuctionError::UnknownAuction(auction_id) => {
                write!(f, "unknown auction {}", auction_id)
            },
            AuctionError::UnknownAllocation(allocation_id) => {
                write!(f, "unknown allocation {}", allocation_id)
            },
            AuctionError::Numeric(err) => write!(f, "numeric error: {}", err),
        }
    }
}

impl std::error::Error for AuctionError {}

impl From<NumericError> for AuctionError {
    fn from(err: NumericError) -> Self {
        AuctionError::Numeric(err)
    }
}

/// Result type alias for engine operations
pub type AuctionResult<T> = Result<T, AuctionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bid_violation_names_values() {
        let err = AuctionError::BidOutOfRange(BidViolation::PriceBelowFloor {
            price: Price::from_integer(90).unwrap(),
            min_price: Price::from_integer(100).unwrap(),
        });
        assert_eq!(
            err.to_string(),
            "bid out of range: bid price 90.0000 below auction minimum 100.0000"
        );
    }

    #[test]
    fn test_parameter_violation_display() {
        let err = AuctionError::InvalidAuctionParameters(
            ParameterViolation::CeilingNotAboveFloor {
                min_price: Price::from_integer(100).unwrap(),
                max_price: Price::from_integer(50).unwrap(),
            },
        );
        assert!(err.to_string().contains("ceiling 50.0000"));
        assert!(err.to_string().contains("floor 100.0000"));
    }

    #[test]
    fn test_numeric_error_conversion() {
        let err: AuctionError = NumericError::Overflow.into();
        assert_eq!(err, AuctionError::Numeric(NumericError::Overflow));
    }
}
