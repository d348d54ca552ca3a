// ============================================================================
// Auction Configuration
// Offering parameters and collection-window settings
// ============================================================================

use crate::error::{AuctionError, AuctionResult, ParameterViolation};
use crate::numeric::Price;
use chrono::Duration;

use super::CompanyId;

/// Parameters for one share offering.
///
/// Validated before an auction is created; every violation is reported as a
/// typed error naming the broken invariant.
#[derive(Debug, Clone)]
pub struct AuctionConfig {
    /// The company whose shares are offered
    pub company_id: CompanyId,

    /// Total shares offered (fixed supply, strictly positive)
    pub shares_count: u64,

    /// Price floor per share (strictly positive)
    pub min_price: Price,

    /// Price ceiling per share (strictly above the floor)
    pub max_price: Price,

    /// Length of the bid collection window, applied when the auction starts
    pub bid_collection_duration: Duration,
}

impl AuctionConfig {
    /// Create a new configuration with the default seven-day window
    pub fn new(company_id: CompanyId, shares_count: u64, min_price: Price, max_price: Price) -> Self {
        Self {
            company_id,
            shares_count,
            min_price,
            max_price,
            bid_collection_duration: Duration::days(7),
        }
    }

    /// Builder method: Set the bid collection window length
    pub fn with_collection_duration(mut self, duration: Duration) -> Self {
        self.bid_collection_duration = duration;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> AuctionResult<()> {
        if self.shares_count == 0 {
            return Err(AuctionError::InvalidAuctionParameters(
                ParameterViolation::ZeroShareSupply,
            ));
        }

        if !self.min_price.is_positive() {
            return Err(AuctionError::InvalidAuctionParameters(
                ParameterViolation::NonPositiveFloor {
                    min_price: self.min_price,
                },
            ));
        }

        if self.max_price <= self.min_price {
            return Err(AuctionError::InvalidAuctionParameters(
                ParameterViolation::CeilingNotAboveFloor {
                    min_price: self.min_price,
                    max_price: self.max_price,
                },
            ));
        }

        if self.bid_collection_duration <= Duration::zero() {
            return Err(AuctionError::InvalidAuctionParameters(
                ParameterViolation::NonPositiveWindow,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AuctionConfig {
        AuctionConfig::new(
            CompanyId::new(),
            1000,
            Price::from_integer(50).unwrap(),
            Price::from_integer(150).unwrap(),
        )
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = valid_config().with_collection_duration(Duration::hours(48));
        assert_eq!(config.bid_collection_duration, Duration::hours(48));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_supply_rejected() {
        let mut config = valid_config();
        config.shares_count = 0;
        assert_eq!(
            config.validate().unwrap_err(),
            AuctionError::InvalidAuctionParameters(ParameterViolation::ZeroShareSupply)
        );
    }

    #[test]
    fn test_ceiling_must_exceed_floor() {
        let mut config = valid_config();
        config.max_price = config.min_price;
        assert!(matches!(
            config.validate().unwrap_err(),
            AuctionError::InvalidAuctionParameters(
                ParameterViolation::CeilingNotAboveFloor { .. }
            )
        ));
    }

    #[test]
    fn test_floor_must_be_positive() {
        let mut config = valid_config();
        config.min_price = Price::ZERO;
        assert!(matches!(
            config.validate().unwrap_err(),
            AuctionError::InvalidAuctionParameters(ParameterViolation::NonPositiveFloor { .. })
        ));
    }

    #[test]
    fn test_window_must_be_positive() {
        let config = valid_config().with_collection_duration(Duration::zero());
        assert_eq!(
            config.validate().unwrap_err(),
            AuctionError::InvalidAuctionParameters(ParameterViolation::NonPositiveWindow)
        );
    }
}
