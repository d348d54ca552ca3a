// ============================================================================
// Ledger Module
// Bid intake and the persistence seam for clearing output
// ============================================================================

mod bid_ledger;
mod store;

pub use bid_ledger::{BidLedger, SubmitOutcome};
pub use store::{AuctionStore, InMemoryStore};
