// ============================================================================
// Engine Factory
// Builder for wiring an auction engine with its collaborators
// ============================================================================

use crate::engine::AuctionEngine;
use crate::interfaces::{Clock, EventHandler, NoOpEventHandler, SystemClock};
use crate::ledger::{AuctionStore, InMemoryStore};
use std::sync::Arc;

/// Builder for creating auction engines with fluent configuration
///
/// # Example
/// ```
/// use auction_engine::prelude::*;
/// use std::sync::Arc;
///
/// let engine = AuctionEngineBuilder::new()
///     .with_event_handler(Arc::new(LoggingEventHandler))
///     .build();
/// ```
#[derive(Default)]
pub struct AuctionEngineBuilder {
    store: Option<Arc<dyn AuctionStore>>,
    clock: Option<Arc<dyn Clock>>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl AuctionEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom store (defaults to the in-memory store)
    pub fn with_store(mut self, store: Arc<dyn AuctionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom clock (defaults to the system clock)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use a custom event handler (defaults to no-op)
    pub fn with_event_handler(mut self, event_handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(event_handler);
        self
    }

    /// Build the engine
    pub fn build(self) -> AuctionEngine {
        AuctionEngine::new(
            self.store.unwrap_or_else(|| Arc::new(InMemoryStore::new())),
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            self.event_handler
                .unwrap_or_else(|| Arc::new(NoOpEventHandler)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AuctionConfig, CompanyId};
    use crate::interfaces::FixedClock;
    use crate::numeric::Price;
    use chrono::Utc;

    #[test]
    fn test_builder_defaults() {
        let engine = AuctionEngineBuilder::new().build();
        let config = AuctionConfig::new(
            CompanyId::new(),
            100,
            Price::from_integer(50).unwrap(),
            Price::from_integer(150).unwrap(),
        );
        assert!(engine.create_auction(&config).is_ok());
    }

    #[test]
    fn test_builder_custom_collaborators() {
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let store = Arc::new(InMemoryStore::new());

        let engine = AuctionEngineBuilder::new()
            .with_store(Arc::clone(&store) as Arc<dyn AuctionStore>)
            .with_clock(clock as Arc<dyn Clock>)
            .with_event_handler(Arc::new(NoOpEventHandler))
            .build();

        let config = AuctionConfig::new(
            CompanyId::new(),
            100,
            Price::from_integer(50).unwrap(),
            Price::from_integer(150).unwrap(),
        );
        let auction = engine.create_auction(&config).unwrap();

        // The engine writes through the injected store
        assert!(store.auction(auction.id).is_some());
    }
}
