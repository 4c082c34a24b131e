//! # resolver-service
//!
//! Serving layer of the device resolver.
//!
//! ## Components
//! - `IndexCache`: one built index per household/user key, TTL + invalidation
//! - `HouseholdIndexBuilder`: replays discovery records into a new index
//! - `IndexUpdater`: serialized fork-update-swap of cached indexes
//! - `DeviceResolver`: area-aware resolution of a free-text reference
//! - `ResolverContext`: wires the above together at startup
//!
//! ## Data flow
//!
//! ```text
//! discovery records ─▶ HouseholdIndexBuilder ─▶ IndexCache ◀── IndexUpdater
//!                                                   │
//!                          query ─▶ DeviceResolver ─┘
//!                                     ├─ AreaResolver (area mention)
//!                                     └─ PersonalizedEntityIndex (query cache,
//!                                        embedding cache, similarity)
//! ```

pub mod context;
pub mod household;
pub mod index_cache;
pub mod resolver;
pub mod telemetry;
pub mod updater;

pub use context::ResolverContext;
pub use household::{HouseholdIndex, HouseholdIndexBuilder, HouseholdStats};
pub use index_cache::{IndexCache, IndexCacheStats};
pub use resolver::{DeviceResolver, Resolution};
pub use telemetry::init_logging;
pub use updater::IndexUpdater;
