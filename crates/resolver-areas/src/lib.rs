//! # resolver-areas
//!
//! Area (room/zone) registry for the device resolver.
//!
//! Resolves free-text area mentions ("the lounge", "upstairs bedroom") to
//! area ids and expands an area to everything nested under it.

pub mod resolver;

pub use resolver::{AreaInfo, AreaResolver, AreaResolverStats};
