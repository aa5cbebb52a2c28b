//! Analysis features, one module per stage of a leak check

pub mod exclusions;
pub mod leak_locator;
pub mod leak_trace;
pub mod reachability;
pub mod retained_size;
pub mod root_dedup;
pub mod shortest_path;
