//! Signal construction and post-filtering.

pub mod builder;
pub mod post_filter;

pub use builder::{RegimeSummary, SignalBuilder, SignalContext};
pub use post_filter::{deduplicate, enforce_quality};
