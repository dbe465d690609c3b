//! Split search for tree nodes.
//!
//! [`SplitFinder`] sweeps the sorted values of each numeric feature and
//! keeps the cut with the lowest combined cost in a [`SplitInfo`] record.

pub mod finder;
pub mod info;

pub use finder::{SearchReport, SplitFinder, SplitFinderConfig, SplitRequest};
pub use info::SplitInfo;
