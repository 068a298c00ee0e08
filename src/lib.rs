//! Contribution heatmaps in the terminal. Counts from GitHub, a Twitter/X log and a reading log
//! are summed over a week, month or year and drawn as a calendar grid.
//!

pub mod cli;
pub mod contributions;
pub mod dashboard;
pub mod sources;
pub mod utils;
