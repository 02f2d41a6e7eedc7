// Library root for the hitter ranking model: configuration, stat tables,
// the name join, scoring, and the matchup report pipeline.

pub mod config;
pub mod join;
pub mod lineup;
pub mod names;
pub mod report;
pub mod scoring;
pub mod stats;
pub mod store;
pub mod teams;
