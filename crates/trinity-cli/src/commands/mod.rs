//! CLI subcommands

pub mod catalogue;
pub mod info;
pub mod units;
