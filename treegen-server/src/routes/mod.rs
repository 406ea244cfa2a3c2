//! Route handlers organized by resource

pub mod generate;
pub mod health;
pub mod output;
