//! Allocation and spending strategies applied each simulated year

mod glide;
mod withdrawal;

pub use glide::{allocation, GlideConfig};
pub use withdrawal::{withdrawal, WithdrawalConfig, WithdrawalRule};
