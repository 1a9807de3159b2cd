//! Application layer: keeping the converter's rate table current.
//!
//! `RateService` combines the two rate sources into a single table and owns
//! the periodic refresh loop, which runs on its own tokio task and publishes
//! each new table through a `watch` channel.

pub mod rates;
