//! signalbox: declarative trading-rule engine.
//!
//! Validates structured strategy documents, evaluates them against OHLCV
//! candle streams, and resolves trade exits against raw bid/ask ticks.
//! Hexagonal architecture: domain logic in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
