//! Market data access port.

use crate::domain::error::SignalboxError;
use crate::domain::market::{Candle, Tick};

/// Source of the candle and tick streams a backtest runs over.
pub trait MarketDataPort {
    fn load_candles(&self) -> Result<Vec<Candle>, SignalboxError>;

    /// Tick data is optional; sources without any return an empty vec
    /// and the backtest degrades to signal-only mode.
    fn load_ticks(&self) -> Result<Vec<Tick>, SignalboxError>;
}
