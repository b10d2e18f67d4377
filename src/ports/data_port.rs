//! Price data access port trait.

use crate::domain::error::GenetraderError;
use crate::domain::ohlcv::OhlcvBar;

pub trait DataPort {
    /// All candles for `market`, ordered by date.
    fn fetch_ohlcv(&self, market: &str) -> Result<Vec<OhlcvBar>, GenetraderError>;

    fn list_markets(&self) -> Result<Vec<String>, GenetraderError>;
}
