//! Persistence port for evolved strategies.

use crate::domain::error::GenetraderError;
use crate::domain::record::StrategyRecord;

pub trait StrategyStore {
    fn load(&self) -> Result<Vec<StrategyRecord>, GenetraderError>;

    fn save(&self, records: &[StrategyRecord]) -> Result<(), GenetraderError>;
}
