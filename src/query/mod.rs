pub mod driver;
pub mod oracle;

pub use driver::{QueryDriver, RankedResult};
pub use oracle::{CachingStatisticsOracle, StatisticsOracle, StatsKey};
