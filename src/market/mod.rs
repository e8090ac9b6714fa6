//! Historical market data and its CSV loader

mod series;
pub mod loader;

pub use series::{HistoricalSeries, YearRecord};
pub use loader::{load_series, load_series_from_reader};
