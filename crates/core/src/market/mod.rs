pub mod bars;
pub mod collector;
pub mod indicators;
pub mod prices;

/// Minimum number of daily bars required before an asset is processed at
/// all; matches the windowed forecast's 60-lag feature construction plus
/// one training row.
pub const MIN_HISTORY_BARS: usize = 61;

/// Trailing window requested from the price-history provider.
pub const HISTORY_DAYS: u32 = 180;
