pub mod linalg;
pub mod trend;
pub mod window;

use crate::domain::snapshot::HighForecastPoint;

/// Number of trailing closes the windowed model regresses on; it needs at
/// least one training row beyond that.
pub const LOOK_BACK: usize = 60;

/// Length of the multi-day high forecast.
pub const HIGH_FORECAST_PERIODS: usize = 5;

/// The day's forecast outputs, each independently optional. Both models are
/// refit from scratch on every call; there is no persisted model state.
#[derive(Debug, Clone, Default)]
pub struct ForecastSet {
    pub trend_close: Option<f64>,
    pub window_close: Option<f64>,
    pub highs: Vec<HighForecastPoint>,
}

impl ForecastSet {
    pub fn compute(bars: &[crate::market::bars::DailyBar]) -> Self {
        Self {
            trend_close: trend::next_close_forecast(bars),
            window_close: window::next_close_forecast(bars),
            highs: trend::high_forecast(bars, HIGH_FORECAST_PERIODS),
        }
    }
}
