use crate::market::bars::DailyBar;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use ta::indicators::{
    BollingerBands, ExponentialMovingAverage, FastStochastic, Maximum, Minimum,
    MovingAverageConvergenceDivergence, OnBalanceVolume, RelativeStrengthIndex,
    SimpleMovingAverage,
};
use ta::{DataItem, Next};

const MA_WINDOW: usize = 20;
const RSI_WINDOW: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const BB_WINDOW: usize = 20;
const BB_MULTIPLIER: f64 = 2.0;
const STOCH_WINDOW: usize = 14;
const STOCH_SMOOTH: usize = 3;
const ICHIMOKU_CONVERSION: usize = 9;
const ICHIMOKU_BASE: usize = 26;
const ICHIMOKU_SPAN_B: usize = 52;

/// Per-bar indicator vectors, aligned 1:1 with the source bars. Streaming
/// computation: early values carry the partial-window estimates the
/// underlying indicators emit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub sma: Vec<f64>,
    pub ema: Vec<f64>,
    pub rsi: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub bb_high: Vec<f64>,
    pub bb_low: Vec<f64>,
    pub stoch_k: Vec<f64>,
    pub stoch_d: Vec<f64>,
    pub obv: Vec<f64>,
    pub ichimoku_a: Vec<f64>,
    pub ichimoku_b: Vec<f64>,
}

/// The last bar's indicator values, as handed to the prompts and persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub sma: f64,
    pub ema: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub bb_high: f64,
    pub bb_low: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub obv: f64,
    pub ichimoku_a: f64,
    pub ichimoku_b: f64,
}

impl IndicatorSeries {
    pub fn compute(bars: &[DailyBar]) -> Result<Self> {
        let mut sma = SimpleMovingAverage::new(MA_WINDOW).map_err(init_err)?;
        let mut ema = ExponentialMovingAverage::new(MA_WINDOW).map_err(init_err)?;
        let mut rsi = RelativeStrengthIndex::new(RSI_WINDOW).map_err(init_err)?;
        let mut macd =
            MovingAverageConvergenceDivergence::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL)
                .map_err(init_err)?;
        let mut bb = BollingerBands::new(BB_WINDOW, BB_MULTIPLIER).map_err(init_err)?;
        let mut stoch = FastStochastic::new(STOCH_WINDOW).map_err(init_err)?;
        let mut stoch_smooth = SimpleMovingAverage::new(STOCH_SMOOTH).map_err(init_err)?;
        let mut obv = OnBalanceVolume::new();

        let mut conv_high = Maximum::new(ICHIMOKU_CONVERSION).map_err(init_err)?;
        let mut conv_low = Minimum::new(ICHIMOKU_CONVERSION).map_err(init_err)?;
        let mut base_high = Maximum::new(ICHIMOKU_BASE).map_err(init_err)?;
        let mut base_low = Minimum::new(ICHIMOKU_BASE).map_err(init_err)?;
        let mut span_b_high = Maximum::new(ICHIMOKU_SPAN_B).map_err(init_err)?;
        let mut span_b_low = Minimum::new(ICHIMOKU_SPAN_B).map_err(init_err)?;

        let mut out = Self::default();
        for bar in bars {
            let item = data_item(bar)?;

            out.sma.push(sma.next(bar.close));
            out.ema.push(ema.next(bar.close));
            out.rsi.push(rsi.next(bar.close));

            let m = macd.next(bar.close);
            out.macd.push(m.macd);
            out.macd_signal.push(m.signal);

            let b = bb.next(bar.close);
            out.bb_high.push(b.upper);
            out.bb_low.push(b.lower);

            let k = stoch.next(&item);
            out.stoch_k.push(k);
            out.stoch_d.push(stoch_smooth.next(k));

            out.obv.push(obv.next(&item));

            let conversion = (conv_high.next(bar.high) + conv_low.next(bar.low)) / 2.0;
            let base = (base_high.next(bar.high) + base_low.next(bar.low)) / 2.0;
            out.ichimoku_a.push((conversion + base) / 2.0);
            out.ichimoku_b
                .push((span_b_high.next(bar.high) + span_b_low.next(bar.low)) / 2.0);
        }

        Ok(out)
    }

    pub fn len(&self) -> usize {
        self.sma.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sma.is_empty()
    }

    pub fn latest(&self) -> Option<IndicatorSnapshot> {
        let i = self.len().checked_sub(1)?;
        Some(IndicatorSnapshot {
            sma: self.sma[i],
            ema: self.ema[i],
            rsi: self.rsi[i],
            macd: self.macd[i],
            macd_signal: self.macd_signal[i],
            bb_high: self.bb_high[i],
            bb_low: self.bb_low[i],
            stoch_k: self.stoch_k[i],
            stoch_d: self.stoch_d[i],
            obv: self.obv[i],
            ichimoku_a: self.ichimoku_a[i],
            ichimoku_b: self.ichimoku_b[i],
        })
    }
}

fn init_err(e: impl std::fmt::Display) -> anyhow::Error {
    anyhow::anyhow!("indicator initialization failed: {e}")
}

fn data_item(bar: &DailyBar) -> Result<DataItem> {
    // Provider glitches can emit a high below the open/close; widen the
    // range so the item always validates.
    let high = bar.high.max(bar.open).max(bar.close).max(bar.low);
    let low = bar.low.min(bar.open).min(bar.close);
    DataItem::builder()
        .open(bar.open)
        .high(high)
        .low(low)
        .close(bar.close)
        .volume(bar.volume)
        .build()
        .map_err(|e| anyhow::anyhow!("invalid bar for {}: {e}", bar.date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::bars::synthetic_series;

    #[test]
    fn vectors_stay_aligned_with_bars() {
        let bars = synthetic_series(80);
        let ind = IndicatorSeries::compute(&bars).unwrap();
        assert_eq!(ind.len(), 80);
        assert_eq!(ind.macd_signal.len(), 80);
        assert_eq!(ind.ichimoku_b.len(), 80);
        assert!(!ind.is_empty());
    }

    #[test]
    fn rsi_stays_in_bounds_and_tracks_an_uptrend() {
        let bars = synthetic_series(80);
        let ind = IndicatorSeries::compute(&bars).unwrap();
        assert!(ind.rsi.iter().all(|v| (0.0..=100.0).contains(v)));
        // The synthetic series drifts upward, so the last RSI leans bullish.
        assert!(*ind.rsi.last().unwrap() > 50.0);
    }

    #[test]
    fn bollinger_bands_bracket_the_average() {
        let bars = synthetic_series(60);
        let ind = IndicatorSeries::compute(&bars).unwrap();
        for i in 0..ind.len() {
            assert!(ind.bb_high[i] >= ind.bb_low[i]);
        }
    }

    #[test]
    fn stochastic_is_a_percentage() {
        let bars = synthetic_series(60);
        let ind = IndicatorSeries::compute(&bars).unwrap();
        assert!(ind.stoch_k.iter().all(|v| (0.0..=100.0).contains(v)));
        assert!(ind.stoch_d.iter().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn latest_matches_last_elements() {
        let bars = synthetic_series(70);
        let ind = IndicatorSeries::compute(&bars).unwrap();
        let snap = ind.latest().unwrap();
        assert_eq!(snap.rsi, *ind.rsi.last().unwrap());
        assert_eq!(snap.macd, *ind.macd.last().unwrap());
        assert!(IndicatorSeries::default().latest().is_none());
    }
}
