use crate::market::bars::DailyBar;
use crate::market::indicators::IndicatorSeries;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The per-run detail document behind the dashboard charts: the bar history
/// with its aligned indicator vectors. Rewritten whole on every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartDetail {
    pub coin: String,
    pub bars: Vec<DailyBar>,
    pub indicators: IndicatorSeries,
}

fn detail_path(data_dir: &Path, coin: &str) -> PathBuf {
    data_dir.join(format!("{coin}_detail.json"))
}

pub fn save_chart_detail(data_dir: &Path, detail: &ChartDetail) -> Result<()> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

    let path = detail_path(data_dir, &detail.coin);
    let body = serde_json::to_vec_pretty(detail).context("failed to serialize chart detail")?;
    std::fs::write(&path, body)
        .with_context(|| format!("failed to write chart detail {}", path.display()))?;
    Ok(())
}

pub fn load_chart_detail(data_dir: &Path, coin: &str) -> Result<Option<ChartDetail>> {
    let path = detail_path(data_dir, coin);
    let body = match std::fs::read(&path) {
        Ok(body) => body,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read chart detail {}", path.display()))
        }
    };

    let detail = serde_json::from_slice(&body)
        .with_context(|| format!("chart detail {} is not valid JSON", path.display()))?;
    Ok(Some(detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::bars::synthetic_series;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "daybrief-chartfiles-{tag}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn round_trips_a_detail_document() {
        let dir = temp_dir("roundtrip");
        let bars = synthetic_series(70);
        let indicators = IndicatorSeries::compute(&bars).unwrap();
        let detail = ChartDetail {
            coin: "BTC-USD".to_string(),
            bars,
            indicators,
        };

        save_chart_detail(&dir, &detail).unwrap();
        let loaded = load_chart_detail(&dir, "BTC-USD").unwrap().unwrap();
        assert_eq!(loaded.coin, "BTC-USD");
        assert_eq!(loaded.bars.len(), 70);
        assert_eq!(loaded.indicators.rsi.len(), 70);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_none_not_an_error() {
        let dir = temp_dir("missing");
        assert!(load_chart_detail(&dir, "ETH-USD").unwrap().is_none());
    }
}
