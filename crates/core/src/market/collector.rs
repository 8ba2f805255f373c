use crate::config::Settings;
use crate::domain::asset::Asset;
use crate::market::bars::DailyBar;
use crate::market::indicators::IndicatorSeries;
use crate::market::prices::PriceHistoryClient;
use crate::market::HISTORY_DAYS;
use crate::providers::coingecko::CoingeckoClient;
use crate::providers::coinglass::CoinglassClient;
use crate::providers::lunarcrush::LunarcrushClient;
use crate::providers::santiment::SantimentClient;
use crate::providers::ExternalMetrics;
use anyhow::Result;

/// Everything the enrichment step produced for one asset: the bar history,
/// the indicator vectors aligned to it, and the per-run scalar metrics.
#[derive(Debug, Clone)]
pub struct AssetMarketData {
    pub bars: Vec<DailyBar>,
    pub indicators: IndicatorSeries,
    pub metrics: ExternalMetrics,
}

/// Fans one asset out to the price-history provider and the four
/// market-intelligence providers. Only the price history is load-bearing;
/// each metric provider degrades to `None` on failure.
pub struct MarketDataCollector {
    prices: PriceHistoryClient,
    futures: Option<CoinglassClient>,
    onchain: Option<SantimentClient>,
    social: Option<LunarcrushClient>,
    fundamentals: Option<CoingeckoClient>,
}

impl MarketDataCollector {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let futures = CoinglassClient::from_settings(settings)?;
        let onchain = SantimentClient::from_settings(settings)?;
        let social = LunarcrushClient::from_settings(settings)?;
        let fundamentals = CoingeckoClient::from_settings(settings)?;

        for (name, enabled) in [
            ("coinglass", futures.is_some()),
            ("santiment", onchain.is_some()),
            ("lunarcrush", social.is_some()),
            ("coingecko", fundamentals.is_some()),
        ] {
            if !enabled {
                tracing::warn!(provider = name, "no API key configured; provider disabled");
            }
        }

        Ok(Self {
            prices: PriceHistoryClient::from_settings(settings)?,
            futures,
            onchain,
            social,
            fundamentals,
        })
    }

    /// `Ok(None)` means the price history was empty or unavailable and the
    /// asset should be skipped for this run.
    pub async fn collect(&self, asset: &Asset) -> Result<Option<AssetMarketData>> {
        let bars = match self.prices.fetch_daily_bars(asset.ticker, HISTORY_DAYS).await {
            Ok(bars) if bars.is_empty() => {
                tracing::warn!(coin = asset.ticker, "no price history returned; skipping asset");
                return Ok(None);
            }
            Ok(bars) => bars,
            Err(err) => {
                tracing::warn!(coin = asset.ticker, error = %err, "price history fetch failed; skipping asset");
                return Ok(None);
            }
        };

        let indicators = IndicatorSeries::compute(&bars)?;

        let futures_fut = async {
            match &self.futures {
                Some(client) => match client.fetch_futures_metrics(asset.symbol).await {
                    Ok(m) => Some(m),
                    Err(err) => {
                        tracing::warn!(coin = asset.ticker, error = %err, "futures metrics fetch failed");
                        None
                    }
                },
                None => None,
            }
        };

        let onchain_fut = async {
            match &self.onchain {
                Some(client) => match client.fetch_onchain_metrics(asset.slug).await {
                    Ok(m) => Some(m),
                    Err(err) => {
                        tracing::warn!(coin = asset.ticker, error = %err, "on-chain metrics fetch failed");
                        None
                    }
                },
                None => None,
            }
        };

        let social_fut = async {
            match &self.social {
                Some(client) => match client.fetch_social_metrics(asset.symbol).await {
                    Ok(m) => Some(m),
                    Err(err) => {
                        tracing::warn!(coin = asset.ticker, error = %err, "social metrics fetch failed");
                        None
                    }
                },
                None => None,
            }
        };

        let fundamentals_fut = async {
            match &self.fundamentals {
                Some(client) => match client.fetch_fundamentals(asset.coingecko_id).await {
                    Ok(m) => Some(m),
                    Err(err) => {
                        tracing::warn!(coin = asset.ticker, error = %err, "fundamentals fetch failed");
                        None
                    }
                },
                None => None,
            }
        };

        let (futures, onchain, social, fundamentals) =
            tokio::join!(futures_fut, onchain_fut, social_fut, fundamentals_fut);

        Ok(Some(AssetMarketData {
            bars,
            indicators,
            metrics: ExternalMetrics {
                futures,
                onchain,
                social,
                fundamentals,
            },
        }))
    }
}
