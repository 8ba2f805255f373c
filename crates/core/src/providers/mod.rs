pub mod coingecko;
pub mod coinglass;
pub mod lunarcrush;
pub mod news;
pub mod santiment;

use serde::{Deserialize, Serialize};

/// Latest derivatives-market readings for one asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FuturesMetrics {
    pub funding_rate_pct: f64,
    pub open_interest_usd: f64,
    pub long_short_ratio: f64,
    pub volume_24h_usd: f64,
}

/// Latest on-chain and social-volume readings for one asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnChainMetrics {
    pub mvrv_ratio: f64,
    pub social_dominance_pct: f64,
    pub daily_active_addresses: f64,
}

/// Social-engagement ranking for one asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialMetrics {
    pub galaxy_score: f64,
    pub alt_rank: f64,
}

/// Project-health and market-structure readings for one asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalMetrics {
    pub market_cap_rank: f64,
    pub community_score: f64,
    pub developer_score: f64,
    pub sentiment_up_pct: f64,
    pub circulating_supply: f64,
    pub all_time_high: f64,
    pub transaction_volume_24h: f64,
}

/// The per-run scalar snapshot from the external providers. Each group is
/// independently optional: a failed or unconfigured provider leaves its
/// group `None`, and the default substitution happens only at record
/// assembly. These values are never spliced onto the bar history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalMetrics {
    pub futures: Option<FuturesMetrics>,
    pub onchain: Option<OnChainMetrics>,
    pub social: Option<SocialMetrics>,
    pub fundamentals: Option<FundamentalMetrics>,
}
