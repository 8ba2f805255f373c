/// One tracked asset and every provider-specific identifier it goes by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    /// Price-history ticker, e.g. "BTC-USD".
    pub ticker: &'static str,
    /// Display name used for news queries and prompts.
    pub name: &'static str,
    /// Bare symbol used by the derivatives and social-ranking providers.
    pub symbol: &'static str,
    /// Project slug used by the on-chain provider.
    pub slug: &'static str,
    /// Project id used by the fundamentals provider.
    pub coingecko_id: &'static str,
}

/// The fixed universe the daily run iterates over.
pub const ASSETS: &[Asset] = &[
    Asset {
        ticker: "BTC-USD",
        name: "Bitcoin",
        symbol: "BTC",
        slug: "bitcoin",
        coingecko_id: "bitcoin",
    },
    Asset {
        ticker: "ETH-USD",
        name: "Ethereum",
        symbol: "ETH",
        slug: "ethereum",
        coingecko_id: "ethereum",
    },
    Asset {
        ticker: "XRP-USD",
        name: "XRP",
        symbol: "XRP",
        slug: "xrp",
        coingecko_id: "ripple",
    },
];

pub fn find_by_ticker(ticker: &str) -> Option<&'static Asset> {
    ASSETS.iter().find(|a| a.ticker == ticker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_unique_tickers() {
        let mut seen = std::collections::BTreeSet::new();
        for asset in ASSETS {
            assert!(seen.insert(asset.ticker), "duplicate ticker {}", asset.ticker);
        }
    }

    #[test]
    fn lookup_by_ticker() {
        assert_eq!(find_by_ticker("ETH-USD").unwrap().slug, "ethereum");
        assert!(find_by_ticker("DOGE-USD").is_none());
    }
}
