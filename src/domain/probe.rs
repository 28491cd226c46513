use {
    itertools::iproduct,
    serde::{Deserialize, Serialize},
};

/// One cell of the `symbols × timeframes` diagnostic grid.
#[derive(Serialize, Deserialize, Debug, Clone, Hash, Eq, PartialEq)]
pub struct Probe {
    pub symbol: String,
    pub timeframe: String,
}

impl Probe {
    pub fn new(symbol: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe: timeframe.into(),
        }
    }

    /// Key used against the market-data feed, which indexes prices in lowercase.
    pub fn price_key(&self) -> String {
        self.symbol.to_lowercase()
    }
}

impl std::fmt::Display for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.symbol, self.timeframe)
    }
}

/// Build the probe grid: symbols outer, timeframes inner, both in supplied order.
pub fn build_grid(symbols: &[String], timeframes: &[String]) -> Vec<Probe> {
    iproduct!(symbols.iter(), timeframes.iter())
        .map(|(symbol, timeframe)| Probe::new(symbol.as_str(), timeframe.as_str()))
        .collect()
}
