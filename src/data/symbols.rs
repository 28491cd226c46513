use std::path::Path;

use anyhow::{Context, Result};

use crate::config::DIAGNOSTICS;

use super::provider::SymbolRegistry;

/// Fixed symbol list for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSymbolRegistry {
    symbols: Vec<String>,
}

impl StaticSymbolRegistry {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            symbols: normalize(symbols),
        }
    }

    pub fn defaults() -> Self {
        Self::new(DIAGNOSTICS.default_symbols.iter())
    }

    /// One symbol per line. Blank lines and `#` comments are skipped.
    pub fn from_pairs_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pairs file {}", path.display()))?;
        let registry = Self::from_pairs_text(&text);
        if registry.symbols.is_empty() {
            log::warn!("Pairs file {} lists no symbols", path.display());
        }
        Ok(registry)
    }

    pub fn from_pairs_text(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(|line| line.split('#').next().unwrap_or("").trim())
                .filter(|line| !line.is_empty()),
        )
    }
}

impl SymbolRegistry for StaticSymbolRegistry {
    fn list_available_symbols(&self) -> Vec<String> {
        self.symbols.clone()
    }
}

/// Uppercase and drop duplicates (first occurrence wins). Every symbol is kept;
/// only the price stream limits how many it follows.
fn normalize<I, S>(symbols: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for symbol in symbols {
        let symbol = symbol.as_ref().trim().to_uppercase();
        if symbol.is_empty() || out.contains(&symbol) {
            continue;
        }
        out.push(symbol);
    }
    out
}
