//! Symbol list and exchange list sources

use crate::exchanges::{MetricsError, MetricsResult, Symbol};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Used when the symbol file cannot be read or lists nothing
pub const DEFAULT_SYMBOLS: [&str; 5] = ["AAPL", "TSLA", "AMZN", "GOOG", "MSFT"];

/// Comma-separated exchange names used when none are configured
pub const DEFAULT_EXCHANGES: &str = "NYSE,NASDAQ,LSE";

pub fn default_symbols() -> Vec<Symbol> {
    DEFAULT_SYMBOLS.iter().map(|s| Symbol::new(*s)).collect()
}

/// Read one ticker per line, skipping blank lines and `#` comments
pub fn read_symbols(path: &Path) -> MetricsResult<Vec<Symbol>> {
    let contents = fs::read_to_string(path).map_err(|source| MetricsError::SymbolSource {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Symbol::new)
        .collect())
}

/// Load the symbol list, falling back to [`DEFAULT_SYMBOLS`]
pub fn load_symbols(path: impl AsRef<Path>) -> Vec<Symbol> {
    let path = path.as_ref();
    match read_symbols(path) {
        Ok(symbols) if !symbols.is_empty() => {
            let invalid: Vec<&Symbol> = symbols.iter().filter(|s| !s.validate()).collect();
            if !invalid.is_empty() {
                warn!(path = %path.display(), ?invalid, "Symbol list contains unusual tickers");
            }
            info!(path = %path.display(), count = symbols.len(), "Loaded symbols");
            symbols
        }
        Ok(_) => {
            warn!(path = %path.display(), "Symbol list is empty, using defaults");
            default_symbols()
        }
        Err(e) => {
            warn!(error = %e, "Using default symbols");
            default_symbols()
        }
    }
}

/// Split a comma-separated exchange list, trimming names and dropping empties
pub fn parse_exchanges(raw: &str) -> Vec<String> {
    let exchanges: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    if exchanges.is_empty() {
        warn!(raw, "No exchanges configured, using defaults");
        return parse_exchanges(DEFAULT_EXCHANGES);
    }
    exchanges
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_symbols_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# watched tickers\nNVDA\n\n  IBM  \nORCL").unwrap();

        let symbols = load_symbols(file.path());
        assert_eq!(symbols, vec![Symbol::new("NVDA"), Symbol::new("IBM"), Symbol::new("ORCL")]);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let symbols = load_symbols("no/such/symbols.txt");
        assert_eq!(symbols, default_symbols());
        assert!(matches!(
            read_symbols(Path::new("no/such/symbols.txt")),
            Err(MetricsError::SymbolSource { .. })
        ));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(load_symbols(file.path()).len(), DEFAULT_SYMBOLS.len());
    }

    #[test]
    fn test_parse_exchanges() {
        assert_eq!(parse_exchanges(" NYSE , LSE,,TSE "), vec!["NYSE", "LSE", "TSE"]);
        assert_eq!(parse_exchanges(" , "), vec!["NYSE", "NASDAQ", "LSE"]);
    }
}
