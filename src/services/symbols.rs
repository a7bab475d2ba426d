use std::sync::OnceLock;

use regex::Regex;

use crate::errors::AppError;

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9.\-]{1,12}$").expect("symbol pattern is valid"))
}

/// Trims and upper-cases a ticker, rejecting anything that is not a plain symbol.
pub fn normalize_symbol(raw: &str) -> Result<String, AppError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::Validation("Stock symbol is required".into()));
    }
    if !symbol_pattern().is_match(&symbol) {
        return Err(AppError::Validation(format!("Invalid stock symbol: {}", raw.trim())));
    }
    Ok(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_whitespace() {
        assert_eq!(normalize_symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("brk.b").unwrap(), "BRK.B");
        assert_eq!(normalize_symbol("RDS-A").unwrap(), "RDS-A");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(normalize_symbol("").is_err());
        assert!(normalize_symbol("   ").is_err());
        assert!(normalize_symbol("AAPL; DROP TABLE").is_err());
        assert!(normalize_symbol("ABCDEFGHIJKLMN").is_err());
    }
}
