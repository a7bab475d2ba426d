//! Heuristic stock analysis.
//!
//! Every field is a banded function of the quote's percent change; there is
//! no model and no signal beyond the single quote.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::warn;

use crate::errors::AppError;
use crate::external::quote_provider::Quote;
use crate::models::{
    CompanyOverview, ComparisonSummary, Confidence, Decision, GrowthForecast, InvestorFit,
    MarketStatus, NewsSentiment, PerformanceComparison, Recommendation, RecommendationComparison,
    RiskComparison, RiskLevel, RiskScore, Sentiment, StockAnalysis, StockComparison, Suitability,
    Trend, TrendingStock, YearPerformance,
};
use crate::services::quote_service::QuoteService;
use crate::services::symbols::normalize_symbol;

pub const TRENDING_SYMBOLS: &[&str] = &["AAPL", "MSFT", "GOOGL", "TSLA", "AMZN"];

pub async fn analyze(quotes: &QuoteService, symbol: &str) -> Result<StockAnalysis, AppError> {
    let symbol = normalize_symbol(symbol)?;
    let quote = quotes.quote(&symbol).await?;
    Ok(build_analysis(&symbol, &quote, Utc::now()))
}

pub async fn compare(
    quotes: &QuoteService,
    symbol1: &str,
    symbol2: &str,
) -> Result<StockComparison, AppError> {
    let (first, second) = futures::join!(analyze(quotes, symbol1), analyze(quotes, symbol2));
    let (stock1, stock2) = (first?, second?);
    let comparison = compare_analyses(&stock1, &stock2);

    Ok(StockComparison { stock1, stock2, comparison })
}

/// Symbols whose quote fails are left out.
pub async fn trending(quotes: &QuoteService) -> Vec<TrendingStock> {
    let results = join_all(TRENDING_SYMBOLS.iter().map(|s| analyze(quotes, s))).await;

    results
        .into_iter()
        .zip(TRENDING_SYMBOLS)
        .filter_map(|(result, symbol)| match result {
            Ok(analysis) => Some(TrendingStock::from(&analysis)),
            Err(e) => {
                warn!("Skipping trending symbol {}: {}", symbol, e);
                None
            }
        })
        .collect()
}

pub fn build_analysis(symbol: &str, quote: &Quote, now: DateTime<Utc>) -> StockAnalysis {
    let price = quote.close;
    let pct = quote.percent_change;
    let name = quote
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| symbol.to_string());

    StockAnalysis {
        symbol: symbol.to_uppercase(),
        company_overview: CompanyOverview {
            description: format!("Stock analysis for {}", name),
            name,
            sector: "N/A".to_string(),
            industry: "N/A".to_string(),
            market_cap: quote.market_cap.map(|cap| format!("${:.2}B", cap / 1e9)),
            pe_ratio: None,
        },
        current_market_status: MarketStatus {
            current_price: price,
            change: quote.change,
            change_percent: pct,
            trend: trend(pct),
            volume: quote.volume.clone(),
            last_updated: quote
                .datetime
                .clone()
                .unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
        },
        recommendation: recommendation(pct),
        year_performance: year_performance(price, pct),
        growth_forecast: growth_forecast(pct),
        risk_score: risk_score(pct),
        investment_type: investor_fit(pct),
        news_sentiment: news_sentiment(pct),
        timestamp: now,
    }
}

pub fn trend(pct: f64) -> Trend {
    if pct > 0.0 {
        Trend::Bullish
    } else if pct < 0.0 {
        Trend::Bearish
    } else {
        Trend::Sideways
    }
}

pub fn recommendation(pct: f64) -> Recommendation {
    let (decision, confidence, score, reasons) = if pct > 5.0 {
        (Decision::Buy, Confidence::High, 3, vec!["Strong positive momentum", "Price trending upward"])
    } else if pct > 2.0 {
        (Decision::Buy, Confidence::Moderate, 2, vec!["Positive price movement"])
    } else if pct < -5.0 {
        (Decision::Sell, Confidence::High, -3, vec!["Significant price decline", "Negative momentum"])
    } else if pct < -2.0 {
        (Decision::Sell, Confidence::Moderate, -2, vec!["Downward price trend"])
    } else {
        (Decision::Hold, Confidence::Moderate, 0, vec!["Stable price action", "Wait for clearer signals"])
    };

    Recommendation {
        decision,
        confidence,
        score,
        reasons: reasons.iter().map(|r| r.to_string()).collect(),
    }
}

pub fn risk_score(pct: f64) -> RiskScore {
    let volatility = pct.abs();
    let score = if volatility > 10.0 {
        8
    } else if volatility > 5.0 {
        6
    } else if volatility > 2.0 {
        5
    } else {
        3
    };
    let level = match score {
        0..=3 => RiskLevel::Low,
        4..=6 => RiskLevel::Moderate,
        _ => RiskLevel::High,
    };

    RiskScore {
        score,
        level,
        factors: vec![
            format!("Daily volatility: {:.2}%", volatility),
            format!("Price momentum: {}", if pct > 0.0 { "Positive" } else { "Negative" }),
            "Market conditions: Normal".to_string(),
        ],
    }
}

pub fn year_performance(price: f64, pct: f64) -> YearPerformance {
    // Rough annualization of the daily move
    let estimated = pct * 50.0;
    let divisor = 1.0 + estimated / 100.0;

    YearPerformance {
        percent_change: estimated,
        year_ago_price: if divisor > 0.0 { price / divisor } else { 0.0 },
        current_price: price,
        high: price * 1.15,
        low: price * 0.85,
        volatility_note: if estimated.abs() > 30.0 {
            "High volatility".to_string()
        } else {
            "Moderate volatility".to_string()
        },
    }
}

pub fn growth_forecast(pct: f64) -> GrowthForecast {
    let short_term = if pct > 0.0 {
        "Positive momentum expected to continue in 1-3 months with potential 5-10% gains"
    } else {
        "Cautious outlook for near term, may see 3-5% decline"
    };
    let long_term = if pct.abs() < 5.0 {
        "Stable long-term outlook with moderate growth potential of 15-20% annually"
    } else {
        "Volatile conditions suggest uncertain long-term prospects"
    };

    GrowthForecast {
        short_term: short_term.to_string(),
        long_term: long_term.to_string(),
        confidence: if pct.abs() < 3.0 { Confidence::Moderate } else { Confidence::Low },
    }
}

pub fn investor_fit(pct: f64) -> Vec<InvestorFit> {
    let volatility = pct.abs();
    let fit = |investor: &str, suitability, reason: &str| InvestorFit {
        investor: investor.to_string(),
        suitability,
        reason: reason.to_string(),
    };

    vec![
        if volatility > 3.0 {
            fit("Short-term Traders", Suitability::High, "High volatility creates trading opportunities")
        } else {
            fit("Short-term Traders", Suitability::Low, "Low volatility limits short-term gains")
        },
        if volatility < 5.0 {
            fit("Long-term Investors", Suitability::High, "Stable growth potential for long-term holding")
        } else {
            fit("Long-term Investors", Suitability::Moderate, "Moderate risk requires careful monitoring")
        },
        if volatility > 5.0 {
            fit("High-risk Takers", Suitability::High, "Extreme volatility suits aggressive strategies")
        } else {
            fit("High-risk Takers", Suitability::Low, "Insufficient risk for aggressive traders")
        },
    ]
}

pub fn news_sentiment(pct: f64) -> NewsSentiment {
    let (sentiment, summary) = if pct > 3.0 {
        (
            Sentiment::Positive,
            "Strong positive momentum suggests bullish market sentiment and investor confidence",
        )
    } else if pct < -3.0 {
        (
            Sentiment::Negative,
            "Negative price action indicates bearish sentiment or sector headwinds",
        )
    } else {
        (
            Sentiment::Neutral,
            "Balanced market sentiment with no strong directional bias",
        )
    };

    NewsSentiment {
        sentiment,
        summary: summary.to_string(),
        note: "Sentiment based on price action and technical indicators".to_string(),
    }
}

pub fn compare_analyses(a: &StockAnalysis, b: &StockAnalysis) -> ComparisonSummary {
    let perf_a = a.year_performance.percent_change;
    let perf_b = b.year_performance.percent_change;
    let risk_a = a.risk_score.score;
    let risk_b = b.risk_score.score;
    let buy_a = a.recommendation.decision == Decision::Buy;
    let buy_b = b.recommendation.decision == Decision::Buy;

    let stronger = match (buy_a, buy_b) {
        (true, false) => a.symbol.clone(),
        (false, true) => b.symbol.clone(),
        _ => "Equal".to_string(),
    };

    ComparisonSummary {
        performance: PerformanceComparison {
            winner: if perf_a > perf_b { a.symbol.clone() } else { b.symbol.clone() },
            difference: (perf_a - perf_b).abs(),
        },
        risk: RiskComparison {
            lower_risk: if risk_a < risk_b { a.symbol.clone() } else { b.symbol.clone() },
            score_difference: risk_a.abs_diff(risk_b),
        },
        recommendation: RecommendationComparison { stronger },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(pct: f64) -> Quote {
        Quote {
            symbol: "TEST".to_string(),
            name: Some("Test Corp".to_string()),
            close: 100.0,
            change: pct,
            percent_change: pct,
            volume: Some("1000".to_string()),
            market_cap: Some(2.5e9),
            datetime: Some("2024-03-01".to_string()),
        }
    }

    #[test]
    fn test_recommendation_bands() {
        let cases = [
            (6.0, Decision::Buy, Confidence::High, 3),
            (5.0, Decision::Buy, Confidence::Moderate, 2),
            (2.5, Decision::Buy, Confidence::Moderate, 2),
            (2.0, Decision::Hold, Confidence::Moderate, 0),
            (0.0, Decision::Hold, Confidence::Moderate, 0),
            (-2.0, Decision::Hold, Confidence::Moderate, 0),
            (-3.0, Decision::Sell, Confidence::Moderate, -2),
            (-5.0, Decision::Sell, Confidence::Moderate, -2),
            (-5.1, Decision::Sell, Confidence::High, -3),
        ];
        for (pct, decision, confidence, score) in cases {
            let rec = recommendation(pct);
            assert_eq!(rec.decision, decision, "pct {}", pct);
            assert_eq!(rec.confidence, confidence, "pct {}", pct);
            assert_eq!(rec.score, score, "pct {}", pct);
            assert!(!rec.reasons.is_empty());
        }
    }

    #[test]
    fn test_risk_score_bands() {
        assert_eq!(risk_score(0.5).score, 3);
        assert_eq!(risk_score(-2.0).score, 3);
        assert_eq!(risk_score(2.1).score, 5);
        assert_eq!(risk_score(-5.5).score, 6);
        assert_eq!(risk_score(10.0).score, 6);
        assert_eq!(risk_score(-12.0).score, 8);

        assert_eq!(risk_score(1.0).level, RiskLevel::Low);
        assert_eq!(risk_score(4.0).level, RiskLevel::Moderate);
        assert_eq!(risk_score(7.0).level, RiskLevel::Moderate);
        assert_eq!(risk_score(11.0).level, RiskLevel::High);
    }

    #[test]
    fn test_build_analysis_is_deterministic() {
        let now = Utc::now();
        let a = build_analysis("test", &quote(2.0), now);
        let b = build_analysis("TEST", &quote(2.0), now);

        assert_eq!(a, b);
        assert_eq!(a.symbol, "TEST");
        assert_eq!(a.company_overview.market_cap.as_deref(), Some("$2.50B"));
        assert_eq!(a.current_market_status.trend, Trend::Bullish);
        assert_eq!(a.current_market_status.last_updated, "2024-03-01");
        assert_eq!(a.year_performance.percent_change, 100.0);
        assert_eq!(a.year_performance.volatility_note, "High volatility");
        assert_eq!(a.growth_forecast.confidence, Confidence::Moderate);
        assert_eq!(a.news_sentiment.sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_name_falls_back_to_symbol() {
        let mut q = quote(0.0);
        q.name = None;
        q.market_cap = None;
        let analysis = build_analysis("XYZ", &q, Utc::now());

        assert_eq!(analysis.company_overview.name, "XYZ");
        assert_eq!(analysis.company_overview.market_cap, None);
        assert_eq!(analysis.current_market_status.trend, Trend::Sideways);
    }

    #[test]
    fn test_investor_fit_thresholds() {
        let calm = investor_fit(1.0);
        assert_eq!(calm[0].suitability, Suitability::Low);
        assert_eq!(calm[1].suitability, Suitability::High);
        assert_eq!(calm[2].suitability, Suitability::Low);

        let wild = investor_fit(-8.0);
        assert_eq!(wild[0].suitability, Suitability::High);
        assert_eq!(wild[1].suitability, Suitability::Moderate);
        assert_eq!(wild[2].suitability, Suitability::High);
    }

    #[test]
    fn test_compare_analyses() {
        let now = Utc::now();
        let up = build_analysis("UP", &quote(6.0), now);
        let flat = build_analysis("FLAT", &quote(0.5), now);

        let summary = compare_analyses(&up, &flat);
        assert_eq!(summary.performance.winner, "UP");
        assert_eq!(summary.performance.difference, 275.0);
        assert_eq!(summary.risk.lower_risk, "FLAT");
        assert_eq!(summary.risk.score_difference, 3);
        assert_eq!(summary.recommendation.stronger, "UP");

        let same = compare_analyses(&flat, &flat);
        assert_eq!(same.recommendation.stronger, "Equal");
    }
}
