use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Hold,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Moderate Risk")]
    Moderate,
    #[serde(rename = "High Risk")]
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Suitability {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyOverview {
    pub name: String,
    pub description: String,
    pub sector: String,
    pub industry: String,
    pub market_cap: Option<String>,
    pub pe_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatus {
    pub current_price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub trend: Trend,
    pub volume: Option<String>,
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub decision: Decision,
    pub confidence: Confidence,
    pub score: i32,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearPerformance {
    pub percent_change: f64,
    pub year_ago_price: f64,
    pub current_price: f64,
    pub high: f64,
    pub low: f64,
    pub volatility_note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthForecast {
    pub short_term: String,
    pub long_term: String,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScore {
    pub score: u8,
    pub level: RiskLevel,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorFit {
    #[serde(rename = "type")]
    pub investor: String,
    pub suitability: Suitability,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsSentiment {
    pub sentiment: Sentiment,
    pub summary: String,
    pub note: String,
}

/// Heuristic report derived from a single quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAnalysis {
    pub symbol: String,
    pub company_overview: CompanyOverview,
    pub current_market_status: MarketStatus,
    pub recommendation: Recommendation,
    pub year_performance: YearPerformance,
    pub growth_forecast: GrowthForecast,
    pub risk_score: RiskScore,
    pub investment_type: Vec<InvestorFit>,
    pub news_sentiment: NewsSentiment,
    pub timestamp: DateTime<Utc>,
}

/// Analysis snapshot as persisted on a watchlist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "version")]
pub enum StoredAnalysis {
    #[serde(rename = "1")]
    V1(StockAnalysis),
}

impl From<StockAnalysis> for StoredAnalysis {
    fn from(value: StockAnalysis) -> Self {
        StoredAnalysis::V1(value)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub symbol1: Option<String>,
    pub symbol2: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceComparison {
    pub winner: String,
    pub difference: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskComparison {
    pub lower_risk: String,
    pub score_difference: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationComparison {
    pub stronger: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub performance: PerformanceComparison,
    pub risk: RiskComparison,
    pub recommendation: RecommendationComparison,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockComparison {
    pub stock1: StockAnalysis,
    pub stock2: StockAnalysis,
    pub comparison: ComparisonSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingStock {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_percent: f64,
    pub trend: Trend,
    pub recommendation: Decision,
    pub risk_score: u8,
}

impl From<&StockAnalysis> for TrendingStock {
    fn from(a: &StockAnalysis) -> Self {
        Self {
            symbol: a.symbol.clone(),
            name: a.company_overview.name.clone(),
            price: a.current_market_status.current_price,
            change_percent: a.current_market_status.change_percent,
            trend: a.current_market_status.trend,
            recommendation: a.recommendation.decision,
            risk_score: a.risk_score.score,
        }
    }
}
