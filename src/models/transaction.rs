use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::lenient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Buy,
    Sell,
}

impl TransactionType {
    /// The trade that undoes this one when replayed.
    pub fn opposite(self) -> Self {
        match self {
            TransactionType::Buy => TransactionType::Sell,
            TransactionType::Sell => TransactionType::Buy,
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Ok(TransactionType::Buy),
            "SELL" => Ok(TransactionType::Sell),
            _ => Err("Type must be BUY or SELL".to_string()),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "BUY"),
            TransactionType::Sell => write!(f, "SELL"),
        }
    }
}

/// A recorded BUY or SELL. `total_amount` is always `quantity * price_per_share`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symbol: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub quantity: f64,
    pub price_per_share: f64,
    pub total_amount: f64,
    pub transaction_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: Uuid,
        symbol: String,
        transaction_type: TransactionType,
        quantity: f64,
        price_per_share: f64,
        transaction_date: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            symbol,
            transaction_type,
            quantity,
            price_per_share,
            total_amount: quantity * price_per_share,
            transaction_date: transaction_date.unwrap_or(now),
            notes,
            created_at: now,
        }
    }

    /// Overwrites the editable fields and keeps `total_amount` consistent.
    pub fn apply_edit(&mut self, edit: &UpdateTransactionRequest) {
        if let Some(quantity) = edit.quantity {
            self.quantity = quantity;
        }
        if let Some(price) = edit.price_per_share {
            self.price_per_share = price;
        }
        if let Some(notes) = &edit.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(date) = edit.transaction_date {
            self.transaction_date = date;
        }
        self.total_amount = self.quantity * self.price_per_share;
    }
}

/// Raw create payload; every field is optional so missing ones surface as a 400.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub price_per_share: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_date_start")]
    pub transaction_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    pub price_per_share: Option<f64>,
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_date_start")]
    pub transaction_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    TransactionDate,
    Symbol,
    Quantity,
    PricePerShare,
    TotalAmount,
    CreatedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::TransactionDate => "transaction_date",
            SortField::Symbol => "symbol",
            SortField::Quantity => "quantity",
            SortField::PricePerShare => "price_per_share",
            SortField::TotalAmount => "total_amount",
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    #[serde(default, deserialize_with = "lenient::option_date_start")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::option_date_end")]
    pub end_date: Option<DateTime<Utc>>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}

/// Validated listing filter handed to the query layer.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub symbol: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self { page, limit, total, pages }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_amount_is_quantity_times_price() {
        let mut tx = Transaction::new(
            Uuid::new_v4(),
            "AAPL".into(),
            TransactionType::Buy,
            12.5,
            80.0,
            None,
            None,
        );
        assert_eq!(tx.total_amount, 1000.0);

        tx.apply_edit(&UpdateTransactionRequest {
            quantity: Some(4.0),
            ..Default::default()
        });
        assert_eq!(tx.total_amount, 320.0);

        tx.apply_edit(&UpdateTransactionRequest {
            price_per_share: Some(25.0),
            notes: Some("rebalanced".into()),
            ..Default::default()
        });
        assert_eq!(tx.total_amount, 100.0);
        assert_eq!(tx.notes.as_deref(), Some("rebalanced"));
    }

    #[test]
    fn test_type_parsing_is_case_insensitive() {
        assert_eq!("buy".parse::<TransactionType>(), Ok(TransactionType::Buy));
        assert_eq!(" Sell ".parse::<TransactionType>(), Ok(TransactionType::Sell));
        assert!("HOLD".parse::<TransactionType>().is_err());
        assert_eq!(TransactionType::Buy.opposite(), TransactionType::Sell);
    }

    #[test]
    fn test_pagination_pages_round_up() {
        assert_eq!(Pagination::new(1, 20, 0).pages, 0);
        assert_eq!(Pagination::new(1, 20, 20).pages, 1);
        assert_eq!(Pagination::new(2, 20, 41).pages, 3);
    }

    #[test]
    fn test_query_deserializes_camel_case() {
        let query: TransactionQuery = serde_json::from_value(serde_json::json!({
            "sortBy": "pricePerShare",
            "sortOrder": "asc",
            "type": "SELL"
        }))
        .unwrap();
        assert_eq!(query.sort_by, Some(SortField::PricePerShare));
        assert_eq!(query.sort_order, Some(SortOrder::Asc));
        assert_eq!(query.transaction_type, Some(TransactionType::Sell));
        assert_eq!(SortField::PricePerShare.column(), "price_per_share");
    }

    #[test]
    fn test_create_accepts_form_strings() {
        let request: CreateTransactionRequest = serde_json::from_value(serde_json::json!({
            "symbol": "AAPL",
            "type": "BUY",
            "quantity": "10",
            "pricePerShare": "150.25",
            "transactionDate": "2024-05-01"
        }))
        .unwrap();

        assert_eq!(request.quantity, Some(10.0));
        assert_eq!(request.price_per_share, Some(150.25));
        assert_eq!(
            request.transaction_date.map(|d| d.to_rfc3339()),
            Some("2024-05-01T00:00:00+00:00".to_string())
        );

        let edit: UpdateTransactionRequest =
            serde_json::from_value(serde_json::json!({ "quantity": "2", "pricePerShare": 3 })).unwrap();
        assert_eq!((edit.quantity, edit.price_per_share), (Some(2.0), Some(3.0)));
    }
}
