use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Transaction, TransactionType};

/// Share counts at or below this are treated as a closed position.
const SHARE_EPSILON: f64 = 1e-9;

/// Aggregated position in one symbol for one user.
///
/// The cost basis fields (`total_shares`, `average_buy_price`,
/// `total_invested`) move only through [`Holding::apply_trade`]; the
/// valuation fields are a snapshot refreshed by [`Holding::calculate_metrics`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symbol: String,
    pub total_shares: f64,
    pub average_buy_price: f64,
    pub total_invested: f64,
    pub current_price: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub profit_loss_percent: f64,
    pub last_updated: DateTime<Utc>,
}

impl Holding {
    pub fn empty(user_id: Uuid, symbol: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            symbol: symbol.into(),
            total_shares: 0.0,
            average_buy_price: 0.0,
            total_invested: 0.0,
            current_price: 0.0,
            current_value: 0.0,
            profit_loss: 0.0,
            profit_loss_percent: 0.0,
            last_updated: Utc::now(),
        }
    }

    /// Running-average cost basis update.
    ///
    /// A BUY adds `quantity * price` to the invested capital and re-averages.
    /// A SELL shrinks the position at the existing average cost; the sale
    /// price is ignored and no gain is realized into the holding.
    pub fn apply_trade(&mut self, side: TransactionType, quantity: f64, price: f64) {
        match side {
            TransactionType::Buy => {
                let invested = self.total_invested + quantity * price;
                let shares = self.total_shares + quantity;

                self.average_buy_price = if shares > 0.0 { invested / shares } else { 0.0 };
                self.total_shares = shares;
                self.total_invested = invested;
            }
            TransactionType::Sell => {
                let shares = (self.total_shares - quantity).max(0.0);

                if shares <= SHARE_EPSILON {
                    self.total_shares = 0.0;
                    self.total_invested = 0.0;
                    self.average_buy_price = 0.0;
                } else {
                    self.total_shares = shares;
                    self.total_invested = shares * self.average_buy_price;
                }
            }
        }
    }

    /// Replays the opposite trade at the stored price. Exact only for the
    /// sole trade on a holding; a reversed BUY leaves the blended average.
    pub fn reverse_trade(&mut self, transaction: &Transaction) {
        self.apply_trade(
            transaction.transaction_type.opposite(),
            transaction.quantity,
            transaction.price_per_share,
        );
    }

    pub fn calculate_metrics(&mut self, current_price: f64) {
        self.current_price = current_price;
        self.current_value = self.total_shares * current_price;
        self.profit_loss = self.current_value - self.total_invested;
        self.profit_loss_percent = if self.total_invested > 0.0 {
            self.profit_loss / self.total_invested * 100.0
        } else {
            0.0
        };
        self.last_updated = Utc::now();
    }

    /// Price to value the holding at when no fresh quote is available.
    pub fn fallback_price(&self) -> f64 {
        if self.current_price > 0.0 {
            self.current_price
        } else {
            self.average_buy_price
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HoldingDetail {
    pub holding: Holding,
    pub transactions: Vec<Transaction>,
}
