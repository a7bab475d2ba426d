mod analysis;
mod holding;
pub mod lenient;
mod performance;
mod transaction;
mod user;
mod watchlist;

pub use analysis::*;
pub use holding::{Holding, HoldingDetail};
pub use performance::{MessageResponse, PerformanceMetrics, PortfolioSummary, RealizedTrade};
pub use transaction::{
    CreateTransactionRequest, Pagination, SortField, SortOrder, Transaction, TransactionFilter,
    TransactionPage, TransactionQuery, TransactionType, UpdateTransactionRequest,
};
pub use user::{AuthResponse, LoginRequest, SignupRequest, User, UserProfile};
pub use watchlist::{AddWatchlistRequest, RemovedFromWatchlist, WatchlistStock};
