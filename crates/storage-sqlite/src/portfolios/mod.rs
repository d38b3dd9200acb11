//! Portfolio storage - database models, lease registry, and repository.

mod lease;
mod model;
mod repository;

pub use lease::LeaseRegistry;
pub use model::{portfolio_from_rows, rows_from_portfolio, HoldingDB, LotDB, PortfolioDB};
pub use repository::PortfolioRepository;
