//! Tests for the portfolio service: lease-mutate-save sequencing, price
//! resolution, and ledger recording, against in-memory mocks.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tokio::sync::Mutex as AsyncMutex;

    use crate::constants::DEFAULT_CURRENCY;
    use crate::errors::{Error, Result};
    use crate::market_data::{MarketDataError, PriceSourceTrait};
    use crate::money::Price;
    use crate::portfolios::{
        Portfolio, PortfolioError, PortfolioLease, PortfolioRepositoryTrait, PortfolioService,
        PortfolioServiceTrait, Ticker,
    };
    use crate::transactions::{
        NewTransactionRecord, TransactionKind, TransactionLogTrait, TransactionRecord,
    };

    type SharedRecords = Arc<Mutex<Vec<TransactionRecord>>>;

    // --- Mock PortfolioRepository ---

    struct MockPortfolioRepository {
        portfolios: Arc<Mutex<HashMap<String, Portfolio>>>,
        locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
        records: SharedRecords,
        saves: AtomicUsize,
    }

    impl MockPortfolioRepository {
        fn new(records: SharedRecords) -> Self {
            Self {
                portfolios: Arc::new(Mutex::new(HashMap::new())),
                locks: Mutex::new(HashMap::new()),
                records,
                saves: AtomicUsize::new(0),
            }
        }

        fn save_count(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        fn stored(&self, id: &str) -> Portfolio {
            self.portfolios.lock().unwrap().get(id).cloned().unwrap()
        }
    }

    #[async_trait]
    impl PortfolioRepositoryTrait for MockPortfolioRepository {
        async fn create(&self, portfolio: Portfolio) -> Result<Portfolio> {
            self.portfolios
                .lock()
                .unwrap()
                .insert(portfolio.id().to_string(), portfolio.clone());
            Ok(portfolio)
        }

        async fn acquire_exclusive(&self, portfolio_id: &str) -> Result<PortfolioLease> {
            let lock = {
                let mut locks = self.locks.lock().unwrap();
                locks
                    .entry(portfolio_id.to_string())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                    .clone()
            };
            let guard = lock.lock_owned().await;
            let portfolio = self
                .portfolios
                .lock()
                .unwrap()
                .get(portfolio_id)
                .cloned()
                .ok_or_else(|| PortfolioError::NotFound(portfolio_id.to_string()))?;
            Ok(PortfolioLease::new(portfolio, guard))
        }

        async fn save(
            &self,
            lease: PortfolioLease,
            entry: NewTransactionRecord,
        ) -> Result<TransactionRecord> {
            let (portfolio, guard) = lease.into_parts();
            self.portfolios
                .lock()
                .unwrap()
                .insert(portfolio.id().to_string(), portfolio);
            let record = TransactionRecord {
                id: uuid::Uuid::new_v4().to_string(),
                portfolio_id: entry.portfolio_id,
                kind: entry.kind,
                ticker: entry.ticker,
                quantity: entry.quantity,
                unit_price: entry.unit_price,
                total_amount: entry.total_amount,
                profit: entry.profit,
                created_at: Utc::now(),
            };
            self.records.lock().unwrap().push(record.clone());
            self.saves.fetch_add(1, Ordering::SeqCst);
            drop(guard);
            Ok(record)
        }

        fn get_by_id(&self, portfolio_id: &str) -> Result<Portfolio> {
            self.portfolios
                .lock()
                .unwrap()
                .get(portfolio_id)
                .cloned()
                .ok_or_else(|| PortfolioError::NotFound(portfolio_id.to_string()).into())
        }

        fn list(&self) -> Result<Vec<Portfolio>> {
            Ok(self.portfolios.lock().unwrap().values().cloned().collect())
        }
    }

    // --- Mock TransactionLog ---

    struct MockTransactionLog {
        records: SharedRecords,
    }

    #[async_trait]
    impl TransactionLogTrait for MockTransactionLog {
        async fn append(&self, entry: NewTransactionRecord) -> Result<TransactionRecord> {
            let record = TransactionRecord {
                id: uuid::Uuid::new_v4().to_string(),
                portfolio_id: entry.portfolio_id,
                kind: entry.kind,
                ticker: entry.ticker,
                quantity: entry.quantity,
                unit_price: entry.unit_price,
                total_amount: entry.total_amount,
                profit: entry.profit,
                created_at: Utc::now(),
            };
            self.records.lock().unwrap().push(record.clone());
            Ok(record)
        }

        fn list_by_portfolio(
            &self,
            portfolio_id: &str,
            kind: Option<TransactionKind>,
        ) -> Result<Vec<TransactionRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.portfolio_id == portfolio_id)
                .filter(|r| kind.map_or(true, |k| r.kind == k))
                .cloned()
                .collect())
        }
    }

    // --- Mock PriceSource ---

    struct MockPriceSource {
        prices: HashMap<String, Price>,
        calls: AtomicUsize,
    }

    impl MockPriceSource {
        fn with_price(symbol: &str, amount: rust_decimal::Decimal) -> Self {
            let mut prices = HashMap::new();
            prices.insert(symbol.to_string(), Price::new(amount, "USD").unwrap());
            Self {
                prices,
                calls: AtomicUsize::new(0),
            }
        }

        fn unavailable() -> Self {
            Self {
                prices: HashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PriceSourceTrait for MockPriceSource {
        async fn current_price(&self, ticker: &Ticker) -> Result<Price> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prices
                .get(ticker.as_str())
                .cloned()
                .ok_or_else(|| MarketDataError::NotFound(ticker.to_string()).into())
        }

        async fn current_prices(&self, tickers: &[Ticker]) -> Result<HashMap<Ticker, Price>> {
            let mut out = HashMap::new();
            for ticker in tickers {
                out.insert(ticker.clone(), self.current_price(ticker).await?);
            }
            Ok(out)
        }
    }

    struct Fixture {
        service: PortfolioService,
        repository: Arc<MockPortfolioRepository>,
        price_source: Arc<MockPriceSource>,
    }

    fn setup(price_source: MockPriceSource) -> Fixture {
        let records: SharedRecords = Arc::new(Mutex::new(Vec::new()));
        let repository = Arc::new(MockPortfolioRepository::new(records.clone()));
        let ledger = Arc::new(MockTransactionLog { records });
        let price_source = Arc::new(price_source);
        let service = PortfolioService::new(
            repository.clone(),
            ledger,
            price_source.clone(),
            DEFAULT_CURRENCY.to_string(),
        );
        Fixture {
            service,
            repository,
            price_source,
        }
    }

    async fn funded_portfolio(fixture: &Fixture, amount: rust_decimal::Decimal) -> String {
        let portfolio = fixture.service.create_portfolio("Alice").await.unwrap();
        let id = portfolio.id().to_string();
        fixture.service.deposit(&id, amount).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_create_portfolio_persists_zero_balance() {
        let fixture = setup(MockPriceSource::unavailable());
        let portfolio = fixture.service.create_portfolio("Alice").await.unwrap();

        let stored = fixture.repository.stored(portfolio.id());
        assert_eq!(stored, portfolio);
        assert!(stored.balance().is_zero());
    }

    #[tokio::test]
    async fn test_deposit_updates_state_and_appends_record() {
        let fixture = setup(MockPriceSource::unavailable());
        let id = funded_portfolio(&fixture, dec!(1000)).await;

        let stored = fixture.repository.stored(&id);
        assert_eq!(stored.balance().amount(), dec!(1000.00));

        let records = fixture
            .service
            .list_transactions(&id, Some(TransactionKind::Deposit))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_amount.amount(), dec!(1000.00));
    }

    #[tokio::test]
    async fn test_deposit_non_positive_fails_without_saving() {
        let fixture = setup(MockPriceSource::unavailable());
        let id = funded_portfolio(&fixture, dec!(1000)).await;
        let saves_before = fixture.repository.save_count();

        let result = fixture.service.deposit(&id, dec!(-5)).await;
        assert!(matches!(
            result,
            Err(Error::Portfolio(PortfolioError::InvalidAmount(_)))
        ));
        assert_eq!(fixture.repository.save_count(), saves_before);
    }

    #[tokio::test]
    async fn test_withdraw_beyond_balance_rolls_back() {
        let fixture = setup(MockPriceSource::unavailable());
        let id = funded_portfolio(&fixture, dec!(100)).await;
        let saves_before = fixture.repository.save_count();

        let result = fixture.service.withdraw(&id, dec!(100.01)).await;
        assert!(matches!(
            result,
            Err(Error::Portfolio(PortfolioError::InsufficientFunds(_)))
        ));
        assert_eq!(fixture.repository.save_count(), saves_before);
        assert_eq!(fixture.repository.stored(&id).balance().amount(), dec!(100.00));
    }

    #[tokio::test]
    async fn test_unknown_portfolio_is_not_found() {
        let fixture = setup(MockPriceSource::unavailable());
        let result = fixture.service.deposit("missing-id", dec!(10)).await;
        assert!(matches!(
            result,
            Err(Error::Portfolio(PortfolioError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_buy_resolves_market_price_and_records_purchase() {
        let fixture = setup(MockPriceSource::with_price("AAPL", dec!(100)));
        let id = funded_portfolio(&fixture, dec!(1000)).await;

        let updated = fixture.service.buy(&id, "aapl", 10).await.unwrap();

        assert!(updated.balance().is_zero());
        let ticker = Ticker::parse("AAPL").unwrap();
        assert_eq!(
            updated.holding(&ticker).unwrap().total_shares().get(),
            10
        );

        let records = fixture
            .service
            .list_transactions(&id, Some(TransactionKind::Buy))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ticker, Some(ticker));
        assert_eq!(records[0].unit_price.as_ref().unwrap().amount(), dec!(100.00));
        assert_eq!(records[0].total_amount.amount(), dec!(1000.00));
        assert_eq!(records[0].profit, None);
    }

    #[tokio::test]
    async fn test_buy_zero_quantity_fails_before_price_lookup() {
        let fixture = setup(MockPriceSource::with_price("AAPL", dec!(100)));
        let id = funded_portfolio(&fixture, dec!(1000)).await;

        let result = fixture.service.buy(&id, "AAPL", 0).await;
        assert!(matches!(
            result,
            Err(Error::Portfolio(PortfolioError::InvalidQuantity(_)))
        ));
        assert_eq!(fixture.price_source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_buy_with_unavailable_price_propagates_market_data_error() {
        let fixture = setup(MockPriceSource::unavailable());
        let id = funded_portfolio(&fixture, dec!(1000)).await;
        let saves_before = fixture.repository.save_count();

        let result = fixture.service.buy(&id, "AAPL", 10).await;
        assert!(matches!(result, Err(Error::MarketData(_))));
        assert_eq!(fixture.repository.save_count(), saves_before);
    }

    #[tokio::test]
    async fn test_sell_returns_result_and_records_profit() {
        let fixture = setup(MockPriceSource::with_price("AAPL", dec!(100)));
        let id = funded_portfolio(&fixture, dec!(1000)).await;
        fixture.service.buy(&id, "AAPL", 10).await.unwrap();

        let result = fixture.service.sell(&id, "AAPL", 4).await.unwrap();
        assert_eq!(result.proceeds.amount(), dec!(400.00));
        assert_eq!(result.cost_basis.amount(), dec!(400.00));
        assert_eq!(result.profit, dec!(0.00));

        let records = fixture
            .service
            .list_transactions(&id, Some(TransactionKind::Sell))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].profit, Some(dec!(0.00)));
        assert_eq!(records[0].quantity.unwrap().get(), 4);
    }

    #[tokio::test]
    async fn test_sell_unheld_ticker_fails_without_saving() {
        let fixture = setup(MockPriceSource::with_price("MSFT", dec!(50)));
        let id = funded_portfolio(&fixture, dec!(1000)).await;
        let saves_before = fixture.repository.save_count();

        let result = fixture.service.sell(&id, "MSFT", 1).await;
        assert!(matches!(
            result,
            Err(Error::Portfolio(PortfolioError::HoldingNotFound(_)))
        ));
        assert_eq!(fixture.repository.save_count(), saves_before);
    }

    #[tokio::test]
    async fn test_list_transactions_unknown_portfolio_is_not_found() {
        let fixture = setup(MockPriceSource::unavailable());
        let result = fixture.service.list_transactions("missing-id", None);
        assert!(matches!(
            result,
            Err(Error::Portfolio(PortfolioError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_list_transactions_preserves_append_order() {
        let fixture = setup(MockPriceSource::with_price("AAPL", dec!(100)));
        let id = funded_portfolio(&fixture, dec!(1000)).await;
        fixture.service.buy(&id, "AAPL", 5).await.unwrap();
        fixture.service.sell(&id, "AAPL", 2).await.unwrap();
        fixture.service.withdraw(&id, dec!(100)).await.unwrap();

        let kinds: Vec<TransactionKind> = fixture
            .service
            .list_transactions(&id, None)
            .unwrap()
            .into_iter()
            .map(|r| r.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TransactionKind::Deposit,
                TransactionKind::Buy,
                TransactionKind::Sell,
                TransactionKind::Withdrawal,
            ]
        );
    }
}
