//! Round-trip tests for the portfolio repository: full aggregate
//! persistence, FIFO lot order across reloads, and ledger coupling.

mod common;

use rust_decimal_macros::dec;

use folioledger_core::errors::Error;
use folioledger_core::money::{Money, Price};
use folioledger_core::portfolios::{
    Portfolio, PortfolioError, PortfolioRepositoryTrait, ShareQuantity, Ticker,
};
use folioledger_core::transactions::{
    NewTransactionRecord, TransactionKind, TransactionLogTrait,
};

use common::TestDb;

fn usd(amount: rust_decimal::Decimal) -> Money {
    Money::new(amount, "USD").unwrap()
}

fn price(amount: rust_decimal::Decimal) -> Price {
    Price::new(amount, "USD").unwrap()
}

async fn create_funded(
    repository: &impl PortfolioRepositoryTrait,
    amount: rust_decimal::Decimal,
) -> String {
    let portfolio = Portfolio::create("Alice", "USD").unwrap();
    let id = portfolio.id().to_string();
    repository.create(portfolio).await.unwrap();

    let mut lease = repository.acquire_exclusive(&id).await.unwrap();
    lease.deposit(&usd(amount)).unwrap();
    let entry = NewTransactionRecord::deposit(&id, usd(amount));
    repository.save(lease, entry).await.unwrap();
    id
}

#[tokio::test]
async fn test_create_and_get_round_trip() {
    let db = TestDb::new();
    let repository = db.portfolio_repository();

    let portfolio = Portfolio::create("Alice", "USD").unwrap();
    let id = portfolio.id().to_string();
    repository.create(portfolio).await.unwrap();

    let loaded = repository.get_by_id(&id).unwrap();
    assert_eq!(loaded.id(), id);
    assert_eq!(loaded.owner_name(), "Alice");
    assert!(loaded.balance().is_zero());
    assert_eq!(loaded.holdings().count(), 0);
}

#[tokio::test]
async fn test_get_unknown_id_is_not_found() {
    let db = TestDb::new();
    let repository = db.portfolio_repository();

    let result = repository.get_by_id("no-such-id");
    assert!(matches!(
        result,
        Err(Error::Portfolio(PortfolioError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_acquire_exclusive_unknown_id_is_not_found() {
    let db = TestDb::new();
    let repository = db.portfolio_repository();

    let result = repository.acquire_exclusive("no-such-id").await;
    assert!(matches!(
        result,
        Err(Error::Portfolio(PortfolioError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_save_persists_holdings_and_lot_order() {
    let db = TestDb::new();
    let repository = db.portfolio_repository();
    let id = create_funded(&repository, dec!(1600)).await;
    let aapl = Ticker::parse("AAPL").unwrap();

    // Two buys in one leased sequence; the ledger gets the second one.
    let mut lease = repository.acquire_exclusive(&id).await.unwrap();
    lease.buy(&aapl, ShareQuantity::new(10), price(dec!(100))).unwrap();
    let total = lease.buy(&aapl, ShareQuantity::new(5), price(dec!(120))).unwrap();
    let entry = NewTransactionRecord::buy(
        &id,
        aapl.clone(),
        ShareQuantity::new(5),
        price(dec!(120)),
        total,
    );
    repository.save(lease, entry).await.unwrap();

    let loaded = repository.get_by_id(&id).unwrap();
    assert_eq!(loaded.balance(), &usd(dec!(0)));
    let holding = loaded.holding(&aapl).unwrap();
    assert_eq!(holding.total_shares(), ShareQuantity::new(15));
    assert_eq!(holding.lots().len(), 2);
    // Purchase order must survive the round trip - it is the FIFO order.
    assert_eq!(holding.lots()[0].unit_price(), &price(dec!(100)));
    assert_eq!(holding.lots()[1].unit_price(), &price(dec!(120)));
}

#[tokio::test]
async fn test_exhausted_lots_survive_reload() {
    let db = TestDb::new();
    let repository = db.portfolio_repository();
    let id = create_funded(&repository, dec!(1600)).await;
    let aapl = Ticker::parse("AAPL").unwrap();

    let mut lease = repository.acquire_exclusive(&id).await.unwrap();
    lease.buy(&aapl, ShareQuantity::new(10), price(dec!(100))).unwrap();
    lease.buy(&aapl, ShareQuantity::new(5), price(dec!(120))).unwrap();
    let result = lease.sell(&aapl, ShareQuantity::new(12), price(dec!(110))).unwrap();
    assert_eq!(result.profit, dec!(80.00));
    let entry = NewTransactionRecord::sell(
        &id,
        aapl.clone(),
        ShareQuantity::new(12),
        price(dec!(110)),
        &result,
    );
    repository.save(lease, entry).await.unwrap();

    let loaded = repository.get_by_id(&id).unwrap();
    let holding = loaded.holding(&aapl).unwrap();
    // The drained first lot is retained, not pruned.
    assert_eq!(holding.lots().len(), 2);
    assert_eq!(holding.lots()[0].remaining(), ShareQuantity::new(0));
    assert_eq!(holding.lots()[0].initial(), ShareQuantity::new(10));
    assert_eq!(holding.lots()[1].remaining(), ShareQuantity::new(3));
}

#[tokio::test]
async fn test_dropped_lease_persists_nothing() {
    let db = TestDb::new();
    let repository = db.portfolio_repository();
    let id = create_funded(&repository, dec!(1000)).await;

    {
        let mut lease = repository.acquire_exclusive(&id).await.unwrap();
        lease.withdraw(&usd(dec!(400))).unwrap();
        // Dropped without save: rollback.
    }

    let loaded = repository.get_by_id(&id).unwrap();
    assert_eq!(loaded.balance(), &usd(dec!(1000)));

    // And the lock was released - the next lease can be taken.
    let lease = repository.acquire_exclusive(&id).await.unwrap();
    drop(lease);
}

#[tokio::test]
async fn test_save_appends_ledger_record_atomically() {
    let db = TestDb::new();
    let repository = db.portfolio_repository();
    let ledger = db.transaction_log();
    let id = create_funded(&repository, dec!(1000)).await;

    let mut lease = repository.acquire_exclusive(&id).await.unwrap();
    lease.withdraw(&usd(dec!(250))).unwrap();
    let entry = NewTransactionRecord::withdrawal(&id, usd(dec!(250)));
    let record = repository.save(lease, entry).await.unwrap();

    assert_eq!(record.kind, TransactionKind::Withdrawal);
    assert_eq!(record.total_amount, usd(dec!(250)));

    let all = ledger.list_by_portfolio(&id, None).unwrap();
    assert_eq!(all.len(), 2); // funding deposit + withdrawal
    assert_eq!(all[0].kind, TransactionKind::Deposit);
    assert_eq!(all[1].kind, TransactionKind::Withdrawal);
    assert_eq!(all[1].id, record.id);

    let withdrawals = ledger
        .list_by_portfolio(&id, Some(TransactionKind::Withdrawal))
        .unwrap();
    assert_eq!(withdrawals.len(), 1);
}

#[tokio::test]
async fn test_sell_record_round_trips_profit() {
    let db = TestDb::new();
    let repository = db.portfolio_repository();
    let ledger = db.transaction_log();
    let id = create_funded(&repository, dec!(1000)).await;
    let aapl = Ticker::parse("AAPL").unwrap();

    let mut lease = repository.acquire_exclusive(&id).await.unwrap();
    lease.buy(&aapl, ShareQuantity::new(10), price(dec!(100))).unwrap();
    let result = lease.sell(&aapl, ShareQuantity::new(10), price(dec!(90))).unwrap();
    let entry = NewTransactionRecord::sell(
        &id,
        aapl.clone(),
        ShareQuantity::new(10),
        price(dec!(90)),
        &result,
    );
    repository.save(lease, entry).await.unwrap();

    let sells = ledger
        .list_by_portfolio(&id, Some(TransactionKind::Sell))
        .unwrap();
    assert_eq!(sells.len(), 1);
    assert_eq!(sells[0].profit, Some(dec!(-100.00)));
    assert_eq!(sells[0].ticker, Some(aapl));
    assert_eq!(sells[0].quantity, Some(ShareQuantity::new(10)));
}

#[tokio::test]
async fn test_list_returns_all_aggregates() {
    let db = TestDb::new();
    let repository = db.portfolio_repository();

    let first = Portfolio::create("Alice", "USD").unwrap();
    let second = Portfolio::create("Bob", "USD").unwrap();
    repository.create(first).await.unwrap();
    repository.create(second).await.unwrap();

    let all = repository.list().unwrap();
    assert_eq!(all.len(), 2);
}
