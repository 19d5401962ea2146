use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::accounts::{accounts_constants as codes, AccountService, AccountServiceTrait};
use crate::errors::Error;
use crate::fx::{Currency, FxService, FxServiceTrait, NewExchangeRate};
use crate::journal::{EntryType, JournalService, JournalServiceTrait};
use crate::ledger::{LedgerService, LedgerServiceTrait};
use crate::lots::LotService;
use crate::portfolio::{Portfolio, PortfolioRepositoryTrait};
use crate::storage::MemoryLedgerStore;
use crate::transactions::{Transaction, TransactionType};
use crate::valuation::{ValuationError, ValuationService, ValuationServiceTrait};
use ledgerfolio_market_data::ManualQuoteProvider;

struct Fixture {
    portfolio_id: String,
    accounts: Arc<AccountService>,
    fx: Arc<FxService>,
    journal: JournalService,
    ledger: Arc<LedgerService>,
    valuation: ValuationService,
    provider: Arc<ManualQuoteProvider>,
}

fn ccy(code: &str) -> Currency {
    Currency::new(code).unwrap()
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn setup() -> Fixture {
    let store = Arc::new(MemoryLedgerStore::new());

    let portfolios: Arc<dyn PortfolioRepositoryTrait> = store.clone();
    let portfolio = Portfolio::new("Test Portfolio", ccy("EUR"));
    let portfolio_id = portfolio.id.clone();
    portfolios.insert(portfolio).unwrap();

    let accounts = Arc::new(AccountService::new(store.clone(), store.clone()));
    accounts.ensure_initialized(&portfolio_id).unwrap();

    let fx = Arc::new(FxService::new(store.clone()));
    fx.add_rate(NewExchangeRate {
        from_currency: ccy("USD"),
        to_currency: ccy("EUR"),
        rate: dec!(0.90),
        date: d(2024, 1, 1),
    })
    .unwrap();

    let lots = Arc::new(LotService::new(store.clone()));
    let journal = JournalService::new(
        accounts.clone(),
        fx.clone(),
        lots,
        store.clone(),
        store.clone(),
    );
    let ledger = Arc::new(LedgerService::new(store.clone(), store.clone()));
    let provider = Arc::new(ManualQuoteProvider::new());
    let valuation = ValuationService::new(
        accounts.clone(),
        fx.clone(),
        store.clone(),
        store.clone(),
        ledger.clone(),
        store.clone(),
        provider.clone(),
    );

    Fixture {
        portfolio_id,
        accounts,
        fx,
        journal,
        ledger,
        valuation,
        provider,
    }
}

impl Fixture {
    fn account_id(&self, code: &str) -> String {
        self.accounts.resolve(&self.portfolio_id, code).unwrap().id
    }

    fn buy(&self, ticker: &str, quantity: Decimal, price: Decimal, date: NaiveDate) {
        let mut txn = Transaction::new(
            &self.portfolio_id,
            TransactionType::Buy,
            date,
            quantity * price,
            ccy("EUR"),
        );
        txn.ticker = Some(ticker.to_string());
        txn.quantity = Some(quantity);
        txn.price = Some(price);
        self.journal.post_transaction(&txn).unwrap();
    }

    fn sell(&self, ticker: &str, quantity: Decimal, price: Decimal, date: NaiveDate) {
        let mut txn = Transaction::new(
            &self.portfolio_id,
            TransactionType::Sell,
            date,
            quantity * price,
            ccy("EUR"),
        );
        txn.ticker = Some(ticker.to_string());
        txn.quantity = Some(quantity);
        txn.price = Some(price);
        self.journal.post_transaction(&txn).unwrap();
    }

    fn balance(&self, code: &str, as_of: NaiveDate) -> Decimal {
        self.ledger
            .account_balance(&self.account_id(code), as_of)
            .unwrap()
    }

    fn debit_balance(&self, code: &str, as_of: NaiveDate) -> Decimal {
        self.ledger
            .debit_balance(&self.account_id(code), as_of)
            .unwrap()
    }
}

#[tokio::test]
async fn buy_mark_sell_keeps_cumulative_pnl_consistent() {
    let f = setup();

    // Buy 100 units at 0.90: cost basis 90.
    f.buy("ACME", dec!(100), dec!(0.90), d(2024, 1, 10));

    // Price rises so fair value is 100: unrealized gain of 10.
    f.provider.set_price("ACME", d(2024, 2, 1), dec!(1.00), "EUR");
    let entry = f
        .valuation
        .revalue_securities(&f.portfolio_id, d(2024, 2, 1))
        .await
        .unwrap()
        .expect("first revaluation posts");
    assert_eq!(entry.entry_type, EntryType::Adjustment);
    assert!(entry.is_balanced());
    assert_eq!(f.debit_balance(codes::FAIR_VALUE_ADJUSTMENT, d(2024, 2, 1)), dec!(10.00));
    assert_eq!(f.balance(codes::UNREALIZED_GAIN_LOSS, d(2024, 2, 1)), dec!(10.00));

    // Same prices again: idempotent, nothing to post.
    let second = f
        .valuation
        .revalue_securities(&f.portfolio_id, d(2024, 2, 2))
        .await
        .unwrap();
    assert!(second.is_none());
    assert_eq!(f.debit_balance(codes::FAIR_VALUE_ADJUSTMENT, d(2024, 2, 2)), dec!(10.00));

    // Sell everything at fair value: realized gain 10.
    f.sell("ACME", dec!(100), dec!(1.00), d(2024, 3, 1));
    assert_eq!(f.balance(codes::REALIZED_GAIN_LOSS, d(2024, 3, 1)), dec!(10.00));

    // Follow-up revaluation unwinds the stale adjustment to zero.
    let reversal = f
        .valuation
        .revalue_securities(&f.portfolio_id, d(2024, 3, 2))
        .await
        .unwrap()
        .expect("reversal posts");
    assert!(reversal.is_balanced());
    assert_eq!(f.debit_balance(codes::FAIR_VALUE_ADJUSTMENT, d(2024, 3, 2)), Decimal::ZERO);
    assert_eq!(f.balance(codes::UNREALIZED_GAIN_LOSS, d(2024, 3, 2)), Decimal::ZERO);
    assert_eq!(f.balance(codes::REALIZED_GAIN_LOSS, d(2024, 3, 2)), dec!(10.00));

    let tb = f
        .ledger
        .trial_balance(&f.portfolio_id, d(2024, 12, 31))
        .unwrap();
    assert!(tb.is_balanced());
}

#[tokio::test]
async fn revaluation_posts_only_the_incremental_delta() {
    let f = setup();
    f.buy("ACME", dec!(20), dec!(10), d(2024, 1, 10));

    f.provider.set_price("ACME", d(2024, 2, 1), dec!(12), "EUR");
    f.valuation
        .revalue_securities(&f.portfolio_id, d(2024, 2, 1))
        .await
        .unwrap()
        .expect("first delta posts");
    assert_eq!(f.debit_balance(codes::FAIR_VALUE_ADJUSTMENT, d(2024, 2, 1)), dec!(40.00));

    f.provider.set_price("ACME", d(2024, 3, 1), dec!(13), "EUR");
    let entry = f
        .valuation
        .revalue_securities(&f.portfolio_id, d(2024, 3, 1))
        .await
        .unwrap()
        .expect("second delta posts");

    // Only 20 more, not the full 60.
    assert_eq!(entry.total_debits(), dec!(20.00));
    assert_eq!(f.debit_balance(codes::FAIR_VALUE_ADJUSTMENT, d(2024, 3, 1)), dec!(60.00));
}

#[tokio::test]
async fn unrealized_losses_post_on_the_debit_side() {
    let f = setup();
    f.buy("ACME", dec!(10), dec!(10), d(2024, 1, 10));

    f.provider.set_price("ACME", d(2024, 2, 1), dec!(8), "EUR");
    f.valuation
        .revalue_securities(&f.portfolio_id, d(2024, 2, 1))
        .await
        .unwrap()
        .expect("loss posts");

    assert_eq!(f.debit_balance(codes::FAIR_VALUE_ADJUSTMENT, d(2024, 2, 1)), dec!(-20.00));
    // Credit-normal account carries a negative balance for a net loss.
    assert_eq!(f.balance(codes::UNREALIZED_GAIN_LOSS, d(2024, 2, 1)), dec!(-20.00));
}

#[tokio::test]
async fn sub_materiality_security_delta_is_skipped() {
    let f = setup();
    f.buy("ACME", dec!(1), dec!(10), d(2024, 1, 10));

    f.provider.set_price("ACME", d(2024, 2, 1), dec!(10.004), "EUR");
    let skipped = f
        .valuation
        .revalue_securities(&f.portfolio_id, d(2024, 2, 1))
        .await
        .unwrap();
    assert!(skipped.is_none());

    f.provider.set_price("ACME", d(2024, 3, 1), dec!(10.02), "EUR");
    let posted = f
        .valuation
        .revalue_securities(&f.portfolio_id, d(2024, 3, 1))
        .await
        .unwrap();
    assert!(posted.is_some());
    assert_eq!(f.debit_balance(codes::FAIR_VALUE_ADJUSTMENT, d(2024, 3, 1)), dec!(0.02));
}

#[tokio::test]
async fn foreign_security_is_valued_at_current_fx_rate() {
    let f = setup();
    // 10 shares at 100 USD, purchase rate 0.90: cost basis 900 EUR.
    let mut txn = Transaction::new(
        &f.portfolio_id,
        TransactionType::Buy,
        d(2024, 1, 10),
        dec!(1000),
        ccy("USD"),
    );
    txn.ticker = Some("AAPL".to_string());
    txn.quantity = Some(dec!(10));
    txn.price = Some(dec!(100));
    f.journal.post_transaction(&txn).unwrap();

    // Price flat at 100 USD but the dollar strengthens to 0.95.
    f.fx.add_rate(NewExchangeRate {
        from_currency: ccy("USD"),
        to_currency: ccy("EUR"),
        rate: dec!(0.95),
        date: d(2024, 2, 1),
    })
    .unwrap();
    f.provider.set_price("AAPL", d(2024, 2, 1), dec!(100), "USD");

    f.valuation
        .revalue_securities(&f.portfolio_id, d(2024, 2, 1))
        .await
        .unwrap()
        .expect("fx-driven gain posts");

    // Fair value 10 x 100 x 0.95 = 950 against cost 900.
    assert_eq!(f.debit_balance(codes::FAIR_VALUE_ADJUSTMENT, d(2024, 2, 1)), dec!(50.00));
}

#[tokio::test]
async fn open_position_without_any_price_fails_loudly() {
    let f = setup();
    f.buy("ACME", dec!(10), dec!(10), d(2024, 1, 10));

    let err = f
        .valuation
        .revalue_securities(&f.portfolio_id, d(2024, 2, 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Valuation(ValuationError::NoPricesAvailable { .. })
    ));
}

#[test]
fn currency_revaluation_posts_delta_then_goes_quiet() {
    let f = setup();
    // 1000 USD booked at 0.90 = 900 EUR.
    f.journal
        .post_transaction(&Transaction::new(
            &f.portfolio_id,
            TransactionType::Deposit,
            d(2024, 1, 5),
            dec!(1000),
            ccy("USD"),
        ))
        .unwrap();

    f.fx.add_rate(NewExchangeRate {
        from_currency: ccy("USD"),
        to_currency: ccy("EUR"),
        rate: dec!(0.95),
        date: d(2024, 6, 1),
    })
    .unwrap();

    let entry = f
        .valuation
        .revalue_currency(&f.portfolio_id, d(2024, 6, 2))
        .unwrap()
        .expect("fx delta posts");
    assert!(entry.is_balanced());
    assert_eq!(entry.total_debits(), dec!(50.00));
    assert_eq!(f.balance(codes::CASH, d(2024, 6, 2)), dec!(950.00));
    assert_eq!(f.balance(codes::FX_GAIN_LOSS, d(2024, 6, 2)), dec!(50.00));

    // Unchanged rate: the book value already matches, nothing to post.
    let second = f
        .valuation
        .revalue_currency(&f.portfolio_id, d(2024, 6, 3))
        .unwrap();
    assert!(second.is_none());
}

#[test]
fn sub_materiality_fx_delta_is_skipped() {
    let f = setup();
    f.journal
        .post_transaction(&Transaction::new(
            &f.portfolio_id,
            TransactionType::Deposit,
            d(2024, 1, 5),
            dec!(1000),
            ccy("USD"),
        ))
        .unwrap();

    // Delta of 0.005 base units: below threshold, no entry.
    f.fx.add_rate(NewExchangeRate {
        from_currency: ccy("USD"),
        to_currency: ccy("EUR"),
        rate: dec!(0.900005),
        date: d(2024, 2, 1),
    })
    .unwrap();
    assert!(f
        .valuation
        .revalue_currency(&f.portfolio_id, d(2024, 2, 2))
        .unwrap()
        .is_none());

    // Delta of 0.02: posts.
    f.fx.add_rate(NewExchangeRate {
        from_currency: ccy("USD"),
        to_currency: ccy("EUR"),
        rate: dec!(0.90002),
        date: d(2024, 3, 1),
    })
    .unwrap();
    let entry = f
        .valuation
        .revalue_currency(&f.portfolio_id, d(2024, 3, 2))
        .unwrap()
        .expect("material delta posts");
    assert_eq!(entry.total_debits(), dec!(0.02));
}

#[test]
fn conversion_spread_is_swept_into_fx_gain_loss() {
    let f = setup();
    // Deliver 100 EUR for 108 USD worth 97.20: 2.80 spread in clearing.
    let mut conversion = Transaction::new(
        &f.portfolio_id,
        TransactionType::Conversion,
        d(2024, 2, 1),
        dec!(108),
        ccy("USD"),
    );
    conversion.conversion_from_amount = Some(dec!(100));
    conversion.conversion_from_currency = Some(ccy("EUR"));
    f.journal.post_transaction(&conversion).unwrap();
    assert_eq!(
        f.debit_balance(codes::CURRENCY_EXCHANGE_CLEARING, d(2024, 2, 1)),
        dec!(2.80)
    );

    let entry = f
        .valuation
        .revalue_currency(&f.portfolio_id, d(2024, 2, 2))
        .unwrap()
        .expect("sweep posts");
    assert!(entry.is_balanced());

    // Clearing emptied; the spread is a realized FX loss.
    assert_eq!(
        f.debit_balance(codes::CURRENCY_EXCHANGE_CLEARING, d(2024, 2, 2)),
        Decimal::ZERO
    );
    assert_eq!(f.balance(codes::FX_GAIN_LOSS, d(2024, 2, 2)), dec!(-2.80));

    // Nothing left to sweep or revalue.
    assert!(f
        .valuation
        .revalue_currency(&f.portfolio_id, d(2024, 2, 3))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn portfolio_with_no_activity_revalues_to_nothing() {
    let f = setup();
    assert!(f
        .valuation
        .revalue_securities(&f.portfolio_id, d(2024, 2, 1))
        .await
        .unwrap()
        .is_none());
    assert!(f
        .valuation
        .revalue_currency(&f.portfolio_id, d(2024, 2, 1))
        .unwrap()
        .is_none());
}
