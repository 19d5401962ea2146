use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::accounts::{accounts_constants as codes, AccountService, AccountServiceTrait};
use crate::fx::{Currency, FxService, NewExchangeRate};
use crate::fx::FxServiceTrait;
use crate::journal::{
    Actor, EntryStatus, EntryType, JournalEntry, JournalLine, JournalRepositoryTrait,
    JournalService, JournalServiceTrait,
};
use crate::ledger::{LedgerService, LedgerServiceTrait};
use crate::lots::LotService;
use crate::portfolio::{Portfolio, PortfolioRepositoryTrait};
use crate::storage::MemoryLedgerStore;
use crate::transactions::{Transaction, TransactionType};

struct Fixture {
    store: Arc<MemoryLedgerStore>,
    portfolio_id: String,
    accounts: Arc<AccountService>,
    journal: JournalService,
    ledger: LedgerService,
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
        fx,
        lots,
        store.clone(),
        store.clone(),
    );
    let ledger = LedgerService::new(store.clone(), store.clone());

    Fixture {
        store,
        portfolio_id,
        accounts,
        journal,
        ledger,
    }
}

impl Fixture {
    fn account_id(&self, code: &str) -> String {
        self.accounts.resolve(&self.portfolio_id, code).unwrap().id
    }

    fn post(&self, t: TransactionType, amount: Decimal, currency: &str, date: NaiveDate) {
        self.journal
            .post_transaction(&Transaction::new(
                &self.portfolio_id,
                t,
                date,
                amount,
                ccy(currency),
            ))
            .unwrap();
    }

    fn post_trade(
        &self,
        t: TransactionType,
        ticker: &str,
        quantity: Decimal,
        price: Decimal,
        date: NaiveDate,
    ) {
        let mut txn = Transaction::new(
            &self.portfolio_id,
            t,
            date,
            quantity * price,
            ccy("EUR"),
        );
        txn.ticker = Some(ticker.to_string());
        txn.quantity = Some(quantity);
        txn.price = Some(price);
        self.journal.post_transaction(&txn).unwrap();
    }
}

#[test]
fn trial_balance_always_balances() {
    let f = setup();
    f.post(TransactionType::Deposit, dec!(10000), "EUR", d(2024, 1, 2));
    f.post_trade(TransactionType::Buy, "ACME", dec!(100), dec!(10), d(2024, 1, 10));
    f.post_trade(TransactionType::Sell, "ACME", dec!(40), dec!(12), d(2024, 2, 10));
    f.post(TransactionType::Fee, dec!(9.95), "EUR", d(2024, 2, 11));

    let tb = f
        .ledger
        .trial_balance(&f.portfolio_id, d(2024, 12, 31))
        .unwrap();
    assert!(tb.is_balanced());
    assert!(tb.total_debits > Decimal::ZERO);

    let cash_row = tb
        .rows
        .iter()
        .find(|r| r.account_code == codes::CASH)
        .unwrap();
    // 10000 - 1000 + 480 - 9.95
    assert_eq!(cash_row.balance, dec!(9470.05));
}

#[test]
fn account_balance_is_reported_on_the_normal_side() {
    let f = setup();
    let mut dividend = Transaction::new(
        &f.portfolio_id,
        TransactionType::Dividend,
        d(2024, 3, 15),
        dec!(100),
        ccy("EUR"),
    );
    dividend.ticker = Some("ACME".to_string());
    f.journal.post_transaction(&dividend).unwrap();

    let income = f.account_id(codes::DIVIDEND_INCOME);
    // Credit-normal account reports a positive balance.
    assert_eq!(
        f.ledger.account_balance(&income, d(2024, 12, 31)).unwrap(),
        dec!(100.00)
    );
    // Debit-signed view is the mirror image.
    assert_eq!(
        f.ledger.debit_balance(&income, d(2024, 12, 31)).unwrap(),
        dec!(-100.00)
    );
}

#[test]
fn balances_are_cut_off_as_of_date() {
    let f = setup();
    f.post(TransactionType::Deposit, dec!(1000), "EUR", d(2024, 1, 2));
    f.post(TransactionType::Deposit, dec!(500), "EUR", d(2024, 6, 2));

    let cash = f.account_id(codes::CASH);
    assert_eq!(
        f.ledger.account_balance(&cash, d(2024, 3, 1)).unwrap(),
        dec!(1000.00)
    );
    assert_eq!(
        f.ledger.account_balance(&cash, d(2024, 12, 31)).unwrap(),
        dec!(1500.00)
    );
}

#[test]
fn balance_sheet_equation_holds() {
    let f = setup();
    f.post(TransactionType::Deposit, dec!(10000), "EUR", d(2024, 1, 2));
    f.post_trade(TransactionType::Buy, "ACME", dec!(100), dec!(10), d(2024, 1, 10));
    f.post_trade(TransactionType::Sell, "ACME", dec!(50), dec!(14), d(2024, 2, 10));
    f.post(TransactionType::Fee, dec!(25), "EUR", d(2024, 2, 11));

    let bs = f
        .ledger
        .balance_sheet(&f.portfolio_id, d(2024, 12, 31))
        .unwrap();
    assert_eq!(bs.equation_gap(), Decimal::ZERO);
    // 200 realized gain - 25 fee
    assert_eq!(bs.net_income, dec!(175.00));

    let total_weight: f64 = bs
        .assets
        .iter()
        .filter_map(|l| l.weight_pct)
        .sum();
    assert!((total_weight - 100.0).abs() < 0.01);
}

#[test]
fn income_statement_respects_the_period() {
    let f = setup();
    let mut dividend = Transaction::new(
        &f.portfolio_id,
        TransactionType::Dividend,
        d(2024, 1, 15),
        dec!(100),
        ccy("EUR"),
    );
    dividend.ticker = Some("ACME".to_string());
    f.journal.post_transaction(&dividend).unwrap();
    f.post(TransactionType::Fee, dec!(30), "EUR", d(2024, 2, 15));

    // February only: the January dividend is outside the window.
    let feb = f
        .ledger
        .income_statement(&f.portfolio_id, Some(d(2024, 1, 31)), d(2024, 2, 29))
        .unwrap();
    assert_eq!(feb.total_revenue, Decimal::ZERO);
    assert_eq!(feb.total_expenses, dec!(30.00));
    assert_eq!(feb.net_income, dec!(-30.00));

    // Whole year.
    let year = f
        .ledger
        .income_statement(&f.portfolio_id, None, d(2024, 12, 31))
        .unwrap();
    assert_eq!(year.total_revenue, dec!(100.00));
    assert_eq!(year.net_income, dec!(70.00));
}

#[test]
fn foreign_cash_positions_track_net_units_and_book_value() {
    let f = setup();
    // Receive 1000 USD (book 900 EUR), then spend 400 USD (book 360 EUR).
    f.post(TransactionType::Deposit, dec!(1000), "USD", d(2024, 1, 5));
    f.post(TransactionType::Withdrawal, dec!(400), "USD", d(2024, 2, 5));

    let positions = f
        .ledger
        .foreign_cash_positions(&f.portfolio_id, d(2024, 12, 31))
        .unwrap();
    let usd = positions.get(&ccy("USD")).unwrap();
    assert_eq!(usd.net_foreign, dec!(600));
    assert_eq!(usd.book_base, dec!(540.00));
}

#[test]
fn queries_reflect_posted_entries_only() {
    let f = setup();
    f.post(TransactionType::Deposit, dec!(1000), "EUR", d(2024, 1, 2));

    // A draft entry sitting in the store must be invisible to reads.
    let cash = f.account_id(codes::CASH);
    let capital = f.account_id(codes::OWNERS_CAPITAL);
    let mut draft = JournalEntry::assemble(
        &f.portfolio_id,
        f.store.next_entry_number(&f.portfolio_id).unwrap(),
        d(2024, 1, 3),
        EntryType::Transaction,
        "draft deposit",
        None,
        Actor::System,
        vec![
            JournalLine::debit(&cash, dec!(999), ccy("EUR")),
            JournalLine::credit(&capital, dec!(999), ccy("EUR")),
        ],
    )
    .unwrap();
    draft.status = EntryStatus::Draft;
    f.store.insert_entry(draft).unwrap();

    assert_eq!(
        f.ledger.account_balance(&cash, d(2024, 12, 31)).unwrap(),
        dec!(1000.00)
    );
    let tb = f
        .ledger
        .trial_balance(&f.portfolio_id, d(2024, 12, 31))
        .unwrap();
    assert_eq!(tb.total_debits, dec!(1000.00));
}
