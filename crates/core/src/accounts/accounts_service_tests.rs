use std::sync::Arc;

use crate::accounts::{accounts_constants as codes, AccountService, AccountServiceTrait, NormalBalance};
use crate::errors::Error;
use crate::fx::Currency;
use crate::portfolio::{Portfolio, PortfolioRepositoryTrait};
use crate::storage::MemoryLedgerStore;

fn setup() -> (Arc<AccountService>, String) {
    let store = Arc::new(MemoryLedgerStore::new());
    let portfolios: Arc<dyn PortfolioRepositoryTrait> = store.clone();
    let portfolio = Portfolio::new("Test Portfolio", Currency::new("EUR").unwrap());
    let portfolio_id = portfolio.id.clone();
    portfolios.insert(portfolio).unwrap();

    let service = Arc::new(AccountService::new(store.clone(), store));
    (service, portfolio_id)
}

#[test]
fn ensure_initialized_creates_the_canonical_set_once() {
    let (service, pid) = setup();
    service.ensure_initialized(&pid).unwrap();

    let first = service.list(&pid).unwrap();
    assert_eq!(first.len(), codes::CANONICAL_ACCOUNTS.len());

    // Re-invocation is a no-op, not a duplicate set.
    service.ensure_initialized(&pid).unwrap();
    let second = service.list(&pid).unwrap();
    assert_eq!(second.len(), first.len());

    let cash = service.resolve(&pid, codes::CASH).unwrap();
    assert_eq!(cash.name, "Cash");
    assert_eq!(cash.normal_balance, NormalBalance::Debit);
    assert!(cash.is_system);

    let realized = service.resolve(&pid, codes::REALIZED_GAIN_LOSS).unwrap();
    assert_eq!(realized.normal_balance, NormalBalance::Credit);
}

#[test]
fn resolve_fails_loudly_for_unknown_codes() {
    let (service, pid) = setup();
    service.ensure_initialized(&pid).unwrap();

    let err = service.resolve(&pid, "9999").unwrap_err();
    assert!(matches!(
        err,
        Error::AccountNotFound { ref code, .. } if code == "9999"
    ));
}

#[test]
fn initialization_requires_an_existing_portfolio() {
    let (service, _pid) = setup();
    assert!(matches!(
        service.ensure_initialized("no-such-portfolio"),
        Err(Error::PortfolioNotFound(_))
    ));
}
