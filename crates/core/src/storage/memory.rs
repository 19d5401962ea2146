//! In-memory ledger store.
//!
//! Implements every repository trait with the semantics the accounting
//! core requires: insert-only tables (lot consumption and split rescaling
//! are the only sanctioned mutations), a per-portfolio posting lock with a
//! monotonic entry-number sequence, and version-checked import-batch
//! updates. The services only ever see the traits, so a durable backend
//! can replace this store without touching them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::accounts::{AccountRepositoryTrait, ChartAccount};
use crate::errors::{Error, Result};
use crate::fx::{ExchangeRate, FxRepositoryTrait};
use crate::imports::{ImportBatch, ImportError, ImportRepositoryTrait};
use crate::journal::{EntryStatus, JournalEntry, JournalLine, JournalRepositoryTrait};
use crate::lots::{LotError, LotRepositoryTrait, SecurityAllocation, SecurityLot};
use crate::portfolio::{Portfolio, PortfolioRepositoryTrait};

#[derive(Default)]
struct Tables {
    portfolios: HashMap<String, Portfolio>,
    accounts: Vec<ChartAccount>,
    entries: Vec<JournalEntry>,
    lots: Vec<SecurityLot>,
    allocations: Vec<SecurityAllocation>,
    rates: Vec<ExchangeRate>,
    batches: HashMap<String, ImportBatch>,
    entry_sequences: HashMap<String, i64>,
}

/// Shared in-memory store. Cheap to clone via `Arc`; every service holds
/// it through the repository trait it needs.
#[derive(Default)]
pub struct MemoryLedgerStore {
    tables: RwLock<Tables>,
    posting_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| Error::Storage(format!("store lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| Error::Storage(format!("store lock poisoned: {}", e)))
    }
}

impl PortfolioRepositoryTrait for MemoryLedgerStore {
    fn insert(&self, portfolio: Portfolio) -> Result<Portfolio> {
        let mut tables = self.write()?;
        if tables.portfolios.contains_key(&portfolio.id) {
            return Err(Error::Storage(format!(
                "portfolio {} already exists",
                portfolio.id
            )));
        }
        tables
            .portfolios
            .insert(portfolio.id.clone(), portfolio.clone());
        Ok(portfolio)
    }

    fn get_by_id(&self, portfolio_id: &str) -> Result<Portfolio> {
        self.read()?
            .portfolios
            .get(portfolio_id)
            .cloned()
            .ok_or_else(|| Error::PortfolioNotFound(portfolio_id.to_string()))
    }

    fn list(&self) -> Result<Vec<Portfolio>> {
        Ok(self.read()?.portfolios.values().cloned().collect())
    }
}

impl AccountRepositoryTrait for MemoryLedgerStore {
    fn insert(&self, account: ChartAccount) -> Result<ChartAccount> {
        let mut tables = self.write()?;
        let duplicate = tables
            .accounts
            .iter()
            .any(|a| a.portfolio_id == account.portfolio_id && a.code == account.code);
        if duplicate {
            return Err(Error::Storage(format!(
                "account code {} already exists in portfolio {}",
                account.code, account.portfolio_id
            )));
        }
        tables.accounts.push(account.clone());
        Ok(account)
    }

    fn find_by_code(&self, portfolio_id: &str, code: &str) -> Result<Option<ChartAccount>> {
        Ok(self
            .read()?
            .accounts
            .iter()
            .find(|a| a.portfolio_id == portfolio_id && a.code == code)
            .cloned())
    }

    fn get_by_id(&self, account_id: &str) -> Result<ChartAccount> {
        self.read()?
            .accounts
            .iter()
            .find(|a| a.id == account_id)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("account {} not found", account_id)))
    }

    fn list_for_portfolio(&self, portfolio_id: &str) -> Result<Vec<ChartAccount>> {
        Ok(self
            .read()?
            .accounts
            .iter()
            .filter(|a| a.portfolio_id == portfolio_id)
            .cloned()
            .collect())
    }
}

impl FxRepositoryTrait for MemoryLedgerStore {
    fn get_all_rates(&self) -> Result<Vec<ExchangeRate>> {
        Ok(self.read()?.rates.clone())
    }

    fn insert_rate(&self, rate: ExchangeRate) -> Result<ExchangeRate> {
        self.write()?.rates.push(rate.clone());
        Ok(rate)
    }
}

impl JournalRepositoryTrait for MemoryLedgerStore {
    fn posting_lock(&self, portfolio_id: &str) -> Arc<Mutex<()>> {
        let mut locks = match self.posting_locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(
            locks
                .entry(portfolio_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    fn next_entry_number(&self, portfolio_id: &str) -> Result<i64> {
        let mut tables = self.write()?;
        let sequence = tables
            .entry_sequences
            .entry(portfolio_id.to_string())
            .or_insert(0);
        *sequence += 1;
        Ok(*sequence)
    }

    fn insert_entry(&self, entry: JournalEntry) -> Result<JournalEntry> {
        // Store-level re-check of the load-bearing invariant; an
        // unbalanced entry must not exist in Posted state.
        if entry.status == EntryStatus::Posted {
            entry.ensure_balanced()?;
        }

        let mut tables = self.write()?;
        let duplicate = tables.entries.iter().any(|e| {
            e.portfolio_id == entry.portfolio_id && e.entry_number == entry.entry_number
        });
        if duplicate {
            return Err(Error::Storage(format!(
                "entry number {} already used in portfolio {}",
                entry.entry_number, entry.portfolio_id
            )));
        }
        tables.entries.push(entry.clone());
        Ok(entry)
    }

    fn get_entry(&self, entry_id: &str) -> Result<JournalEntry> {
        self.read()?
            .entries
            .iter()
            .find(|e| e.id == entry_id)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("journal entry {} not found", entry_id)))
    }

    fn entries_for_portfolio(&self, portfolio_id: &str) -> Result<Vec<JournalEntry>> {
        let mut entries: Vec<JournalEntry> = self
            .read()?
            .entries
            .iter()
            .filter(|e| e.portfolio_id == portfolio_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.entry_number);
        Ok(entries)
    }

    fn posted_lines_for_account(
        &self,
        account_id: &str,
        from: Option<NaiveDate>,
        to: NaiveDate,
    ) -> Result<Vec<JournalLine>> {
        let tables = self.read()?;
        let mut lines = Vec::new();
        for entry in &tables.entries {
            if entry.status != EntryStatus::Posted || entry.entry_date > to {
                continue;
            }
            if let Some(from) = from {
                if entry.entry_date <= from {
                    continue;
                }
            }
            for line in &entry.lines {
                if line.account_id == account_id {
                    lines.push(line.clone());
                }
            }
        }
        Ok(lines)
    }
}

impl LotRepositoryTrait for MemoryLedgerStore {
    fn insert_lot(&self, lot: SecurityLot) -> Result<SecurityLot> {
        self.write()?.lots.push(lot.clone());
        Ok(lot)
    }

    fn insert_allocation(&self, allocation: SecurityAllocation) -> Result<SecurityAllocation> {
        self.write()?.allocations.push(allocation.clone());
        Ok(allocation)
    }

    fn get_lot(&self, lot_id: &str) -> Result<SecurityLot> {
        self.read()?
            .lots
            .iter()
            .find(|l| l.id == lot_id)
            .cloned()
            .ok_or_else(|| LotError::LotNotFound(lot_id.to_string()).into())
    }

    fn open_lots(&self, portfolio_id: &str, ticker: &str) -> Result<Vec<SecurityLot>> {
        // Table order is insertion order, so a stable sort by purchase
        // date yields FIFO with insertion-order tie-breaking.
        let mut lots: Vec<SecurityLot> = self
            .read()?
            .lots
            .iter()
            .filter(|l| l.portfolio_id == portfolio_id && l.ticker == ticker && l.is_open())
            .cloned()
            .collect();
        lots.sort_by_key(|l| l.purchase_date);
        Ok(lots)
    }

    fn open_lots_for_portfolio(&self, portfolio_id: &str) -> Result<Vec<SecurityLot>> {
        let mut lots: Vec<SecurityLot> = self
            .read()?
            .lots
            .iter()
            .filter(|l| l.portfolio_id == portfolio_id && l.is_open())
            .cloned()
            .collect();
        lots.sort_by(|a, b| {
            a.ticker
                .cmp(&b.ticker)
                .then(a.purchase_date.cmp(&b.purchase_date))
        });
        Ok(lots)
    }

    fn lots_for_ticker(&self, portfolio_id: &str, ticker: &str) -> Result<Vec<SecurityLot>> {
        Ok(self
            .read()?
            .lots
            .iter()
            .filter(|l| l.portfolio_id == portfolio_id && l.ticker == ticker)
            .cloned()
            .collect())
    }

    fn allocations_for_sell(&self, sell_transaction_id: &str) -> Result<Vec<SecurityAllocation>> {
        Ok(self
            .read()?
            .allocations
            .iter()
            .filter(|a| a.sell_transaction_id == sell_transaction_id)
            .cloned()
            .collect())
    }

    fn reduce_lot(&self, lot_id: &str, new_remaining: Decimal, closed: bool) -> Result<()> {
        let mut tables = self.write()?;
        let lot = tables
            .lots
            .iter_mut()
            .find(|l| l.id == lot_id)
            .ok_or_else(|| Error::from(LotError::LotNotFound(lot_id.to_string())))?;

        if new_remaining < Decimal::ZERO || new_remaining > lot.remaining_quantity {
            return Err(Error::Storage(format!(
                "lot {} remaining quantity may only decrease ({} -> {})",
                lot_id, lot.remaining_quantity, new_remaining
            )));
        }
        lot.remaining_quantity = new_remaining;
        lot.closed = closed;
        Ok(())
    }

    fn apply_split_to_lot(
        &self,
        lot_id: &str,
        original_quantity: Decimal,
        remaining_quantity: Decimal,
        cost_per_share_foreign: Decimal,
        cost_per_share_base: Decimal,
    ) -> Result<()> {
        let mut tables = self.write()?;
        let lot = tables
            .lots
            .iter_mut()
            .find(|l| l.id == lot_id)
            .ok_or_else(|| Error::from(LotError::LotNotFound(lot_id.to_string())))?;

        lot.original_quantity = original_quantity;
        lot.remaining_quantity = remaining_quantity;
        lot.cost_per_share_foreign = cost_per_share_foreign;
        lot.cost_per_share_base = cost_per_share_base;
        Ok(())
    }
}

impl ImportRepositoryTrait for MemoryLedgerStore {
    fn insert_batch(&self, batch: ImportBatch) -> Result<ImportBatch> {
        self.write()?.batches.insert(batch.id.clone(), batch.clone());
        Ok(batch)
    }

    fn get_batch(&self, batch_id: &str) -> Result<ImportBatch> {
        self.read()?
            .batches
            .get(batch_id)
            .cloned()
            .ok_or_else(|| ImportError::BatchNotFound(batch_id.to_string()).into())
    }

    fn update_batch(&self, batch: ImportBatch, expected_version: u64) -> Result<ImportBatch> {
        let mut tables = self.write()?;
        let stored = tables
            .batches
            .get_mut(&batch.id)
            .ok_or_else(|| Error::from(ImportError::BatchNotFound(batch.id.clone())))?;

        if stored.version != expected_version {
            return Err(ImportError::StaleVersion {
                batch_id: batch.id.clone(),
                expected: expected_version,
                actual: stored.version,
            }
            .into());
        }

        let mut updated = batch;
        updated.version = expected_version + 1;
        *stored = updated.clone();
        Ok(updated)
    }

    fn batches_for_portfolio(&self, portfolio_id: &str) -> Result<Vec<ImportBatch>> {
        Ok(self
            .read()?
            .batches
            .values()
            .filter(|b| b.portfolio_id == portfolio_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn entry_numbers_are_monotonic_per_portfolio() {
        let store = MemoryLedgerStore::new();
        assert_eq!(store.next_entry_number("p1").unwrap(), 1);
        assert_eq!(store.next_entry_number("p1").unwrap(), 2);
        assert_eq!(store.next_entry_number("p2").unwrap(), 1);
        assert_eq!(store.next_entry_number("p1").unwrap(), 3);
    }

    #[test]
    fn lot_quantity_may_only_decrease() {
        let store = MemoryLedgerStore::new();
        let lot = SecurityLot::new(
            "p1",
            "AAPL",
            "t1",
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            dec!(100),
            dec!(10),
            dec!(9),
            Currency::new("USD").unwrap(),
            dec!(0.9),
        );
        let lot = store.insert_lot(lot).unwrap();

        store.reduce_lot(&lot.id, dec!(40), false).unwrap();
        assert!(store.reduce_lot(&lot.id, dec!(50), false).is_err());
        assert!(store.reduce_lot(&lot.id, dec!(-1), false).is_err());

        store.reduce_lot(&lot.id, Decimal::ZERO, true).unwrap();
        let stored = store.get_lot(&lot.id).unwrap();
        assert!(stored.closed);
    }

    #[test]
    fn stale_batch_update_is_rejected() {
        let store = MemoryLedgerStore::new();
        let batch = store.insert_batch(ImportBatch::new("p1", "testbank")).unwrap();

        // Writer A reads v1 and applies.
        let mut a = store.get_batch(&batch.id).unwrap();
        a.mark_applied();
        let updated = store.update_batch(a, 1).unwrap();
        assert_eq!(updated.version, 2);

        // Writer B also read v1; its update must conflict, not overwrite.
        let mut b = batch.clone();
        b.mark_cancelled();
        let err = store.update_batch(b, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::Import(ImportError::StaleVersion { expected: 1, actual: 2, .. })
        ));
    }
}
