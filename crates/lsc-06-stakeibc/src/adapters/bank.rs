//! Bank balances, supplies and denom traces kept in the ledger store.

use crate::error::{StakeIbcError, StakeIbcResult};
use crate::ports::{Bank, DenomTrace};
use lsc_ledger_store::{key, prefix, KvRead, Store};
use serde::{Deserialize, Serialize};
use shared_types::{Coin, Int};

/// Balance row; the key is `denom \0 address` so holders of a denom are
/// one prefix scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct BalanceEntry {
    address: String,
    amount: Int,
}

fn holders_prefix(denom: &str) -> Vec<u8> {
    let mut out = key(prefix::BANK_BALANCE, denom.as_bytes());
    out.push(0);
    out
}

fn balance_key(address: &str, denom: &str) -> Vec<u8> {
    let mut out = holders_prefix(denom);
    out.extend_from_slice(address.as_bytes());
    out
}

fn supply_key(denom: &str) -> Vec<u8> {
    key(prefix::BANK_SUPPLY, denom.as_bytes())
}

fn trace_key(ibc_denom: &str) -> Vec<u8> {
    key(prefix::BANK_DENOM_TRACE, ibc_denom.as_bytes())
}

fn overflow(denom: &str) -> StakeIbcError {
    StakeIbcError::Internal(format!("{denom} amount overflow"))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StoreBank;

impl StoreBank {
    pub fn new() -> Self {
        Self
    }

    pub fn set_denom_trace(&self, store: &mut Store, ibc_denom: &str, trace: &DenomTrace) -> StakeIbcResult<()> {
        Ok(store.set_value(trace_key(ibc_denom), trace)?)
    }

    fn write_balance(&self, store: &mut Store, address: &str, denom: &str, amount: Int) -> StakeIbcResult<()> {
        let key = balance_key(address, denom);
        if amount.is_zero() {
            store.delete(&key)?;
        } else {
            store.set_value(
                key,
                &BalanceEntry {
                    address: address.to_string(),
                    amount,
                },
            )?;
        }
        Ok(())
    }

    fn debit(&self, store: &mut Store, address: &str, coin: &Coin) -> StakeIbcResult<()> {
        let available = self.balance(store, address, &coin.denom)?;
        let remaining = available
            .checked_sub(coin.amount)
            .map_err(|_| StakeIbcError::InsufficientBalance {
                address: address.to_string(),
                denom: coin.denom.clone(),
                required: coin.amount,
                available,
            })?;
        self.write_balance(store, address, &coin.denom, remaining)
    }

    fn credit(&self, store: &mut Store, address: &str, coin: &Coin) -> StakeIbcResult<()> {
        let balance = self
            .balance(store, address, &coin.denom)?
            .checked_add(coin.amount)
            .map_err(|_| overflow(&coin.denom))?;
        self.write_balance(store, address, &coin.denom, balance)
    }
}

impl Bank for StoreBank {
    fn balance(&self, store: &Store, address: &str, denom: &str) -> StakeIbcResult<Int> {
        Ok(store
            .get_value::<BalanceEntry>(&balance_key(address, denom))?
            .map(|entry| entry.amount)
            .unwrap_or_default())
    }

    fn supply(&self, store: &Store, denom: &str) -> StakeIbcResult<Int> {
        Ok(store.get_value::<Int>(&supply_key(denom))?.unwrap_or_default())
    }

    fn mint(&self, store: &mut Store, to: &str, coin: &Coin) -> StakeIbcResult<()> {
        let supply = self
            .supply(store, &coin.denom)?
            .checked_add(coin.amount)
            .map_err(|_| overflow(&coin.denom))?;
        self.credit(store, to, coin)?;
        Ok(store.set_value(supply_key(&coin.denom), &supply)?)
    }

    fn burn(&self, store: &mut Store, from: &str, coin: &Coin) -> StakeIbcResult<()> {
        self.debit(store, from, coin)?;
        let supply = self
            .supply(store, &coin.denom)?
            .checked_sub(coin.amount)
            .map_err(|_| StakeIbcError::Internal(format!("{} supply below burn", coin.denom)))?;
        Ok(store.set_value(supply_key(&coin.denom), &supply)?)
    }

    fn send(&self, store: &mut Store, from: &str, to: &str, coin: &Coin) -> StakeIbcResult<()> {
        self.debit(store, from, coin)?;
        self.credit(store, to, coin)
    }

    fn denom_trace(&self, store: &Store, ibc_denom: &str) -> StakeIbcResult<Option<DenomTrace>> {
        Ok(store.get_value(&trace_key(ibc_denom))?)
    }

    fn holders(&self, store: &Store, denom: &str) -> StakeIbcResult<Vec<(String, Int)>> {
        Ok(store
            .values_with_prefix::<BalanceEntry>(&holders_prefix(denom))?
            .into_iter()
            .map(|(_, entry)| (entry.address, entry.amount))
            .collect())
    }
}
