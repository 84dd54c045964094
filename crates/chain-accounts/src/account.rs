use chain_types::{AccountBalances, PublicKey, VoteState};

use crate::errors::AccountError;

/// An account as the Chain Mutator and Transaction Executor see it: the two
/// balance views of §3 plus vote bookkeeping. Owned and mutated exclusively
/// through `AccountStore` — nothing outside this crate touches the fields
/// directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub public_key: PublicKey,
    pub balances: AccountBalances,
    pub votes: VoteState,
}

impl Account {
    pub fn new(public_key: PublicKey) -> Self {
        Self {
            public_key,
            balances: AccountBalances::default(),
            votes: VoteState::default(),
        }
    }

    pub fn credit_confirmed(&mut self, amount: u64) -> Result<(), AccountError> {
        self.balances.confirmed = self
            .balances
            .confirmed
            .checked_add(amount)
            .ok_or(AccountError::Overflow)?;
        Ok(())
    }

    pub fn debit_confirmed(&mut self, amount: u64) -> Result<(), AccountError> {
        if self.balances.confirmed < amount {
            return Err(AccountError::InsufficientConfirmed {
                available: self.balances.confirmed,
                required: amount,
            });
        }
        self.balances.confirmed -= amount;
        Ok(())
    }

    pub fn credit_unconfirmed(&mut self, amount: u64) -> Result<(), AccountError> {
        self.balances.unconfirmed = self
            .balances
            .unconfirmed
            .checked_add(amount)
            .ok_or(AccountError::Overflow)?;
        Ok(())
    }

    pub fn debit_unconfirmed(&mut self, amount: u64) -> Result<(), AccountError> {
        if self.balances.unconfirmed < amount {
            return Err(AccountError::InsufficientUnconfirmed {
                available: self.balances.unconfirmed,
                required: amount,
            });
        }
        self.balances.unconfirmed -= amount;
        Ok(())
    }

    /// Fund both balance views together. §3 defines `unconfirmed` as
    /// `confirmed` minus pending pool effects, so with an empty pool the two
    /// must agree; every path that hands an account newly-minted or received
    /// funds (a `Transfer`'s recipient, genesis distribution) has to credit
    /// both in lockstep or the next unconfirmed-balance debit against that
    /// account sees a balance of zero and fails spuriously. Mirrors the
    /// `balance`/`u_balance` merge a reference ledger applies on receipt.
    pub fn credit(&mut self, amount: u64) -> Result<(), AccountError> {
        self.credit_confirmed(amount)?;
        self.credit_unconfirmed(amount)?;
        Ok(())
    }

    /// Exact inverse of `credit`, used to undo a recipient credit.
    pub fn debit(&mut self, amount: u64) -> Result<(), AccountError> {
        self.debit_confirmed(amount)?;
        self.debit_unconfirmed(amount)?;
        Ok(())
    }
}
