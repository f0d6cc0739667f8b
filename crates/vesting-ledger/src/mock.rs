//! The mocks and fakes for the ledger tests.

#![allow(clippy::missing_docs_in_private_items)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use mockall::mock;

use crate::traits::{CurrentMoment, Custodian, Role};
use crate::{Config, Error, VestingLedger};

/// The test config, with a stateful fake custodian and a settable clock.
pub enum Test {}

impl Config for Test {
    type AccountId = u64;
    type Balance = u64;
    type Moment = u64;
    type Clock = Arc<FakeClock>;
    type Authorizer = Arc<MockAuthorizer>;
    type Custodian = Arc<FakeCustodian>;
}

/// The test config whose custodian re-enters the ledger from inside a payout.
pub enum ReentrantTest {}

impl Config for ReentrantTest {
    type AccountId = u64;
    type Balance = u64;
    type Moment = u64;
    type Clock = Arc<FakeClock>;
    type Authorizer = Arc<MockAuthorizer>;
    type Custodian = Arc<ReentrantCustodian>;
}

mock! {
    #[derive(Debug)]
    pub Authorizer {}

    impl crate::traits::Authorizer for Authorizer {
        type AccountId = u64;

        fn has_role(&self, who: &u64, role: Role) -> bool;
    }
}

/// A settable clock.
#[derive(Debug, Default)]
pub struct FakeClock(AtomicU64);

impl FakeClock {
    /// Move the clock to the given moment.
    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl CurrentMoment for FakeClock {
    type Moment = u64;

    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// An error the fake custodian can produce.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FakeCustodianError {
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("payout rejected")]
    PayoutRejected,
}

/// An in-memory custodian with per-identity balances, an escrow pot and
/// payout failure injection.
///
/// Plays the role a real asset-transfer backend would play in production.
#[derive(Debug, Default)]
pub struct FakeCustodian {
    balances: Mutex<HashMap<u64, u64>>,
    held: AtomicU64,
    fail_payouts: AtomicBool,
}

impl FakeCustodian {
    /// Create a custodian where `who` starts with `balance` spendable units.
    pub fn with_balance(who: u64, balance: u64) -> Self {
        let custodian = Self::default();
        custodian.balances.lock().unwrap().insert(who, balance);
        custodian
    }

    /// The spendable (non-escrowed) balance of `who`.
    pub fn balance(&self, who: u64) -> u64 {
        self.balances.lock().unwrap().get(&who).copied().unwrap_or(0)
    }

    /// The current escrow pot.
    pub fn held(&self) -> u64 {
        self.held.load(Ordering::SeqCst)
    }

    /// Make subsequent payouts fail (or succeed again).
    pub fn set_fail_payouts(&self, fail: bool) {
        self.fail_payouts.store(fail, Ordering::SeqCst);
    }
}

impl Custodian for FakeCustodian {
    type AccountId = u64;
    type Balance = u64;
    type Error = FakeCustodianError;

    fn pull_from(&self, from: &u64, amount: u64) -> Result<(), Self::Error> {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(*from).or_default();
        if *balance < amount {
            return Err(FakeCustodianError::InsufficientFunds);
        }
        *balance -= amount;
        self.held.fetch_add(amount, Ordering::SeqCst);
        Ok(())
    }

    fn pay_to(&self, to: &u64, amount: u64) -> Result<(), Self::Error> {
        if self.fail_payouts.load(Ordering::SeqCst) {
            return Err(FakeCustodianError::PayoutRejected);
        }
        self.held.fetch_sub(amount, Ordering::SeqCst);
        *self.balances.lock().unwrap().entry(*to).or_default() += amount;
        Ok(())
    }

    fn total_held_balance(&self) -> u64 {
        self.held.load(Ordering::SeqCst)
    }
}

/// A custodian that attempts to call `release` again from inside a payout,
/// the way a malicious transfer callback would.
#[derive(Default)]
pub struct ReentrantCustodian {
    ledger: Mutex<Weak<VestingLedger<ReentrantTest>>>,
    reentry_outcome: Mutex<Option<Result<u64, Error>>>,
}

impl ReentrantCustodian {
    /// Point the custodian at the ledger it should try to re-enter.
    pub fn hook(&self, ledger: &Arc<VestingLedger<ReentrantTest>>) {
        *self.ledger.lock().unwrap() = Arc::downgrade(ledger);
    }

    /// What the nested `release` attempt returned, if a payout happened.
    pub fn reentry_outcome(&self) -> Option<Result<u64, Error>> {
        self.reentry_outcome.lock().unwrap().clone()
    }
}

impl Custodian for ReentrantCustodian {
    type AccountId = u64;
    type Balance = u64;
    type Error = Infallible;

    fn pull_from(&self, _from: &u64, _amount: u64) -> Result<(), Self::Error> {
        Ok(())
    }

    fn pay_to(&self, to: &u64, _amount: u64) -> Result<(), Self::Error> {
        if let Some(ledger) = self.ledger.lock().unwrap().upgrade() {
            *self.reentry_outcome.lock().unwrap() = Some(ledger.release(to));
        }
        Ok(())
    }

    fn total_held_balance(&self) -> u64 {
        0
    }
}
