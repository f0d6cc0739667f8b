//! Traits for abstracting away the external collaborators of the ledger.

use core::fmt;

/// A role a caller identity can hold with the authorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Permits moving balances into escrow via `assign`.
    Withdraw,
    /// Permits releasing vested balances via `release`.
    Release,
}

/// Authorizer answers role-membership queries for caller identities.
pub trait Authorizer {
    /// The identity of a caller.
    type AccountId;

    /// Check whether `who` currently holds `role`.
    fn has_role(&self, who: &Self::AccountId, role: Role) -> bool;
}

impl<T: Authorizer> Authorizer for std::sync::Arc<T> {
    type AccountId = T::AccountId;

    fn has_role(&self, who: &Self::AccountId, role: Role) -> bool {
        self.as_ref().has_role(who, role)
    }
}

/// Custodian holds the actual fungible asset the ledger accounts for.
pub trait Custodian {
    /// The identity balances are attributed to.
    type AccountId;
    /// The balance.
    type Balance;
    /// An error that can occur during a transfer.
    type Error: fmt::Debug;

    /// Pull `amount` units from `from` into escrow.
    fn pull_from(&self, from: &Self::AccountId, amount: Self::Balance) -> Result<(), Self::Error>;

    /// Pay `amount` units out of escrow to `to`.
    fn pay_to(&self, to: &Self::AccountId, amount: Self::Balance) -> Result<(), Self::Error>;

    /// The total balance currently held in escrow, across all identities.
    fn total_held_balance(&self) -> Self::Balance;
}

impl<T: Custodian> Custodian for std::sync::Arc<T> {
    type AccountId = T::AccountId;
    type Balance = T::Balance;
    type Error = T::Error;

    fn pull_from(&self, from: &Self::AccountId, amount: Self::Balance) -> Result<(), Self::Error> {
        self.as_ref().pull_from(from, amount)
    }

    fn pay_to(&self, to: &Self::AccountId, amount: Self::Balance) -> Result<(), Self::Error> {
        self.as_ref().pay_to(to, amount)
    }

    fn total_held_balance(&self) -> Self::Balance {
        self.as_ref().total_held_balance()
    }
}

/// CurrentMoment provides the current time instant.
pub trait CurrentMoment {
    /// The time instant representation.
    type Moment;

    /// The current moment.
    fn now(&self) -> Self::Moment;
}

impl<T: CurrentMoment> CurrentMoment for std::sync::Arc<T> {
    type Moment = T::Moment;

    fn now(&self) -> Self::Moment {
        self.as_ref().now()
    }
}
