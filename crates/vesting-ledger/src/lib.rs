//! The vesting ledger.
//!
//! Custodies a fungible balance on behalf of beneficiaries and releases it
//! gradually according to a per-beneficiary linear release window, with
//! support for incremental top-ups and early revocation. The actual asset
//! transfers, the role-membership authority and the time source are injected
//! collaborators; the ledger owns only the schedule map and the mutation
//! protocol around it.
//!
//! Every transfer-performing operation engages a process-wide reentrancy
//! guard for its full duration, and either fully commits its state change and
//! transfer or fully rolls back.
//!
//! The revocation refund is computed against the custodian's *total* held
//! balance, so a custodian instance must back exactly one schedule for the
//! refund accounting to be correct.

#![warn(
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::clone_on_ref_ptr
)]

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use num_traits::{CheckedAdd, CheckedMul, CheckedSub, Unsigned, Zero};
use vesting_schedule_window::{ComputationError, WindowSchedule};

pub mod errors;
pub mod guard;
pub mod traits;
pub mod types;

#[cfg(test)]
mod mock;

pub use errors::Error;

use guard::ReentrancyGuard;
use traits::{Authorizer, CurrentMoment, Custodian, Role};
use types::ScheduleEntry;

/// The configuration of a ledger instance: the value types it operates on and
/// the collaborator types injected into it.
pub trait Config {
    /// The beneficiary/caller identity. The [`Default`] value is treated as
    /// the null identity and is not a valid beneficiary.
    type AccountId: Clone + Eq + Hash + Default + fmt::Debug;

    /// The balance. Must be able to hold a time instant, since the linear
    /// share computation scales balances by elapsed time.
    type Balance: Unsigned
        + CheckedAdd
        + CheckedSub
        + CheckedMul
        + From<Self::Moment>
        + Copy
        + Default
        + fmt::Debug;

    /// The time instant representation.
    type Moment: PartialOrd + Unsigned + CheckedSub + Copy + Default + fmt::Debug;

    /// The source of the current time instant.
    type Clock: CurrentMoment<Moment = Self::Moment>;

    /// The role-membership authority.
    type Authorizer: Authorizer<AccountId = Self::AccountId>;

    /// The holder of the escrowed asset.
    type Custodian: Custodian<AccountId = Self::AccountId, Balance = Self::Balance>;
}

/// The balance from a given config.
type BalanceOf<T> = <T as Config>::Balance;
/// The moment from a given config.
type MomentOf<T> = <T as Config>::Moment;
/// The schedule entry from a given config.
type ScheduleEntryOf<T> = ScheduleEntry<BalanceOf<T>, MomentOf<T>>;

/// The vesting ledger.
///
/// Owns the per-beneficiary schedule map; all mutations go through the
/// role-gated operations below.
pub struct VestingLedger<T: Config> {
    /// The per-beneficiary schedules.
    schedules: Mutex<HashMap<T::AccountId, ScheduleEntryOf<T>>>,
    /// The holder of the escrowed asset.
    custodian: T::Custodian,
    /// The role-membership authority.
    authorizer: T::Authorizer,
    /// The source of the current time instant.
    clock: T::Clock,
    /// Guards the operations that perform external transfers.
    guard: ReentrancyGuard,
}

impl<T: Config> VestingLedger<T> {
    /// Create an empty ledger from the given collaborators.
    pub fn new(custodian: T::Custodian, authorizer: T::Authorizer, clock: T::Clock) -> Self {
        Self {
            schedules: Mutex::new(HashMap::new()),
            custodian,
            authorizer,
            clock,
            guard: ReentrancyGuard::new(),
        }
    }

    /// Lock the schedule map.
    ///
    /// The lock is only ever held for short read/modify sections, never across
    /// a custodian call. Poisoning is absorbed: the map itself is kept
    /// consistent by the commit-or-rollback protocol of the operations, not by
    /// panic propagation.
    fn lock_schedules(&self) -> MutexGuard<'_, HashMap<T::AccountId, ScheduleEntryOf<T>>> {
        match self.schedules.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Create the schedule for `beneficiary` with a zero escrowed balance.
    ///
    /// If a schedule for `beneficiary` already exists it is fully replaced,
    /// dropping any accrued balance accounting; callers must guard against
    /// accidental re-initialization.
    pub fn initialize_schedule(
        &self,
        beneficiary: &T::AccountId,
        start: T::Moment,
        end: T::Moment,
        revokable: bool,
    ) -> Result<(), Error> {
        if *beneficiary == T::AccountId::default() {
            return Err(Error::InvalidParameters);
        }
        if start > end {
            return Err(Error::InvalidParameters);
        }

        self.lock_schedules().insert(
            beneficiary.clone(),
            ScheduleEntry {
                schedule: WindowSchedule {
                    total: Zero::zero(),
                    start,
                    end,
                },
                revokable,
                revoked: false,
            },
        );

        tracing::info!(
            message = "Schedule initialized",
            who = ?beneficiary,
            ?start,
            ?end,
            ?revokable,
        );

        Ok(())
    }

    /// Escrow `amount` units pulled from `caller` under the schedule of
    /// `beneficiary`.
    ///
    /// Top-ups are additive and leave the release window untouched. A
    /// beneficiary without a schedule gets the default zero-window entry, so
    /// the whole deposit is immediately releasable; use
    /// [`Self::initialize_schedule`] first to set a window.
    ///
    /// Requires `caller` to hold [`Role::Withdraw`].
    pub fn assign(
        &self,
        caller: &T::AccountId,
        beneficiary: &T::AccountId,
        amount: T::Balance,
    ) -> Result<(), Error> {
        if !self.authorizer.has_role(caller, Role::Withdraw) {
            return Err(Error::Unauthorized);
        }
        if amount.is_zero() {
            return Err(Error::InvalidParameters);
        }

        let _transfer_lock = self.guard.engage().ok_or_else(|| {
            tracing::warn!(message = "Rejected a reentrant call", operation = "assign");
            Error::ReentrantCall
        })?;

        // Validate the escrow increase upfront, so that the state commit after
        // the pull cannot fail and strand the deposited funds.
        let new_total = {
            let schedules = self.lock_schedules();
            let current = match schedules.get(beneficiary) {
                Some(entry) if entry.revoked => return Err(Error::InvalidParameters),
                Some(entry) => entry.schedule.total,
                None => Zero::zero(),
            };
            current
                .checked_add(&amount)
                .ok_or(ComputationError::Overflow)?
        };

        self.custodian.pull_from(caller, amount).map_err(|error| {
            tracing::warn!(message = "Custodian declined the escrow deposit", ?error);
            Error::TransferFailed
        })?;

        self.lock_schedules()
            .entry(beneficiary.clone())
            .or_default()
            .schedule
            .total = new_total;

        tracing::info!(
            message = "Escrow deposit assigned",
            who = ?beneficiary,
            ?amount,
        );
        Ok(())
    }

    /// Release the currently releasable part of the caller's schedule and pay
    /// it out through the custodian.
    ///
    /// The schedule is debited before the custodian is instructed, and the
    /// debit is rolled back if the payout fails, so the operation is atomic
    /// from the caller's perspective.
    ///
    /// Requires `caller` to hold [`Role::Release`]. Returns the released
    /// amount.
    pub fn release(&self, caller: &T::AccountId) -> Result<T::Balance, Error> {
        if !self.authorizer.has_role(caller, Role::Release) {
            return Err(Error::Unauthorized);
        }

        let _transfer_lock = self.guard.engage().ok_or_else(|| {
            tracing::warn!(message = "Rejected a reentrant call", operation = "release");
            Error::ReentrantCall
        })?;

        let now = self.clock.now();

        let (unreleased, entry_before) = {
            let mut schedules = self.lock_schedules();
            let entry = match schedules.get_mut(caller) {
                Some(entry) => entry,
                None => return Err(Error::NothingToRelease),
            };

            let unreleased = entry.releasable_at(now)?;
            if unreleased.is_zero() {
                return Err(Error::NothingToRelease);
            }

            let entry_before = entry.clone();

            // Debit the schedule before instructing the custodian.
            entry.schedule.total = entry
                .schedule
                .total
                .checked_sub(&unreleased)
                .ok_or(ComputationError::Overflow)?;

            (unreleased, entry_before)
        };

        if let Err(error) = self.custodian.pay_to(caller, unreleased) {
            // Roll back the debit; a failed release must leave the schedule
            // exactly as it was before the call.
            self.lock_schedules().insert(caller.clone(), entry_before);
            tracing::warn!(message = "Custodian declined the payout", ?error);
            return Err(Error::TransferFailed);
        }

        tracing::info!(
            message = "Vested balance released",
            who = ?caller,
            amount = ?unreleased,
        );
        Ok(unreleased)
    }

    /// Revoke the caller's own schedule.
    ///
    /// The schedule is frozen at the amount vested so far (which stays
    /// releasable through [`Self::release`]), and everything the custodian
    /// holds beyond that amount is refunded to the caller. Fails with
    /// [`Error::CannotRevoke`] unless the schedule exists, is revokable and
    /// has not been revoked before.
    ///
    /// Returns the refunded amount.
    pub fn revoke(&self, caller: &T::AccountId) -> Result<T::Balance, Error> {
        let _transfer_lock = self.guard.engage().ok_or_else(|| {
            tracing::warn!(message = "Rejected a reentrant call", operation = "revoke");
            Error::ReentrantCall
        })?;

        let now = self.clock.now();

        let (refund, entry_before) = {
            let mut schedules = self.lock_schedules();
            let entry = match schedules.get_mut(caller) {
                Some(entry) => entry,
                None => return Err(Error::CannotRevoke),
            };
            if !entry.revokable || entry.revoked {
                return Err(Error::CannotRevoke);
            }

            let unreleased = entry.releasable_at(now)?;

            // The refund is everything the custodian holds beyond the vested
            // part. Only correct while this custodian instance backs a single
            // schedule; see the crate docs.
            let refund = self
                .custodian
                .total_held_balance()
                .checked_sub(&unreleased)
                .ok_or(ComputationError::Overflow)?;

            let entry_before = entry.clone();

            // Freeze the schedule at the vested remainder.
            entry.revoked = true;
            entry.schedule.total = unreleased;

            (refund, entry_before)
        };

        if let Err(error) = self.custodian.pay_to(caller, refund) {
            // Roll back the freeze; a failed refund must leave the schedule
            // revokable again.
            self.lock_schedules().insert(caller.clone(), entry_before);
            tracing::warn!(message = "Custodian declined the revocation refund", ?error);
            return Err(Error::TransferFailed);
        }

        tracing::info!(
            message = "Schedule revoked",
            who = ?caller,
            ?refund,
        );
        Ok(refund)
    }

    /// Compute the releasable amount for `beneficiary` at the current moment.
    ///
    /// Read-only; takes no role and no guard.
    pub fn compute_releasable(&self, beneficiary: &T::AccountId) -> Result<T::Balance, Error> {
        self.releasable_at(beneficiary, self.clock.now())
    }

    /// Compute the releasable amount for `beneficiary` at the given moment.
    ///
    /// A beneficiary without a schedule yields zero.
    pub fn releasable_at(
        &self,
        beneficiary: &T::AccountId,
        now: T::Moment,
    ) -> Result<T::Balance, Error> {
        let schedules = self.lock_schedules();
        let entry = match schedules.get(beneficiary) {
            Some(entry) => entry,
            None => return Ok(Zero::zero()),
        };
        Ok(entry.releasable_at(now)?)
    }

    /// Read the stored schedule entry for `beneficiary`, if any.
    pub fn schedule(&self, beneficiary: &T::AccountId) -> Option<ScheduleEntryOf<T>> {
        self.lock_schedules().get(beneficiary).cloned()
    }
}
