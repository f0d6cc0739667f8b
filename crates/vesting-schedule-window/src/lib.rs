//! The window-based linear release schedule for vesting.

#![cfg_attr(not(feature = "std"), no_std)]

use num_traits::{CheckedAdd, CheckedMul, CheckedSub, Unsigned, Zero};

/// An error that can happen while computing the releasable share.
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum ComputationError {
    /// The computation exceeded the capacity of the balance type.
    #[error("balance overflow")]
    Overflow,
}

/// The release window.
///
/// The escrowed balance becomes releasable gradually between `start` and `end`:
/// nothing before `start`, everything at or after `end`, and the elapsed share
/// of the window in between.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    codec::Encode,
    codec::Decode,
    codec::MaxEncodedLen,
    scale_info::TypeInfo,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(deny_unknown_fields))]
pub struct WindowSchedule<Balance, Moment> {
    /// The balance currently escrowed under the schedule.
    pub total: Balance,
    /// The moment releasing begins.
    pub start: Moment,
    /// The moment the whole balance becomes releasable.
    pub end: Moment,
}

impl<Balance, Moment> WindowSchedule<Balance, Moment>
where
    Balance: Unsigned + CheckedMul + CheckedAdd + From<Moment> + Copy,
    Moment: PartialOrd + Unsigned + CheckedSub + Copy,
{
    /// Compute the releasable part of the balance at the given moment.
    ///
    /// The result is monotonically non-decreasing in `now` for a fixed `total`
    /// and never exceeds `total`. The share truncates toward zero, so the
    /// rounding dust stays escrowed until the window is over.
    pub fn releasable_at(&self, now: Moment) -> Result<Balance, ComputationError> {
        let elapsed = match now.checked_sub(&self.start) {
            // The window has not opened yet, nothing is releasable.
            None => return Ok(Zero::zero()),
            Some(v) => v,
        };

        let duration = match self.end.checked_sub(&self.start) {
            // An inverted window can't be constructed through the ledger;
            // treat it as a window that is already over.
            None => return Ok(self.total),
            Some(v) => v,
        };

        if elapsed >= duration {
            // The window is over, everything that remains is releasable.
            // This also covers the zero-length window, so past this point
            // `0 <= elapsed < duration` and the divisions below are safe.
            return Ok(self.total);
        }

        let elapsed = Balance::from(elapsed);
        let duration = Balance::from(duration);

        // `total * elapsed / duration`, split into the evenly divisible part
        // and a remainder correction so the scaling stays within the balance
        // type: `per_unit * elapsed` is bounded by `total`, and only the
        // correction term can overflow, on durations near the balance
        // capacity.
        let per_unit = self.total / duration;
        let remainder = self.total % duration;

        let evenly = per_unit
            .checked_mul(&elapsed)
            .ok_or(ComputationError::Overflow)?;
        let correction = remainder
            .checked_mul(&elapsed)
            .ok_or(ComputationError::Overflow)?
            / duration;

        evenly
            .checked_add(&correction)
            .ok_or(ComputationError::Overflow)
    }
}
