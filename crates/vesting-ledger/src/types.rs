//! Custom types we use.

use num_traits::{CheckedAdd, CheckedMul, CheckedSub, Unsigned};
use vesting_schedule_window::{ComputationError, WindowSchedule};

/// The per-beneficiary vesting record.
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
    serde::Serialize,
    serde::Deserialize,
)]
pub struct ScheduleEntry<Balance, Moment> {
    /// The release window and the balance still escrowed under it.
    pub schedule: WindowSchedule<Balance, Moment>,
    /// Whether this schedule may ever be revoked. Fixed at creation.
    pub revokable: bool,
    /// Whether this schedule has been revoked. Revocation is irreversible.
    pub revoked: bool,
}

impl<Balance, Moment> ScheduleEntry<Balance, Moment>
where
    Balance: Unsigned + CheckedMul + CheckedAdd + From<Moment> + Copy,
    Moment: PartialOrd + Unsigned + CheckedSub + Copy,
{
    /// Compute the releasable part of the escrowed balance at the given moment.
    ///
    /// A revoked entry is frozen at its remaining total, and that total is fully
    /// releasable at any moment.
    pub fn releasable_at(&self, now: Moment) -> Result<Balance, ComputationError> {
        if self.revoked {
            return Ok(self.schedule.total);
        }
        self.schedule.releasable_at(now)
    }
}
