/*
This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
If a copy of the MPL was not distributed with this file,
You can obtain one at https://mozilla.org/MPL/2.0/.
*/
use bevy::reflect::Reflect;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// What a single `perform()` call reports back about the Action it ran.
///
/// This is a tiny lifecycle with two layers:
/// 1) Progressed - `InProgress`, the Action wants to be ticked again next time.
/// 2) Terminal - `Done` or `Failed`; the agent moves on either way.
///
/// An Action that returned a Terminal outcome should not be performed again
/// until it gets `reset()` for a new plan.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Reflect)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ActionOutcome {
    /// Progressed state. Started but didn't finish yet, will continue next tick.
    InProgress,

    /// Terminal state. Did all it was supposed to, its effects now hold.
    Done,

    /// Terminal state.
    /// We gave up due to getting stuck/invalid target/etc.
    /// The rest of the plan gets thrown away and the Goal goes back on the market.
    Failed,
}

impl From<bool> for ActionOutcome {
    /// Maps a plain 'did it work' flag onto a Terminal outcome.
    fn from(value: bool) -> Self {
        match value {
            true => Self::Done,
            false => Self::Failed,
        }
    }
}
