// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for pod state and control.
//!
//! Constrained types check their values at construction time, so a value
//! that reaches the backend is already known to be valid.
//!
//! # Types
//!
//! - [`Side`] - Left or right half of the bed
//! - [`PowerState`] - Off/Smart/Manual
//! - [`Level`] - Heating/cooling level (-100 to 100)
//! - [`SleepStage`] - Awake/Light/Deep/REM

mod level;
mod power;
mod side;
mod sleep_stage;

pub use level::Level;
pub use power::PowerState;
pub use side::Side;
pub use sleep_stage::SleepStage;
