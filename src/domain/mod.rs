// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

mod analysis;
mod prompt;
mod task;

pub use analysis::*;
pub use prompt::*;
pub use task::*;
