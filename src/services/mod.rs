// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

pub mod collector;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod report;
pub mod safety;
