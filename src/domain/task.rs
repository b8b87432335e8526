// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

/// A file selected for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub path: PathBuf,
    /// Extension without the leading dot, exactly as it appears on disk
    pub extension: String,
}

impl FileTask {
    /// Builds a task when the path has a UTF-8 extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_string();
        Some(Self {
            path: path.to_path_buf(),
            extension,
        })
    }
}
