// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::FileTask;
use crate::error::{Error, Result};

/// Selects files under a root by extension.
///
/// Entries are visited depth-first in file-name order, so two walks of the
/// same tree yield the same sequence. Symlinks are not followed.
#[derive(Debug, Clone)]
pub struct FileCollector {
    root: PathBuf,
    extensions: BTreeSet<String>,
    recursive: bool,
    exclude: Option<GlobSet>,
}

impl FileCollector {
    pub fn new<I, S>(root: impl Into<PathBuf>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            root: root.into(),
            extensions: extensions.into_iter().map(Into::into).collect(),
            recursive: true,
            exclude: None,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Glob patterns matched against the path relative to the root
    pub fn exclude(mut self, patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(self);
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| Error::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| Error::InvalidPattern {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })?;
        self.exclude = Some(set);
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily yields matching files. Fails only if the root is not a directory.
    pub fn walk(&self) -> Result<impl Iterator<Item = FileTask> + '_> {
        if !self.root.is_dir() {
            return Err(Error::DirectoryNotFound {
                path: self.root.clone(),
            });
        }

        let mut walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        Ok(walker.into_iter().filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    return None;
                }
            };

            if !entry.file_type().is_file() {
                return None;
            }

            let task = FileTask::from_path(entry.path())?;
            if !self.extensions.contains(&task.extension) {
                return None;
            }

            if self.is_excluded(entry.path()) {
                debug!(path = %entry.path().display(), "excluded by pattern");
                return None;
            }

            Some(task)
        }))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let Some(ref set) = self.exclude else {
            return false;
        };
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        set.is_match(relative)
    }
}
