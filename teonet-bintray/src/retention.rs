//! Retention of uploaded files.
//!
//! Remote files are grouped by package build line (name, distribution and
//! architecture). Within a group files are ordered newest first by a sort
//! key whose numeric runs are zero-padded, and everything past the first N
//! is deleted. As in Debian version ordering, `~` sorts before the end of
//! the version, so `1.0~rc1` is older than `1.0`.

use crate::api::RemoteFile;
use crate::classify::{classify, Classification};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

/// Width numeric version runs are padded to in sort keys.
const NUMBER_WIDTH: usize = 10;

/// Sort key character for `~`, below [`END_OF_VERSION`].
const TILDE: char = '!';

/// Appended to every version key; below any other version character.
const END_OF_VERSION: char = '#';

/// Grouping and ordering key of a remote file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RetentionKey {
    pub group: String,
    /// Version with zero-padded numeric runs and an end marker.
    pub version: String,
}

impl RetentionKey {
    /// Key for a package filename. Archives and unparseable names have none.
    pub fn for_file(name: &str) -> Option<Self> {
        match classify(name, None) {
            Ok(Classification::Package(artifact)) => Some(Self {
                group: artifact.retention_group(),
                version: version_key(&artifact.version),
            }),
            Ok(Classification::Archive { .. }) => None,
            Err(e) => {
                tracing::debug!("No retention key for {}: {}", name, e);
                None
            }
        }
    }

    /// Full sort key, `<group>*<padded version>`.
    pub fn sort_key(&self) -> String {
        format!("{}*{}", self.group, self.version)
    }
}

impl fmt::Display for RetentionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{}", self.group, self.version)
    }
}

fn version_key(version: &str) -> String {
    let mut out = String::with_capacity(version.len() + NUMBER_WIDTH * 4);
    let mut digits = String::new();
    for c in version.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if !digits.is_empty() {
            out.push_str(&format!("{:0>width$}", digits, width = NUMBER_WIDTH));
            digits.clear();
        }
        out.push(if c == '~' { TILDE } else { c });
    }
    if !digits.is_empty() {
        out.push_str(&format!("{:0>width$}", digits, width = NUMBER_WIDTH));
    }
    out.push(END_OF_VERSION);
    out
}

/// Files to keep and delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    pub keep: Vec<RemoteFile>,
    pub delete: Vec<RemoteFile>,
    /// Files without a retention key; never deleted.
    pub skipped: Vec<RemoteFile>,
}

/// Keeps the newest `keep` files of every group.
pub fn plan(files: Vec<RemoteFile>, keep: usize) -> RetentionPlan {
    let mut groups: BTreeMap<String, Vec<(String, RemoteFile)>> = BTreeMap::new();
    let mut result = RetentionPlan::default();

    for file in files {
        match RetentionKey::for_file(file.file_name()) {
            Some(key) => groups
                .entry(key.group.clone())
                .or_default()
                .push((key.sort_key(), file)),
            None => result.skipped.push(file),
        }
    }

    for (group, mut members) in groups {
        members.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.path.cmp(&a.1.path)));
        tracing::debug!("Retention group {}: {} files", group, members.len());

        for (index, (_, file)) in members.into_iter().enumerate() {
            if index < keep {
                result.keep.push(file);
            } else {
                result.delete.push(file);
            }
        }
    }

    result
}

/// Calls `remove` with the path of every file marked for deletion.
///
/// Stops at the first error. Returns the number of files removed.
pub async fn apply<F, Fut, E>(plan: &RetentionPlan, mut remove: F) -> Result<usize, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    for file in &plan.delete {
        remove(file.path.clone()).await?;
    }
    Ok(plan.delete.len())
}
