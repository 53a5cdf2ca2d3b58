// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian package version string handling.

Version ordering follows
<https://www.debian.org/doc/debian-policy/ch-controlfields.html#version>:
an optional numeric epoch, an upstream version, and an optional revision,
with components compared by alternating non-digit and digit runs under a
modified lexical order in which a tilde sorts before anything (including the
end of a component) and letters sort before non-letters.
*/

use {
    std::{
        cmp::Ordering,
        fmt::{Display, Formatter},
        num::ParseIntError,
        str::FromStr,
    },
    thiserror::Error,
};

#[derive(Clone, Debug, Error)]
pub enum VersionError {
    #[error("error parsing string to integer: {0}")]
    ParseInt(#[from] ParseIntError),

    #[error("the epoch component has non-digit characters: {0}")]
    EpochNonNumeric(String),

    #[error("upstream version component has illegal character: {0}")]
    UpstreamIllegalChar(String),

    #[error("revision component has illegal character: {0}")]
    RevisionIllegalChar(String),
}

pub type Result<T> = std::result::Result<T, VersionError>;

/// Split a version string into its `(epoch, upstream, revision)` parts.
///
/// The epoch is everything before the first colon; the revision everything
/// after the last hyphen. No validation is performed.
fn split_segments(s: &str) -> (Option<&str>, &str, Option<&str>) {
    let (epoch, remainder) = match s.find(':') {
        Some(pos) => (Some(&s[..pos]), &s[pos + 1..]),
        None => (None, s),
    };

    let (upstream, revision) = match remainder.rfind('-') {
        Some(pos) => (&remainder[..pos], Some(&remainder[pos + 1..])),
        None => (remainder, None),
    };

    (epoch, upstream, revision)
}

/// A Debian package version.
///
/// The concise format is `[epoch:]upstream_version[-debian_revision]` and
/// each component has rules about what characters are allowed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PackageVersion {
    epoch: Option<u32>,
    upstream_version: String,
    debian_revision: Option<String>,
}

impl PackageVersion {
    /// Construct an instance by parsing a version string.
    pub fn parse(s: &str) -> Result<Self> {
        let (epoch, upstream, revision) = split_segments(s);

        let epoch = match epoch {
            Some(epoch) => {
                if !epoch.chars().all(|c| c.is_ascii_digit()) {
                    return Err(VersionError::EpochNonNumeric(s.to_string()));
                }

                Some(u32::from_str(epoch)?)
            }
            None => None,
        };

        // The upstream version may contain only alphanumerics and `. + ~`,
        // plus hyphens when a revision is present.
        if !upstream.chars().all(|c| match c {
            c if c.is_ascii_alphanumeric() => true,
            '.' | '+' | '~' => true,
            '-' => revision.is_some(),
            _ => false,
        }) {
            return Err(VersionError::UpstreamIllegalChar(s.to_string()));
        }

        let debian_revision = match revision {
            Some(revision) => {
                if !revision
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '~'))
                {
                    return Err(VersionError::RevisionIllegalChar(s.to_string()));
                }

                Some(revision.to_string())
            }
            None => None,
        };

        Ok(Self {
            epoch,
            upstream_version: upstream.to_string(),
            debian_revision,
        })
    }

    /// The `epoch` component, if explicitly present.
    pub fn epoch(&self) -> Option<u32> {
        self.epoch
    }

    /// The `epoch` component, with the assumed default of `0`.
    pub fn epoch_assumed(&self) -> u32 {
        self.epoch.unwrap_or(0)
    }

    /// The `upstream_version` component.
    pub fn upstream_version(&self) -> &str {
        &self.upstream_version
    }

    /// The `debian_revision` component, if present.
    pub fn debian_revision(&self) -> Option<&str> {
        self.debian_revision.as_deref()
    }
}

impl Display for PackageVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(epoch) = self.epoch {
            write!(f, "{}:", epoch)?;
        }

        f.write_str(&self.upstream_version)?;

        if let Some(revision) = &self.debian_revision {
            write!(f, "-{}", revision)?;
        }

        Ok(())
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch_assumed()
            .cmp(&other.epoch_assumed())
            .then_with(|| compare_component(&self.upstream_version, &other.upstream_version))
            .then_with(|| {
                compare_component(
                    self.debian_revision.as_deref().unwrap_or("0"),
                    other.debian_revision.as_deref().unwrap_or("0"),
                )
            })
    }
}

/// Compare two version strings under the policy total order.
///
/// Unlike [PackageVersion::parse] this never fails: strings that do not
/// satisfy the character rules are still ordered by the same component
/// comparison, so arbitrary `Version` fields scraped from tool output (and
/// the `"0"` selection sentinel) always compare.
pub fn compare_version_strings(a: &str, b: &str) -> Ordering {
    match (PackageVersion::parse(a), PackageVersion::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => {
            let (a_epoch, a_upstream, a_revision) = split_segments(a);
            let (b_epoch, b_upstream, b_revision) = split_segments(b);

            lenient_epoch(a_epoch)
                .cmp(&lenient_epoch(b_epoch))
                .then_with(|| compare_component(a_upstream, b_upstream))
                .then_with(|| {
                    compare_component(a_revision.unwrap_or("0"), b_revision.unwrap_or("0"))
                })
        }
    }
}

fn lenient_epoch(epoch: Option<&str>) -> u64 {
    epoch.map_or(0, |s| u64::from_str(s).unwrap_or(0))
}

/// Sort weight of a character in the modified lexical order.
///
/// End-of-component is weighted 0, so a tilde sorts before a missing
/// character and every other character after it.
fn char_weight(c: Option<char>) -> i64 {
    match c {
        None => 0,
        Some('~') => -1,
        Some(c) if c.is_ascii_alphabetic() => c as i64,
        Some(c) => c as i64 + 0x100,
    }
}

fn compare_nondigit_runs(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars();
    let mut b_chars = b.chars();

    loop {
        let (a_char, b_char) = (a_chars.next(), b_chars.next());

        if a_char.is_none() && b_char.is_none() {
            return Ordering::Equal;
        }

        match char_weight(a_char).cmp(&char_weight(b_char)) {
            Ordering::Equal => {}
            res => return res,
        }
    }
}

/// Numeric comparison of two digit runs of arbitrary length.
fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');

    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Split a string into its leading non-digit run and the remainder.
fn split_nondigit_run(s: &str) -> (&str, &str) {
    let pos = s
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(s.len());
    s.split_at(pos)
}

/// Split a string into its leading digit run and the remainder.
fn split_digit_run(s: &str) -> (&str, &str) {
    let pos = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    s.split_at(pos)
}

/// Compare one version component (upstream or revision) using Debian rules.
///
/// Alternates between the leading non-digit runs, compared under the
/// modified lexical order, and the leading digit runs, compared numerically
/// with an empty run counting as zero.
fn compare_component(a: &str, b: &str) -> Ordering {
    let mut a_remaining = a;
    let mut b_remaining = b;

    loop {
        let (a_nondigit, a_rest) = split_nondigit_run(a_remaining);
        let (b_nondigit, b_rest) = split_nondigit_run(b_remaining);

        match compare_nondigit_runs(a_nondigit, b_nondigit) {
            Ordering::Equal => {}
            res => return res,
        }

        let (a_digits, a_rest) = split_digit_run(a_rest);
        let (b_digits, b_rest) = split_digit_run(b_rest);

        match compare_digit_runs(a_digits, b_digits) {
            Ordering::Equal => {}
            res => return res,
        }

        if a_rest.is_empty() && b_rest.is_empty() {
            return Ordering::Equal;
        }

        a_remaining = a_rest;
        b_remaining = b_rest;
    }
}
