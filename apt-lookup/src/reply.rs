// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Reply rendering.

Every [LookupOutcome] renders to a single human-readable line via
[Display]. The texts are load-bearing: downstream bots relay them verbatim
to users, so changes here are user-visible.
*/

use {
    crate::lookup::LookupOutcome,
    std::fmt::{Display, Formatter},
};

/// Match lists longer than this are truncated with an `(and N others)` tail.
const LIST_LIMIT: usize = 5;

fn join_limited(items: &[String]) -> String {
    if items.len() > LIST_LIMIT {
        format!(
            "{} (and {} others)",
            items[..LIST_LIMIT].join(", "),
            items.len() - LIST_LIMIT
        )
    } else {
        items.join(", ")
    }
}

impl Display for LookupOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyQuery => Ok(()),

            Self::InvalidDistro { distro, known } => write!(
                f,
                "{} is not a valid distribution: {}",
                distro,
                known.join(", ")
            ),

            Self::PackagesFound { names } => write!(f, "Found: {}", join_limited(names)),

            Self::FileFound { term, locations } => {
                write!(f, "File {} found in {}", term, join_limited(locations))
            }

            Self::ContentsSearchUrl { url } => f.write_str(url),

            Self::PackageNotFound { term, distro } => {
                write!(f, "Package {} does not exist in {}", term, distro)
            }

            Self::NothingFound { term, distro } => {
                write!(f, "Package/file {} does not exist in {}", term, distro)
            }

            Self::NoPackagesMatched { term } => {
                write!(f, "No packages matching '{}' could be found", term)
            }

            Self::ToolUnavailable { search_url } => {
                write!(f, "Please use {} to search for files", search_url)
            }

            Self::CacheStale => f.write_str("Cache out of date, please contact the administrator"),

            Self::LookupFailed => f.write_str("Package lookup failed"),

            Self::PackageInfo {
                record,
                distro,
                source_architecture,
                url,
            } => {
                let name = record.field_str("Package").unwrap_or("unknown");
                let source = match record.source() {
                    Some(source) if !source.is_empty() => source,
                    _ => name,
                };
                let description = record.description_first_line().unwrap_or("");
                let priority = record.priority().unwrap_or("unknown");
                let version = record.field_str("Version").unwrap_or("0");
                let size_kb = record.size().and_then(|r| r.ok()).unwrap_or(0) / 1024;
                let installed_size = record.installed_size_str().unwrap_or("0");

                write!(
                    f,
                    "{} (source: {}): {}. In component {}, is {}. \
                     Version {} ({}), package size {} kB, installed size {} kB",
                    name,
                    source,
                    description,
                    record.component(),
                    priority,
                    version,
                    distro,
                    size_kb,
                    installed_size
                )?;

                match source_architecture.as_deref() {
                    Some(arch) if arch != "all" && arch != "any" => {
                        write!(f, " (Only available for {})", arch)?;
                    }
                    _ => {}
                }

                if let Some(url) = url {
                    write!(f, " - see {}", url)?;
                }

                Ok(())
            }
        }
    }
}
