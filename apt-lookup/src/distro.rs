// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Distribution registry.

A lookup deployment keeps one `<distro>.list` sources file per mirrored
distribution in a single directory, next to the apt cache state. The set of
file names defines which distribution identifiers a query may reference.

A distribution may additionally carry a `<distro>.url` file holding a single
URL template that is appended to info replies, with `%(Field)s` placeholders
expanded from the selected record.
*/

use {
    crate::control::ControlParagraph,
    log::warn,
    once_cell::sync::Lazy,
    regex::Regex,
    std::{collections::HashMap, path::Path},
};

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%\(([A-Za-z][A-Za-z0-9-]*)\)s").unwrap());

/// The set of known distributions, immutable after load.
#[derive(Clone, Debug, Default)]
pub struct DistroRegistry {
    distros: Vec<String>,
    urls: HashMap<String, String>,
}

impl DistroRegistry {
    /// Load the registry from a directory of `<distro>.list` files.
    ///
    /// Fails softly: a missing or unreadable directory produces an empty
    /// registry, which makes every later distro validation fail without
    /// taking the caller down.
    pub fn load(aptdir: &Path) -> Self {
        let mut distros = Vec::new();
        let mut url_files = Vec::new();

        match std::fs::read_dir(aptdir) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let name = entry.file_name();
                    let name = match name.to_str() {
                        Some(name) => name,
                        None => continue,
                    };

                    if let Some(distro) = name.strip_suffix(".list") {
                        distros.push(distro.to_string());
                    } else if name.ends_with(".url") {
                        url_files.push(name.to_string());
                    }
                }
            }
            Err(e) => {
                warn!(
                    "unable to read apt directory {}: {}; no distributions will validate",
                    aptdir.display(),
                    e
                );
            }
        }

        distros.sort();

        let mut registry = Self {
            distros,
            urls: HashMap::new(),
        };

        for name in url_files {
            registry.read_url_file(aptdir, &name);
        }

        registry
    }

    fn read_url_file(&mut self, aptdir: &Path, name: &str) {
        let distro = match name.strip_suffix(".url") {
            Some(distro) => distro.to_string(),
            None => return,
        };

        if !self.contains(&distro) {
            warn!("{} is not a valid distribution (no .list file)", distro);
            return;
        }

        match std::fs::read_to_string(aptdir.join(name)) {
            Ok(content) => {
                let lines = content
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect::<Vec<_>>();

                if let [url] = lines.as_slice() {
                    self.urls.insert(distro, url.to_string());
                } else {
                    warn!("expected 1 line in {}, read {}", name, lines.len());
                }
            }
            Err(e) => {
                warn!("unable to read {}: {}", name, e);
            }
        }
    }

    /// Whether no distributions are known.
    pub fn is_empty(&self) -> bool {
        self.distros.is_empty()
    }

    /// Whether `distro` names a known distribution.
    pub fn contains(&self, distro: &str) -> bool {
        self.distros.iter().any(|d| d == distro)
    }

    /// Known distribution identifiers, sorted.
    pub fn names(&self) -> &[String] {
        &self.distros
    }

    /// The raw URL template configured for a distribution, if any.
    pub fn url_template(&self, distro: &str) -> Option<&str> {
        self.urls.get(distro).map(String::as_str)
    }

    /// Expand the distribution's URL template against a selected record.
    ///
    /// `%(Distribution)s` resolves to the distro name; every other
    /// placeholder resolves to the matching record field. Returns [None]
    /// when no template is configured or a placeholder has no value.
    pub fn package_url(&self, distro: &str, record: &ControlParagraph) -> Option<String> {
        let template = self.url_template(distro)?;

        let mut expanded = String::new();
        let mut last = 0;

        for caps in PLACEHOLDER_RE.captures_iter(template) {
            let placeholder = caps.get(0).expect("capture 0 is the whole match");
            let key = &caps[1];

            let value = if key == "Distribution" {
                Some(distro)
            } else {
                record.field_str(key)
            };

            match value {
                Some(value) => {
                    expanded.push_str(&template[last..placeholder.start()]);
                    expanded.push_str(value);
                    last = placeholder.end();
                }
                None => {
                    warn!("{}.url references unknown field {}", distro, key);
                    return None;
                }
            }
        }

        expanded.push_str(&template[last..]);

        Some(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn load_sorts_and_strips_suffix() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "hardy.list", "");
        write(dir.path(), "dapper.list", "");
        write(dir.path(), "cache", "");

        let registry = DistroRegistry::load(dir.path());
        assert_eq!(registry.names(), &["dapper".to_string(), "hardy".to_string()]);
        assert!(registry.contains("hardy"));
        assert!(!registry.contains("breezy"));
    }

    #[test]
    fn missing_directory_is_empty() {
        let registry = DistroRegistry::load(Path::new("/nonexistent/aptdir"));
        assert!(registry.is_empty());
        assert!(!registry.contains("hardy"));
    }

    #[test]
    fn url_templates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "hardy.list", "");
        write(
            dir.path(),
            "hardy.url",
            "http://packages.example.com/%(Distribution)s/%(Package)s\n",
        );
        // No matching .list file, so the template must be rejected.
        write(dir.path(), "breezy.url", "http://ignored.example.com/\n");

        let registry = DistroRegistry::load(dir.path());
        assert_eq!(
            registry.url_template("hardy"),
            Some("http://packages.example.com/%(Distribution)s/%(Package)s")
        );
        assert_eq!(registry.url_template("breezy"), None);

        let mut record = ControlParagraph::default();
        record.set_field_from_string("Package", "vim");

        assert_eq!(
            registry.package_url("hardy", &record).as_deref(),
            Some("http://packages.example.com/hardy/vim")
        );

        // A placeholder without a record value drops the URL entirely.
        let empty = ControlParagraph::default();
        assert_eq!(registry.package_url("hardy", &empty), None);
    }

    #[test]
    fn url_file_with_multiple_lines_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "hardy.list", "");
        write(dir.path(), "hardy.url", "http://a.example.com/\nhttp://b.example.com/\n");

        let registry = DistroRegistry::load(dir.path());
        assert_eq!(registry.url_template("hardy"), None);
    }
}
