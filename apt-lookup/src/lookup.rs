// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Lookup orchestration.

Ties the pieces together: sanitize the query, validate the distribution,
invoke the index tools, parse their output into records, select the highest
version, and classify the result as one terminal [LookupOutcome] per query.

Every path produces an outcome that renders to a user-facing reply; tool
failures map to outcomes instead of propagating. Conditions that indicate a
misconfigured deployment rather than a bad query (`ToolUnavailable`,
`CacheStale`, `LookupFailed`) are additionally logged for operators.
*/

use {
    crate::{
        control::{ControlFile, ControlParagraph},
        distro::DistroRegistry,
        invoker::{AptInvoker, IndexInvoker, IndexMode},
        package_record::PackageRecord,
        package_version::compare_version_strings,
        query::Query,
    },
    log::{error, warn},
    std::{cmp::Ordering, path::PathBuf, time::Duration},
};

/// Immutable lookup configuration.
#[derive(Clone, Debug)]
pub struct LookupConfig {
    /// Directory holding per-distro `.list` files and cache state.
    pub aptdir: PathBuf,
    /// Architecture the binary indices were built for.
    pub architecture: String,
    /// Base URL of the web package search users are pointed at when the
    /// file-search tool is unavailable.
    pub search_url: String,
    /// Upper bound on a single external tool invocation.
    pub command_timeout: Duration,
}

impl LookupConfig {
    pub fn new(aptdir: impl Into<PathBuf>) -> Self {
        Self {
            aptdir: aptdir.into(),
            architecture: "i386".to_string(),
            search_url: "http://packages.ubuntu.com/".to_string(),
            command_timeout: Duration::from_secs(30),
        }
    }
}

/// Terminal outcome of a lookup. Exactly one is produced per query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LookupOutcome {
    /// The input contained no term to look up; no tool was invoked.
    EmptyQuery,
    /// The requested distribution is not in the registry.
    InvalidDistro { distro: String, known: Vec<String> },
    /// A name search matched one or more packages.
    PackagesFound { names: Vec<String> },
    /// The best-versioned record for an info lookup.
    PackageInfo {
        record: PackageRecord,
        distro: String,
        /// Architecture of the matching source package, when restricted.
        source_architecture: Option<String>,
        /// Expanded per-distro URL to append to the reply.
        url: Option<String>,
    },
    /// A file-contents search matched one or more packages.
    FileFound { term: String, locations: Vec<String> },
    /// The file-search tool asked us to defer to the web search.
    ContentsSearchUrl { url: String },
    /// Info lookup for a package that does not exist.
    PackageNotFound { term: String, distro: String },
    /// Neither the package nor the file search matched.
    NothingFound { term: String, distro: String },
    /// A package-only search (no file fallback) matched nothing.
    NoPackagesMatched { term: String },
    /// A required external tool is missing or failed to run.
    ToolUnavailable { search_url: String },
    /// The file-search cache has not been built or is out of date.
    CacheStale,
    /// Tool output could not be interpreted as any package record.
    LookupFailed,
}

/// Select the record with the highest version.
///
/// The accumulator starts from a sentinel version of `"0"`. Records without
/// a `Version` field are skipped as partial blocks rather than errors.
/// Returns [None] when no record beat the sentinel, i.e. the set was empty
/// or nothing carried a version.
pub fn select_best<'a, I, F>(paragraphs: I, compare: F) -> Option<&'a ControlParagraph>
where
    I: IntoIterator<Item = &'a ControlParagraph>,
    F: Fn(&str, &str) -> Ordering,
{
    let mut best: Option<&ControlParagraph> = None;
    let mut best_version = "0";

    for paragraph in paragraphs {
        let version = match paragraph.field_str("Version") {
            Some(version) => version,
            None => continue,
        };

        if compare(best_version, version) == Ordering::Less {
            best_version = version;
            best = Some(paragraph);
        }
    }

    best
}

/// Answers package lookup queries against local APT mirrors.
pub struct PackageLookup<I> {
    config: LookupConfig,
    registry: DistroRegistry,
    invoker: I,
}

impl PackageLookup<AptInvoker> {
    /// Construct a production instance shelling out to the index tools.
    ///
    /// The registry is loaded once, here; it is immutable afterwards.
    pub fn new(config: LookupConfig) -> Self {
        let registry = DistroRegistry::load(&config.aptdir);
        let invoker = AptInvoker::new(
            &config.aptdir,
            config.architecture.clone(),
            config.command_timeout,
        );

        Self {
            config,
            registry,
            invoker,
        }
    }
}

impl<I: IndexInvoker> PackageLookup<I> {
    /// Construct an instance with an explicit registry and invoker.
    pub fn with_invoker(config: LookupConfig, registry: DistroRegistry, invoker: I) -> Self {
        Self {
            config,
            registry,
            invoker,
        }
    }

    /// The loaded distribution registry.
    pub fn registry(&self) -> &DistroRegistry {
        &self.registry
    }

    /// Search for packages matching `input`, optionally falling back to a
    /// file-contents search when no package name matches.
    pub fn find(&self, input: &str, default_distro: &str, file_lookup: bool) -> LookupOutcome {
        let query = Query::parse(input, default_distro);

        if let Some(outcome) = self.validate(&query) {
            return outcome;
        }

        let data = match self
            .invoker
            .query_index(&query.distro, IndexMode::Search, &query.term)
        {
            Ok(data) => data,
            Err(e) => {
                error!("apt-cache search failed for {}: {}", query.distro, e);
                return self.tool_unavailable();
            }
        };

        if !data.trim().is_empty() {
            let names = data
                .lines()
                .filter_map(|line| line.split_whitespace().next())
                .map(String::from)
                .collect();

            return LookupOutcome::PackagesFound { names };
        }

        if file_lookup {
            self.find_file(query)
        } else {
            LookupOutcome::NoPackagesMatched { term: query.term }
        }
    }

    /// Produce the detailed record for the best-versioned match of a
    /// package name.
    pub fn info(&self, input: &str, default_distro: &str) -> LookupOutcome {
        let query = Query::parse(input, default_distro);

        if let Some(outcome) = self.validate(&query) {
            return outcome;
        }

        let data = match self
            .invoker
            .query_index(&query.distro, IndexMode::Show, &query.term)
        {
            Ok(data) => data,
            Err(e) => {
                error!("apt-cache show failed for {}: {}", query.distro, e);
                return self.tool_unavailable();
            }
        };

        if data.trim().is_empty() || data.contains("E: No packages found") {
            return LookupOutcome::PackageNotFound {
                term: query.term,
                distro: query.distro,
            };
        }

        let records = ControlFile::parse_str(&data);

        let best = match select_best(records.paragraphs(), compare_version_strings) {
            Some(best) => best,
            None => {
                error!(
                    "no usable record in apt-cache show output for {}; \
                     are the deb-src entries in {}.list correct?",
                    query.distro, query.distro
                );
                return LookupOutcome::LookupFailed;
            }
        };

        let record = PackageRecord::from(best.clone());
        if record.package().is_err() {
            error!(
                "record selected for {} in {} has no Package field",
                query.term, query.distro
            );
            return LookupOutcome::LookupFailed;
        }

        let url = self.registry.package_url(&query.distro, best);
        let source_architecture = self.source_architecture(&query);

        LookupOutcome::PackageInfo {
            record,
            distro: query.distro,
            source_architecture,
            url,
        }
    }

    fn validate(&self, query: &Query) -> Option<LookupOutcome> {
        if query.is_empty() {
            return Some(LookupOutcome::EmptyQuery);
        }

        if !self.registry.contains(&query.distro) {
            return Some(LookupOutcome::InvalidDistro {
                distro: query.distro.clone(),
                known: self.registry.names().to_vec(),
            });
        }

        None
    }

    fn find_file(&self, query: Query) -> LookupOutcome {
        let data = match self.invoker.search_files(&query.distro, &query.term) {
            Ok(data) => data,
            Err(e) => {
                error!("apt-file failed for {}: {}", query.distro, e);
                return self.tool_unavailable();
            }
        };

        let tokens = data.split_whitespace().collect::<Vec<_>>();

        match tokens.first() {
            None => LookupOutcome::NothingFound {
                term: query.term,
                distro: query.distro,
            },
            // The shell reports a missing apt-file binary on the first token.
            Some(&"sh:") => {
                error!("apt-file is not installed");
                self.tool_unavailable()
            }
            // apt-file reports a missing cache directory as an E: line.
            Some(&"E:") => {
                error!(
                    "apt-file cache for {} is missing; refresh it before searching",
                    query.distro
                );
                LookupOutcome::CacheStale
            }
            Some(&"Use") if tokens.get(1) == Some(&"of") => LookupOutcome::ContentsSearchUrl {
                url: self.contents_search_url(&query),
            },
            Some(_) => LookupOutcome::FileFound {
                term: query.term,
                locations: tokens.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    fn source_architecture(&self, query: &Query) -> Option<String> {
        match self
            .invoker
            .query_index(&query.distro, IndexMode::ShowSrc, &query.term)
        {
            Ok(data) => {
                let sources = ControlFile::parse_str(&data);

                select_best(sources.paragraphs(), compare_version_strings)
                    .and_then(|p| p.field_str("Architecture"))
                    .map(String::from)
            }
            Err(e) => {
                warn!("apt-cache showsrc failed for {}: {}", query.distro, e);
                None
            }
        }
    }

    fn contents_search_url(&self, query: &Query) -> String {
        let keywords: String =
            url::form_urlencoded::byte_serialize(query.term.as_bytes()).collect();

        format!(
            "{}search?searchon=contents&keywords={}&mode=&suite={}&arch=any",
            self.config.search_url, keywords, query.distro
        )
    }

    fn tool_unavailable(&self) -> LookupOutcome {
        LookupOutcome::ToolUnavailable {
            search_url: self.config.search_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, indoc::indoc};

    const VIM_SHOW: &str = indoc! {"
        Package: vim
        Priority: optional
        Section: editors
        Installed-Size: 3000
        Source: vim
        Version: 2:7.1-1
        Size: 1024000
        Description: Vi Improved
         An almost compatible version of the UNIX editor Vi.
    "};

    const VIM_SHOWSRC: &str = indoc! {"
        Package: vim
        Version: 2:7.1-1
        Architecture: any
    "};

    #[derive(Default)]
    struct StaticInvoker {
        search: &'static str,
        show: &'static str,
        showsrc: &'static str,
        files: &'static str,
    }

    impl IndexInvoker for StaticInvoker {
        fn query_index(
            &self,
            _distro: &str,
            mode: IndexMode,
            _term: &str,
        ) -> crate::error::Result<String> {
            Ok(match mode {
                IndexMode::Search => self.search,
                IndexMode::Show => self.show,
                IndexMode::ShowSrc => self.showsrc,
            }
            .to_string())
        }

        fn search_files(&self, _distro: &str, _term: &str) -> crate::error::Result<String> {
            Ok(self.files.to_string())
        }
    }

    fn lookup(invoker: StaticInvoker) -> PackageLookup<StaticInvoker> {
        lookup_with_distros(invoker, &["hardy"])
    }

    fn lookup_with_distros(
        invoker: StaticInvoker,
        distros: &[&str],
    ) -> PackageLookup<StaticInvoker> {
        let dir = tempfile::tempdir().unwrap();
        for distro in distros {
            std::fs::write(dir.path().join(format!("{}.list", distro)), "").unwrap();
        }

        let registry = DistroRegistry::load(dir.path());
        PackageLookup::with_invoker(LookupConfig::new(dir.path()), registry, invoker)
    }

    fn paragraph(fields: &[(&str, &str)]) -> ControlParagraph {
        let mut p = ControlParagraph::default();
        for (name, value) in fields {
            p.set_field_from_string(*name, *value);
        }
        p
    }

    #[test]
    fn select_best_picks_highest_version() {
        let records = vec![
            paragraph(&[("Package", "foo"), ("Version", "1.0-1")]),
            paragraph(&[("Package", "foo"), ("Version", "1:0.5")]),
            paragraph(&[("Package", "foo"), ("Version", "2.0")]),
        ];

        let best = select_best(&records, compare_version_strings).unwrap();
        assert_eq!(best.field_str("Version"), Some("1:0.5"));
    }

    #[test]
    fn select_best_skips_unversioned_records() {
        let records = vec![
            paragraph(&[("Package", "foo")]),
            ControlParagraph::default(),
            paragraph(&[("Package", "foo"), ("Version", "1.0")]),
        ];

        let best = select_best(&records, compare_version_strings).unwrap();
        assert_eq!(best.field_str("Version"), Some("1.0"));
    }

    #[test]
    fn select_best_empty_or_unversioned_is_none() {
        assert!(select_best(&[], compare_version_strings).is_none());

        let records = vec![paragraph(&[("Package", "foo")])];
        assert!(select_best(&records, compare_version_strings).is_none());
    }

    #[test]
    fn select_best_first_of_equal_versions_wins() {
        let records = vec![
            paragraph(&[("Package", "a"), ("Version", "1.0")]),
            paragraph(&[("Package", "b"), ("Version", "1.0")]),
        ];

        let best = select_best(&records, compare_version_strings).unwrap();
        assert_eq!(best.field_str("Package"), Some("a"));
    }

    #[test]
    fn info_formats_full_reply() {
        let lookup = lookup(StaticInvoker {
            show: VIM_SHOW,
            showsrc: VIM_SHOWSRC,
            ..Default::default()
        });

        let outcome = lookup.info("vim hardy", "hardy");
        assert_eq!(
            outcome.to_string(),
            "vim (source: vim): Vi Improved. In component main, is optional. \
             Version 2:7.1-1 (hardy), package size 1000 kB, installed size 3000 kB"
        );
    }

    #[test]
    fn info_selects_highest_version() {
        let lookup = lookup(StaticInvoker {
            show: indoc! {"
                Package: vim
                Version: 1:7.0-1
                Description: old

                Package: vim
                Version: 2:7.1-1
                Description: new
            "},
            showsrc: VIM_SHOWSRC,
            ..Default::default()
        });

        match lookup.info("vim", "hardy") {
            LookupOutcome::PackageInfo { record, .. } => {
                assert_eq!(record.version_str().unwrap(), "2:7.1-1");
                assert_eq!(record.description(), Some("new"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn info_arch_restricted_source_adds_suffix() {
        let lookup = lookup(StaticInvoker {
            show: VIM_SHOW,
            showsrc: indoc! {"
                Package: vim
                Version: 2:7.1-1
                Architecture: i386
            "},
            ..Default::default()
        });

        let reply = lookup.info("vim", "hardy").to_string();
        assert!(
            reply.ends_with("installed size 3000 kB (Only available for i386)"),
            "reply was {:?}",
            reply
        );
    }

    #[test]
    fn info_unknown_package() {
        let lookup = lookup(StaticInvoker {
            show: "W: Unable to locate package nosuch\nE: No packages found\n",
            ..Default::default()
        });

        assert_eq!(
            lookup.info("nosuch", "hardy").to_string(),
            "Package nosuch does not exist in hardy"
        );
    }

    #[test]
    fn info_unparseable_output_fails_lookup() {
        let lookup = lookup(StaticInvoker {
            show: "E. something went badly wrong inside apt\n",
            ..Default::default()
        });

        assert_eq!(
            lookup.info("vim", "hardy"),
            LookupOutcome::LookupFailed
        );
    }

    #[test]
    fn info_empty_query_is_silent() {
        let lookup = lookup(StaticInvoker::default());
        let outcome = lookup.info("   ", "hardy");
        assert_eq!(outcome, LookupOutcome::EmptyQuery);
        assert_eq!(outcome.to_string(), "");
    }

    #[test]
    fn invalid_distro_lists_known_distros() {
        let lookup = lookup_with_distros(StaticInvoker::default(), &["hardy", "dapper"]);

        assert_eq!(
            lookup.info("vim breezy", "hardy").to_string(),
            "breezy is not a valid distribution: dapper, hardy"
        );
        assert_eq!(
            lookup.find("vim breezy", "hardy", true).to_string(),
            "breezy is not a valid distribution: dapper, hardy"
        );
    }

    #[test]
    fn find_lists_matches() {
        let lookup = lookup(StaticInvoker {
            search: "vim - Vi IMproved\nvim-tiny - compact version\n",
            ..Default::default()
        });

        assert_eq!(
            lookup.find("vim", "hardy", true).to_string(),
            "Found: vim, vim-tiny"
        );
    }

    #[test]
    fn find_truncates_long_match_lists() {
        let lookup = lookup(StaticInvoker {
            search: "p1 - x\np2 - x\np3 - x\np4 - x\np5 - x\np6 - x\np7 - x\n",
            ..Default::default()
        });

        assert_eq!(
            lookup.find("p", "hardy", true).to_string(),
            "Found: p1, p2, p3, p4, p5 (and 2 others)"
        );
    }

    #[test]
    fn find_falls_back_to_file_search() {
        let lookup = lookup(StaticInvoker {
            files: "vim\nvim-tiny\n",
            ..Default::default()
        });

        assert_eq!(
            lookup.find("vimrc", "hardy", true).to_string(),
            "File vimrc found in vim, vim-tiny"
        );
    }

    #[test]
    fn find_file_truncates_long_lists() {
        let lookup = lookup(StaticInvoker {
            files: "a b c d e f g h\n",
            ..Default::default()
        });

        assert_eq!(
            lookup.find("x", "hardy", true).to_string(),
            "File x found in a, b, c, d, e (and 3 others)"
        );
    }

    #[test]
    fn find_missing_apt_file_directs_to_web_search() {
        let lookup = lookup(StaticInvoker {
            files: "sh: apt-file: not found\n",
            ..Default::default()
        });

        assert_eq!(
            lookup.find("vimrc", "hardy", true).to_string(),
            "Please use http://packages.ubuntu.com/ to search for files"
        );
    }

    #[test]
    fn find_stale_cache_is_reported() {
        let lookup = lookup(StaticInvoker {
            files: "E: The cache directory is empty.\n",
            ..Default::default()
        });

        assert_eq!(
            lookup.find("vimrc", "hardy", true).to_string(),
            "Cache out of date, please contact the administrator"
        );
    }

    #[test]
    fn find_use_of_builds_search_url() {
        let lookup = lookup(StaticInvoker {
            files: "Use of uninitialized value in join\n",
            ..Default::default()
        });

        assert_eq!(
            lookup.find("libfoo.so++", "hardy", true).to_string(),
            "http://packages.ubuntu.com/search?searchon=contents&\
             keywords=libfoo.so%2B%2B&mode=&suite=hardy&arch=any"
        );
    }

    #[test]
    fn find_nothing_anywhere() {
        let lookup = lookup(StaticInvoker::default());

        assert_eq!(
            lookup.find("nosuch", "hardy", true).to_string(),
            "Package/file nosuch does not exist in hardy"
        );
    }

    #[test]
    fn find_package_only_skips_file_search() {
        let lookup = lookup(StaticInvoker {
            // Would match if the fallback ran.
            files: "vim\n",
            ..Default::default()
        });

        assert_eq!(
            lookup.find("nosuch", "hardy", false).to_string(),
            "No packages matching 'nosuch' could be found"
        );
    }

    #[test]
    fn info_appends_distro_url() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hardy.list"), "").unwrap();
        std::fs::write(
            dir.path().join("hardy.url"),
            "http://packages.example.com/%(Distribution)s/%(Package)s\n",
        )
        .unwrap();

        let registry = DistroRegistry::load(dir.path());
        let lookup = PackageLookup::with_invoker(
            LookupConfig::new(dir.path()),
            registry,
            StaticInvoker {
                show: VIM_SHOW,
                showsrc: VIM_SHOWSRC,
                ..Default::default()
            },
        );

        let reply = lookup.info("vim", "hardy").to_string();
        assert!(
            reply.ends_with(" - see http://packages.example.com/hardy/vim"),
            "reply was {:?}",
            reply
        );
    }
}
