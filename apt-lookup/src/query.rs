// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Free-text query sanitization.

Queries arrive as untrusted free text and their tokens end up as arguments
to external tools, so everything outside a conservative character set is
dropped before any lookup happens.
*/

/// Keep only characters legal in package names and distro identifiers.
fn sanitize(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+'))
        .collect()
}

/// A sanitized lookup query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Query {
    /// Package or file name to look up.
    pub term: String,
    /// Distribution to search.
    pub distro: String,
}

impl Query {
    /// Decompose free-text input into a term and a target distribution.
    ///
    /// The first whitespace token becomes the term and an optional second
    /// token names the distribution; further tokens are ignored. When no
    /// second token is present, or sanitizing it leaves nothing,
    /// `default_distro` is used.
    pub fn parse(input: &str, default_distro: &str) -> Self {
        let mut tokens = input.split_whitespace();

        let term = tokens.next().map(sanitize).unwrap_or_default();

        let distro = match tokens.next().map(sanitize) {
            Some(distro) if !distro.is_empty() => distro,
            _ => default_distro.to_string(),
        };

        Self { term, distro }
    }

    /// Whether there is nothing to look up.
    pub fn is_empty(&self) -> bool {
        self.term.is_empty()
    }
}
