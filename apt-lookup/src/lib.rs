// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Package lookup against local APT repository mirrors.

This crate answers free-text package queries by driving the external
`apt-cache` and `apt-file` tools against a directory of per-distribution
mirror state, scraping their control-style output, and rendering a
single-line reply. It is the lookup core of a chat bot; protocol handling
belongs to the host framework.

# A Tour of Functionality

The [distro] module loads the set of valid distribution identifiers from a
directory of `<distro>.list` files ([distro::DistroRegistry]). The [query]
module reduces untrusted free text to a sanitized term and target
distribution ([query::Query]).

Control-style output parsing lives in [control]: [control::ControlParagraph]
is one record of [control::ControlField]s, [control::ControlFile] a parsed
record set, and [control::ControlParagraphReader] a streaming reader.

The [package_version] module implements Debian version string parsing,
serialization, and policy-order comparison ([package_version::PackageVersion],
[package_version::compare_version_strings]). [package_record::PackageRecord]
gives typed access to the fields of a binary package record.

The [invoker] module defines the [invoker::IndexInvoker] boundary to the
external tools and the production [invoker::AptInvoker] that shells out with
per-distro cache overrides and a bounded timeout.

[lookup::PackageLookup] orchestrates a query end to end and classifies the
result as one [lookup::LookupOutcome], whose [std::fmt::Display]
implementation in [reply] renders the reply line.
*/

pub mod control;
pub mod distro;
pub mod error;
pub mod invoker;
pub mod lookup;
pub mod package_record;
pub mod package_version;
pub mod query;
pub mod reply;
