// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Typed access to binary package records. */

use {
    crate::{
        control::ControlParagraph,
        error::{LookupError, Result},
        package_version::PackageVersion,
    },
    std::ops::{Deref, DerefMut},
};

/// A binary package record scraped from index tool output.
///
/// This is a low-level wrapper around an inner [ControlParagraph]. [Deref]
/// and [DerefMut] can be used to operate on the inner paragraph, and [From]
/// is implemented in both directions for cheap coercion.
///
/// Fields the reply formatter requires have getters returning [Result] and
/// will error if the field is not present. Other fields return [Option].
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PackageRecord {
    paragraph: ControlParagraph,
}

impl Deref for PackageRecord {
    type Target = ControlParagraph;

    fn deref(&self) -> &Self::Target {
        &self.paragraph
    }
}

impl DerefMut for PackageRecord {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.paragraph
    }
}

impl From<ControlParagraph> for PackageRecord {
    fn from(paragraph: ControlParagraph) -> Self {
        Self { paragraph }
    }
}

impl From<PackageRecord> for ControlParagraph {
    fn from(record: PackageRecord) -> Self {
        record.paragraph
    }
}

impl PackageRecord {
    fn required_field_str(&self, name: &'static str) -> Result<&str> {
        self.field_str(name)
            .ok_or(LookupError::RecordRequiredFieldMissing(name))
    }

    /// The `Package` field value.
    pub fn package(&self) -> Result<&str> {
        self.required_field_str("Package")
    }

    /// The `Version` field as its original string.
    pub fn version_str(&self) -> Result<&str> {
        self.required_field_str("Version")
    }

    /// The `Version` field parsed into a [PackageVersion].
    pub fn version(&self) -> Result<PackageVersion> {
        Ok(PackageVersion::parse(self.version_str()?)?)
    }

    /// The `Architecture` field.
    pub fn architecture(&self) -> Option<&str> {
        self.field_str("Architecture")
    }

    /// The `Source` field.
    pub fn source(&self) -> Option<&str> {
        self.field_str("Source")
    }

    /// The `Section` field.
    pub fn section(&self) -> Option<&str> {
        self.field_str("Section")
    }

    /// The `Priority` field.
    pub fn priority(&self) -> Option<&str> {
        self.field_str("Priority")
    }

    /// The `Description` field.
    pub fn description(&self) -> Option<&str> {
        self.field_str("Description")
    }

    /// The synopsis line of the `Description` field.
    pub fn description_first_line(&self) -> Option<&str> {
        self.description().and_then(|d| d.lines().next())
    }

    /// The `Size` field, parsed to a [u64].
    pub fn size(&self) -> Option<Result<u64>> {
        self.field_u64("Size")
    }

    /// The `Installed-Size` field, as reported by the tool.
    pub fn installed_size_str(&self) -> Option<&str> {
        self.field_str("Installed-Size")
    }

    /// The repository component this package belongs to.
    ///
    /// Derived from the `Section` field: the part before the first `/`,
    /// or `main` when the section carries no component prefix.
    pub fn component(&self) -> &str {
        match self.section().and_then(|s| s.split_once('/')) {
            Some((component, _)) => component,
            None => "main",
        }
    }
}
