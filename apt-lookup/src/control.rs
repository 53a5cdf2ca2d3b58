// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Control-style stanza primitives.

`apt-cache` and friends emit package records as RFC822-style paragraphs:
`Key: Value` lines separated by blank lines, with indented lines continuing
the previous field's value. See
<https://www.debian.org/doc/debian-policy/ch-controlfields.html> for the
canonical description of the format.

The parser here is deliberately tolerant: the tools interleave diagnostics
with record output, so a line that is neither a field start nor a
continuation is skipped rather than treated as an error. A block that yields
no fields at all produces an empty paragraph, which downstream selection
ignores.
*/

use {
    crate::error::{LookupError, Result},
    std::io::BufRead,
};

/// A single field in a control stanza.
///
/// The value preserves continuation lines, separated by newlines, so
/// callers can recover the first line of multi-line fields such as
/// `Description`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ControlField {
    name: String,
    value: String,
}

impl ControlField {
    /// Construct an instance from a field name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// The name of this field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value, with original line breaks and continuation indentation.
    pub fn value_str(&self) -> &str {
        &self.value
    }

    /// Iterate over lines in the value, leading whitespace stripped.
    pub fn iter_lines(&self) -> impl Iterator<Item = &str> {
        self.value.lines().map(|line| line.trim_start())
    }

    /// Iterate over whitespace-delimited words in the value.
    pub fn iter_words(&self) -> impl Iterator<Item = &str> {
        self.value.split_ascii_whitespace()
    }
}

/// A paragraph in control file output.
///
/// A paragraph is an ordered series of fields. Iteration order is insertion
/// order. Field names are matched exactly: the apt tools emit canonical
/// capitalization and the record keys are defined with it.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ControlParagraph {
    fields: Vec<ControlField>,
}

impl ControlParagraph {
    /// Whether the paragraph has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Set the value of a field, replacing an existing field of the same name.
    pub fn set_field(&mut self, field: ControlField) {
        self.fields.retain(|cf| cf.name != field.name);
        self.fields.push(field);
    }

    /// Set the value of a field defined via strings.
    pub fn set_field_from_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set_field(ControlField::new(name, value));
    }

    /// Whether a named field is present.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Iterate over fields in insertion order.
    pub fn iter_fields(&self) -> impl Iterator<Item = &ControlField> {
        self.fields.iter()
    }

    /// Obtain the field with a given name.
    pub fn field(&self, name: &str) -> Option<&ControlField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Obtain the raw string value of the named field.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value_str())
    }

    /// Obtain the value of the named field, parsed to a [u64].
    pub fn field_u64(&self, name: &str) -> Option<Result<u64>> {
        self.field_str(name)
            .map(|v| v.parse::<u64>().map_err(LookupError::ParseInt))
    }
}

/// Holds parsing state for control output.
///
/// Instances are fed lines of text and periodically emit [ControlParagraph]
/// instances as blank lines complete them.
#[derive(Clone, Debug, Default)]
pub struct ControlFileParser {
    paragraph: ControlParagraph,
    field: Option<String>,
}

impl ControlFileParser {
    /// Write a line to the parser.
    ///
    /// If the line terminates an in-progress paragraph, that paragraph is
    /// returned. Malformed lines are dropped silently.
    pub fn write_line(&mut self, line: &str) -> Option<ControlParagraph> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        let is_empty_line = line.trim().is_empty();
        let is_continuation = line.starts_with(|c: char| c.is_ascii_whitespace());

        let current_field = self.field.take();

        // Empty lines end the current paragraph. Flush any state.
        if is_empty_line {
            if let Some(field) = current_field {
                self.flush_field(field);
            }

            return if self.paragraph.is_empty() {
                None
            } else {
                Some(std::mem::take(&mut self.paragraph))
            };
        }

        match (current_field, is_continuation) {
            // An unindented line begins a new field. Flush the previous one.
            (Some(v), false) => {
                self.flush_field(v);
                self.field = Some(line.to_string());
            }
            (None, false) => {
                self.field = Some(line.to_string());
            }
            // An indented line continues the value of the current field.
            (Some(mut v), true) => {
                v.push('\n');
                v.push_str(line);
                self.field = Some(v);
            }
            // A continuation with no field in progress has nothing to attach
            // to. Skip it.
            (None, true) => {}
        }

        None
    }

    /// Finish parsing, consuming self.
    ///
    /// Returns the final paragraph if any unflushed state is present.
    pub fn finish(mut self) -> Option<ControlParagraph> {
        if let Some(field) = self.field.take() {
            self.flush_field(field);
        }

        if self.paragraph.is_empty() {
            None
        } else {
            Some(self.paragraph)
        }
    }

    fn flush_field(&mut self, v: String) {
        // Lines without a colon cannot start a field. They are typically
        // tool diagnostics and carry no record data.
        if let Some((name, value)) = v.split_once(':') {
            self.paragraph
                .set_field_from_string(name.to_string(), value.trim().to_string());
        }
    }
}

/// An iterator of [ControlParagraph] read from a [BufRead].
pub struct ControlParagraphReader<R: BufRead> {
    reader: R,
    parser: Option<ControlFileParser>,
}

impl<R: BufRead> ControlParagraphReader<R> {
    /// Create a new instance bound to a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            parser: Some(ControlFileParser::default()),
        }
    }

    /// Consumes the instance, returning the original reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn get_next(&mut self, mut parser: ControlFileParser) -> Result<Option<ControlParagraph>> {
        loop {
            let mut line = String::new();
            let bytes_read = self.reader.read_line(&mut line)?;

            if bytes_read == 0 {
                return Ok(parser.finish());
            }

            if let Some(paragraph) = parser.write_line(&line) {
                self.parser.replace(parser);
                return Ok(Some(paragraph));
            }
        }
    }
}

impl<R: BufRead> Iterator for ControlParagraphReader<R> {
    type Item = Result<ControlParagraph>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.parser.take() {
            None => None,
            Some(parser) => match self.get_next(parser) {
                Ok(Some(para)) => Some(Ok(para)),
                Ok(None) => None,
                Err(e) => Some(Err(e)),
            },
        }
    }
}

/// An ordered series of paragraphs parsed from tool output.
#[derive(Clone, Debug, Default)]
pub struct ControlFile {
    paragraphs: Vec<ControlParagraph>,
}

impl ControlFile {
    /// Construct an instance by parsing data from a reader.
    pub fn parse_reader<R: BufRead>(reader: &mut R) -> Result<Self> {
        let mut paragraphs = Vec::new();

        for para in ControlParagraphReader::new(reader) {
            paragraphs.push(para?);
        }

        Ok(Self { paragraphs })
    }

    /// Parse paragraphs from a string.
    ///
    /// Infallible: the grammar skips anything it cannot interpret.
    pub fn parse_str(s: &str) -> Self {
        let mut paragraphs = Vec::new();
        let mut parser = ControlFileParser::default();

        for line in s.lines() {
            if let Some(paragraph) = parser.write_line(line) {
                paragraphs.push(paragraph);
            }
        }

        if let Some(paragraph) = parser.finish() {
            paragraphs.push(paragraph);
        }

        Self { paragraphs }
    }

    /// Obtain paragraphs in this record set.
    pub fn paragraphs(&self) -> impl Iterator<Item = &ControlParagraph> {
        self.paragraphs.iter()
    }

    /// Obtain paragraphs in this record set, consuming self.
    pub fn into_paragraphs(self) -> impl Iterator<Item = ControlParagraph> {
        self.paragraphs.into_iter()
    }
}
