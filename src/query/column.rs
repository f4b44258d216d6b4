//! Columns stored by the engine and the filters a scan can request.

use std::fmt;

use bytes::Bytes;

use super::error::ConfigError;

/// Separator between family and qualifier in a raw column specifier.
pub const COLUMN_SEPARATOR: char = ':';

/// A stored column: family plus qualifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Column {
    family: Bytes,
    qualifier: Bytes,
}

impl Column {
    /// Build a column from its family and qualifier.
    pub fn new(family: impl Into<Bytes>, qualifier: impl Into<Bytes>) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
        }
    }

    /// Column family.
    pub fn family(&self) -> &Bytes {
        &self.family
    }

    /// Column qualifier.
    pub fn qualifier(&self) -> &Bytes {
        &self.qualifier
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            String::from_utf8_lossy(&self.family),
            COLUMN_SEPARATOR,
            String::from_utf8_lossy(&self.qualifier)
        )
    }
}

/// Restricts a scan to a column family or to a single family/qualifier pair.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnFilter {
    /// Every column in the family.
    Family(Bytes),
    /// Exactly one column.
    FamilyQualifier(Bytes, Bytes),
}

impl ColumnFilter {
    /// Parse `fam` or `fam:qual`.
    ///
    /// Any specifier with two or more separators is rejected with the original
    /// string attached.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.split_once(COLUMN_SEPARATOR) {
            None => Ok(ColumnFilter::Family(Bytes::copy_from_slice(raw.as_bytes()))),
            Some((_, qualifier)) if qualifier.contains(COLUMN_SEPARATOR) => {
                Err(ConfigError::MalformedColumn(raw.to_string()))
            }
            Some((family, qualifier)) => Ok(ColumnFilter::FamilyQualifier(
                Bytes::copy_from_slice(family.as_bytes()),
                Bytes::copy_from_slice(qualifier.as_bytes()),
            )),
        }
    }

    /// Whether `column` passes this filter.
    pub fn matches(&self, column: &Column) -> bool {
        match self {
            ColumnFilter::Family(family) => column.family() == family,
            ColumnFilter::FamilyQualifier(family, qualifier) => {
                column.family() == family && column.qualifier() == qualifier
            }
        }
    }
}
