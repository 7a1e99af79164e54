//! Country-code to country-name lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::countries::ISO_3166_ALPHA2;
use crate::error::CountryContextError;
use crate::types::{CountryCode, CountryName};

/// Read-only lookup from a country code to its display name.
///
/// The table's domain is owned by the implementor; the context only reads it.
pub trait CountryNames: Send + Sync {
    /// Returns the name for `code`, or `None` if the code is not in the table.
    fn name_of(&self, code: &CountryCode) -> Option<CountryName>;
}

impl<T: CountryNames + ?Sized> CountryNames for Arc<T> {
    fn name_of(&self, code: &CountryCode) -> Option<CountryName> {
        (**self).name_of(code)
    }
}

/// In-memory country table.
///
/// Serializes as a flat JSON object, e.g. `{"EG": "Egypt", "US": "United States"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryTable {
    entries: BTreeMap<CountryCode, CountryName>,
}

impl CountryTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The ISO 3166-1 alpha-2 table with English short names.
    #[must_use]
    pub fn iso3166() -> Self {
        ISO_3166_ALPHA2.iter().copied().collect()
    }

    /// Parses a JSON object mapping codes to names.
    ///
    /// # Errors
    ///
    /// Returns [`CountryContextError::InvalidTable`] if `json` is not an object
    /// of string values.
    pub fn from_json(json: &str) -> Result<Self, CountryContextError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Adds or replaces one entry, returning the previous name if any.
    pub fn insert(
        &mut self,
        code: impl Into<CountryCode>,
        name: impl Into<CountryName>,
    ) -> Option<CountryName> {
        self.entries.insert(code.into(), name.into())
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&CountryName> {
        self.entries.get(code)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CountryNames for CountryTable {
    fn name_of(&self, code: &CountryCode) -> Option<CountryName> {
        self.entries.get(code).cloned()
    }
}

impl<C, N> FromIterator<(C, N)> for CountryTable
where
    C: Into<CountryCode>,
    N: Into<CountryName>,
{
    fn from_iter<I: IntoIterator<Item = (C, N)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(code, name)| (code.into(), name.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_hits_and_misses() {
        let table: CountryTable = [("EG", "Egypt"), ("US", "United States")].into_iter().collect();
        assert_eq!(table.name_of(&"EG".into()).unwrap(), "Egypt");
        assert_eq!(table.name_of(&"US".into()).unwrap(), "United States");
        assert!(table.name_of(&"XX".into()).is_none());
    }

    #[test]
    fn from_json_accepts_flat_object() {
        let table = CountryTable::from_json(r#"{"FR": "France", "DE": "Germany"}"#).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("DE").unwrap(), &CountryName::from("Germany"));
    }

    #[test]
    fn from_json_rejects_non_string_values() {
        let err = CountryTable::from_json(r#"{"FR": 1}"#).unwrap_err();
        assert!(matches!(err, CountryContextError::InvalidTable(_)));
    }

    #[test]
    fn insert_replaces_existing_name() {
        let mut table = CountryTable::new();
        assert!(table.insert("EG", "Egypt").is_none());
        let previous = table.insert("EG", "Arab Republic of Egypt").unwrap();
        assert_eq!(previous, "Egypt");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn iso_table_covers_common_codes() {
        let table = CountryTable::iso3166();
        assert_eq!(table.len(), ISO_3166_ALPHA2.len());
        assert_eq!(table.get("EG").unwrap(), &CountryName::from("Egypt"));
        assert_eq!(table.get("US").unwrap(), &CountryName::from("United States"));
        assert!(table.get("XX").is_none());
    }

    #[test]
    fn shared_table_delegates() {
        let table: Arc<dyn CountryNames> = Arc::new(CountryTable::iso3166());
        assert_eq!(table.name_of(&"FR".into()).unwrap(), "France");
    }
}
