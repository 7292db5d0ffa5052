//! Case-insensitive substring search over named text fields

use crate::types::School;

/// Records that expose named text fields to search
pub trait Searchable {
    /// Text of `field`, or `None` if the record has no such field
    fn field(&self, field: &str) -> Option<&str>;
}

impl Searchable for School {
    fn field(&self, field: &str) -> Option<&str> {
        self.text_field(field)
    }
}

/// Fields searched when the caller names none
pub const DEFAULT_SCHOOL_FIELDS: &[&str] = &["name", "address"];

/// Records where any of `fields` contains `term`, ignoring case.
///
/// Input order is preserved and the input is left untouched. An empty term
/// returns every record; whitespace in the term is matched literally.
/// Unknown field names never match.
pub fn search<T, S>(records: &[T], term: &str, fields: &[S]) -> Vec<T>
where
    T: Searchable + Clone,
    S: AsRef<str>,
{
    if term.is_empty() {
        return records.to_vec();
    }
    let needle = term.to_lowercase();

    records
        .iter()
        .filter(|record| {
            fields.iter().any(|f| {
                record
                    .field(f.as_ref())
                    .map(|text| text.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        })
        .cloned()
        .collect()
}
