//! Quote request record, scope rows, and raw form drafts.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{GeneralField, RecordId, TherapeuticArea};

/// Select-box value meaning "the user will type a freeform value instead".
pub const OTHER_SENTINEL: &str = "Other";

/// General scoping answers keyed by field, iterated in form order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneralFields(BTreeMap<GeneralField, String>);

impl GeneralFields {
    /// Creates an empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value for `field`, if the field is present.
    pub fn get(&self, field: GeneralField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Sets `field`, returning the previous value.
    pub fn set(&mut self, field: GeneralField, value: impl Into<String>) -> Option<String> {
        self.0.insert(field, value.into())
    }

    /// Sets `field` to an ISO `YYYY-MM-DD` date.
    pub fn set_date(&mut self, field: GeneralField, date: NaiveDate) -> Option<String> {
        self.set(field, date.format("%Y-%m-%d").to_string())
    }

    /// Iterates present fields in form order.
    pub fn iter(&self) -> impl Iterator<Item = (GeneralField, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Number of present fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: Into<String>> FromIterator<(GeneralField, V)> for GeneralFields {
    fn from_iter<I: IntoIterator<Item = (GeneralField, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// One row of the language/country scope table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScopeRow {
    /// Country name or code, unvalidated.
    #[serde(rename = "Country", default, deserialize_with = "nullable_string")]
    pub country: String,
    /// Language name or code, unvalidated.
    #[serde(rename = "Language", default, deserialize_with = "nullable_string")]
    pub language: String,
    /// Translation batch label.
    #[serde(rename = "Batch", default, deserialize_with = "nullable_string")]
    pub batch: String,
    /// Requested deadline as typed.
    #[serde(
        rename = "Requested Deadline",
        default,
        deserialize_with = "nullable_string"
    )]
    pub requested_deadline: String,
}

impl ScopeRow {
    /// Builds a row from its four cells.
    pub fn new(
        country: impl Into<String>,
        language: impl Into<String>,
        batch: impl Into<String>,
        requested_deadline: impl Into<String>,
    ) -> Self {
        Self {
            country: country.into(),
            language: language.into(),
            batch: batch.into(),
            requested_deadline: requested_deadline.into(),
        }
    }

    /// True when every cell is blank.
    pub fn is_empty(&self) -> bool {
        [&self.country, &self.language, &self.batch, &self.requested_deadline]
            .iter()
            .all(|cell| cell.trim().is_empty())
    }
}

// Table widgets emit `null` for untouched cells.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A stored quote request.
///
/// The `id` is carried by the enclosing store map on disk, so it is skipped
/// by the body encoding and restored by [`crate::core::store::StoreSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier assigned at creation.
    #[serde(skip)]
    pub id: RecordId,
    /// General scoping answers.
    #[serde(rename = "General Questions", default)]
    pub general: GeneralFields,
    /// Language/country scope table.
    #[serde(rename = "Language Scope", default)]
    pub scope_rows: Vec<ScopeRow>,
    /// Selected therapeutic areas.
    #[serde(rename = "Therapeutic Areas", default)]
    pub therapeutic_areas: BTreeSet<TherapeuticArea>,
    /// Creation instant; edits never change it.
    #[serde(rename = "Submitted At")]
    pub submitted_at: DateTime<Utc>,
}

impl Record {
    /// Assembles a record from a draft, resolving "Other" selections.
    pub(crate) fn assemble(id: RecordId, submitted_at: DateTime<Utc>, draft: RecordDraft) -> Self {
        let general = draft.resolve_general();
        Self {
            id,
            general,
            scope_rows: draft.scope_rows,
            therapeutic_areas: draft.therapeutic_areas,
            submitted_at,
        }
    }

    /// Draft holding this record's editable content.
    pub fn to_draft(&self) -> RecordDraft {
        RecordDraft {
            general: self.general.clone(),
            other_values: BTreeMap::new(),
            scope_rows: self.scope_rows.clone(),
            therapeutic_areas: self.therapeutic_areas.clone(),
        }
    }
}

/// Raw values collected from one pass over the form.
///
/// For a suggestion-backed field the caller may store [`OTHER_SENTINEL`] as
/// the field value and put the typed replacement in `other_values`;
/// [`RecordDraft::other`] does both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordDraft {
    /// Field values as selected or typed.
    pub general: GeneralFields,
    /// Freeform replacements for fields left on [`OTHER_SENTINEL`].
    pub other_values: BTreeMap<GeneralField, String>,
    /// Scope table rows in display order.
    pub scope_rows: Vec<ScopeRow>,
    /// Multi-select result.
    pub therapeutic_areas: BTreeSet<TherapeuticArea>,
}

impl RecordDraft {
    /// Creates an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field value.
    pub fn field(mut self, field: GeneralField, value: impl Into<String>) -> Self {
        self.general.set(field, value);
        self
    }

    /// Sets a date field.
    pub fn date(mut self, field: GeneralField, date: NaiveDate) -> Self {
        self.general.set_date(field, date);
        self
    }

    /// Selects the "Other" sentinel for `field` with a freeform replacement.
    pub fn other(mut self, field: GeneralField, freeform: impl Into<String>) -> Self {
        self.general.set(field, OTHER_SENTINEL);
        self.other_values.insert(field, freeform.into());
        self
    }

    /// Appends a scope row.
    pub fn scope_row(mut self, row: ScopeRow) -> Self {
        self.scope_rows.push(row);
        self
    }

    /// Adds a therapeutic area.
    pub fn area(mut self, area: TherapeuticArea) -> Self {
        self.therapeutic_areas.insert(area);
        self
    }

    fn resolve_general(&self) -> GeneralFields {
        self.general
            .iter()
            .map(|(field, raw)| {
                let value = if field.offers_suggestions() {
                    resolve_sentinel(raw, self.other_values.get(&field).map(String::as_str))
                } else {
                    raw.to_string()
                };
                (field, value)
            })
            .collect()
    }
}

/// Resolves a suggestion-backed selection.
///
/// Anything but [`OTHER_SENTINEL`] passes through. The sentinel becomes the
/// trimmed freeform text, or the empty string when that text is missing,
/// blank, or the sentinel again.
pub fn resolve_sentinel(raw: &str, freeform: Option<&str>) -> String {
    if raw != OTHER_SENTINEL {
        return raw.to_string();
    }
    freeform
        .map(str::trim)
        .filter(|text| !text.is_empty() && *text != OTHER_SENTINEL)
        .unwrap_or_default()
        .to_string()
}
