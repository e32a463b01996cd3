use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    core::store::RecordStore,
    record::{Record, ScopeRow},
    types::{GeneralField, RecordId},
};

/// One record flattened into cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    /// Record id.
    pub id: RecordId,
    /// Submission instant.
    pub submitted_at: DateTime<Utc>,
    /// One cell per [`GeneralField::ALL`] entry; absent fields are empty.
    pub general: Vec<String>,
    /// Scope rows as `country / language / batch / deadline`, joined by `; `.
    pub scope: String,
    /// Area labels joined by `, `.
    pub areas: String,
}

impl ExportRow {
    /// Column names matching [`ExportRow::cells`].
    pub fn headers() -> Vec<&'static str> {
        let mut out = vec!["Request ID", "Submitted At"];
        out.extend(GeneralField::ALL.iter().map(|f| f.label()));
        out.push("Language Scope");
        out.push("Therapeutic Areas");
        out
    }

    /// Cells in header order.
    pub fn cells(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.general.len() + 4);
        out.push(self.id.to_string());
        out.push(self.submitted_at.to_rfc3339_opts(SecondsFormat::AutoSi, true));
        out.extend(self.general.iter().cloned());
        out.push(self.scope.clone());
        out.push(self.areas.clone());
        out
    }

    fn from_record(rec: &Record) -> Self {
        let general = GeneralField::ALL
            .iter()
            .map(|f| rec.general.get(*f).unwrap_or_default().to_string())
            .collect();

        let scope = rec
            .scope_rows
            .iter()
            .map(scope_cell)
            .collect::<Vec<_>>()
            .join("; ");

        let areas = rec
            .therapeutic_areas
            .iter()
            .map(|a| a.label())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            id: rec.id,
            submitted_at: rec.submitted_at,
            general,
            scope,
            areas,
        }
    }
}

fn scope_cell(row: &ScopeRow) -> String {
    format!(
        "{} / {} / {} / {}",
        row.country, row.language, row.batch, row.requested_deadline
    )
}

/// One row per stored record, in store order.
pub fn project(store: &RecordStore) -> Vec<ExportRow> {
    store.iter().map(ExportRow::from_record).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{
        core::builder::build_at,
        record::RecordDraft,
        types::TherapeuticArea,
    };

    #[test]
    fn spreads_fields_and_joins_nested_cells() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let rec = build_at(
            RecordDraft::new()
                .field(GeneralField::Sponsor, "Acme")
                .field(GeneralField::StudyPhase, "Phase II")
                .scope_row(ScopeRow::new("France", "French", "1", "2024-06-01"))
                .scope_row(ScopeRow::new("Spain", "Spanish", "2", ""))
                .area(TherapeuticArea::Dermatology)
                .area(TherapeuticArea::Allergy),
            at,
        );
        let mut store = RecordStore::new("u");
        store.insert(rec.clone()).unwrap();

        let rows = project(&store);
        assert_eq!(rows.len(), 1);
        let cells = rows[0].cells();
        assert_eq!(cells.len(), ExportRow::headers().len());
        assert_eq!(cells[0], rec.id.to_string());
        assert_eq!(cells[1], "2024-05-01T09:30:00Z");
        assert_eq!(cells[2], "Acme");
        assert_eq!(cells[3], "");
        assert_eq!(cells[5], "Phase II");
        assert_eq!(cells[9], "France / French / 1 / 2024-06-01; Spain / Spanish / 2 / ");
        assert_eq!(cells[10], "Allergy, Dermatology");
    }

    #[test]
    fn submitted_at_keeps_sub_second_precision() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap() + chrono::Duration::milliseconds(250);
        let mut store = RecordStore::new("u");
        store.insert(build_at(RecordDraft::new(), at)).unwrap();

        let cells = project(&store)[0].cells();
        assert_eq!(cells[1], "2024-05-01T09:30:00.250Z");
        assert_eq!(cells[1].parse::<DateTime<Utc>>().unwrap(), at);
    }
}
