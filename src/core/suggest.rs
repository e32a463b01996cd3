use hashbrown::HashSet;

use crate::{core::store::RecordStore, types::GeneralField};

/// Distinct non-empty prior values of `field`, sorted ascending.
///
/// Scans the store on every call so the result always reflects the latest write.
pub fn prior_values(store: &RecordStore, field: GeneralField) -> Vec<String> {
    let distinct: HashSet<&str> = store
        .iter()
        .filter_map(|rec| rec.general.get(field))
        .filter(|value| !value.is_empty())
        .collect();

    let mut out: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    out.sort_unstable();
    out
}

/// Like [`prior_values`], addressing the field by label. Unknown labels yield nothing.
pub fn prior_values_for_label(store: &RecordStore, label: &str) -> Vec<String> {
    GeneralField::from_label(label)
        .map(|field| prior_values(store, field))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::record::{GeneralFields, Record};

    fn rec(sponsor: Option<&str>) -> Record {
        let mut general = GeneralFields::new();
        if let Some(s) = sponsor {
            general.set(GeneralField::Sponsor, s);
        }
        Record {
            id: Uuid::new_v4(),
            general,
            scope_rows: vec![],
            therapeutic_areas: Default::default(),
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn skips_missing_and_empty_and_dedups() {
        let mut store = RecordStore::new("u");
        for sponsor in [Some("Beta"), None, Some(""), Some("Acme"), Some("Beta")] {
            store.insert(rec(sponsor)).unwrap();
        }
        assert_eq!(prior_values(&store, GeneralField::Sponsor), vec!["Acme", "Beta"]);
        assert!(prior_values(&store, GeneralField::Protocol).is_empty());
    }

    #[test]
    fn unknown_label_is_empty() {
        let mut store = RecordStore::new("u");
        store.insert(rec(Some("Acme"))).unwrap();
        assert_eq!(prior_values_for_label(&store, "Sponsor"), vec!["Acme"]);
        assert!(prior_values_for_label(&store, "Budget Owner").is_empty());
    }
}
