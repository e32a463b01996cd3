use std::collections::HashSet;

use proptest::prelude::*;

use quoteportal::{
    core::{builder::build, store::RecordStore, suggest::prior_values},
    export::project,
    record::RecordDraft,
    types::{GeneralField, RecordId},
};

fn value_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        "[A-D][a-c]{0,2}".prop_map(Some),
    ]
}

fn populate(values: &[(Option<String>, Option<String>)]) -> RecordStore {
    let mut store = RecordStore::new("prop");
    for (sponsor, protocol) in values {
        let mut draft = RecordDraft::new();
        if let Some(s) = sponsor {
            draft = draft.field(GeneralField::Sponsor, s.clone());
        }
        if let Some(p) = protocol {
            draft = draft.field(GeneralField::Protocol, p.clone());
        }
        store.insert(build(draft)).expect("insert");
    }
    store
}

proptest! {
    #[test]
    fn prior_values_are_sorted_distinct_and_complete(
        values in prop::collection::vec((value_strategy(), value_strategy()), 0..60)
    ) {
        let store = populate(&values);

        for field in GeneralField::ALL {
            let out = prior_values(&store, field);
            prop_assert!(out.windows(2).all(|w| w[0] < w[1]), "not strictly ascending: {out:?}");
            prop_assert!(out.iter().all(|v| !v.is_empty()));

            let expected: HashSet<String> = store
                .iter()
                .filter_map(|r| r.general.get(field))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            prop_assert_eq!(out.into_iter().collect::<HashSet<_>>(), expected);
        }
    }

    #[test]
    fn built_ids_are_unique_and_projection_covers_each_once(count in 0usize..80) {
        let store = populate(&vec![(Some("Acme".to_string()), None); count]);

        let ids: HashSet<RecordId> = store.ordered_ids().iter().copied().collect();
        prop_assert_eq!(ids.len(), count);

        let rows = project(&store);
        prop_assert_eq!(rows.len(), store.len());
        let row_ids: Vec<RecordId> = rows.iter().map(|r| r.id).collect();
        prop_assert_eq!(row_ids.as_slice(), store.ordered_ids());
    }
}
