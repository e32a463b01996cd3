use std::fmt;

use hashbrown::HashMap;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
};
use thiserror::Error;

use crate::{
    persist::{PersistResult, StoreBackend},
    record::Record,
    types::{Owner, RecordId},
};

/// Store-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record has this id.
    #[error("record {0} not found")]
    MissingRecord(RecordId),
    /// A record with this id is already stored.
    #[error("record {0} already exists")]
    AlreadyExists(RecordId),
}

/// Ordered record list in its persisted shape.
///
/// Encodes as one JSON object mapping id to record body, keeping insertion
/// order in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreSnapshot {
    /// Records in store order.
    pub records: Vec<Record>,
}

impl Serialize for StoreSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for rec in &self.records {
            map.serialize_entry(&rec.id, rec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StoreSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnapshotVisitor;

        impl<'de> Visitor<'de> for SnapshotVisitor {
            type Value = StoreSnapshot;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of record id to record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut records: Vec<Record> = Vec::with_capacity(access.size_hint().unwrap_or(0));
                let mut seen = hashbrown::HashSet::new();
                while let Some((id, mut rec)) = access.next_entry::<RecordId, Record>()? {
                    if !seen.insert(id) {
                        return Err(de::Error::custom(format!("duplicate record id {id}")));
                    }
                    rec.id = id;
                    records.push(rec);
                }
                Ok(StoreSnapshot { records })
            }
        }

        deserializer.deserialize_map(SnapshotVisitor)
    }
}

/// All records owned by one identity.
#[derive(Debug, Default)]
pub struct RecordStore {
    owner: Owner,
    records: HashMap<RecordId, Record>,
    order: Vec<RecordId>,
}

impl RecordStore {
    /// Creates an empty store for `owner`.
    pub fn new(owner: impl Into<Owner>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    /// Loads `owner`'s store from `backend`.
    ///
    /// Nothing persisted yields an empty store; persisted but unreadable data
    /// is an error.
    pub fn open(backend: &dyn StoreBackend, owner: impl Into<Owner>) -> PersistResult<Self> {
        let owner = owner.into();
        match backend.load(&owner)? {
            Some(snapshot) => {
                tracing::debug!(owner = %owner, records = snapshot.records.len(), "loaded store");
                Ok(Self::from_snapshot(owner, snapshot)?)
            }
            None => {
                tracing::debug!(owner = %owner, "no stored records, starting empty");
                Ok(Self::new(owner))
            }
        }
    }

    /// Rebuilds a store from a snapshot, keeping its order.
    pub fn from_snapshot(owner: impl Into<Owner>, snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let mut store = Self::new(owner);
        for rec in snapshot.records {
            store.insert(rec)?;
        }
        Ok(store)
    }

    /// Copies the records out in store order.
    pub fn export_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            records: self.iter().cloned().collect(),
        }
    }

    /// Writes the whole store through `backend`.
    pub fn save(&self, backend: &mut dyn StoreBackend) -> PersistResult<()> {
        backend.save(&self.owner, &self.export_snapshot())
    }

    /// Identity this store belongs to.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Appends a new record.
    pub fn insert(&mut self, rec: Record) -> Result<(), StoreError> {
        if self.records.contains_key(&rec.id) {
            return Err(StoreError::AlreadyExists(rec.id));
        }
        self.order.push(rec.id);
        self.records.insert(rec.id, rec);
        Ok(())
    }

    /// Swaps the record with the same id in place, returning the old one.
    pub fn replace(&mut self, rec: Record) -> Result<Record, StoreError> {
        let slot = self
            .records
            .get_mut(&rec.id)
            .ok_or(StoreError::MissingRecord(rec.id))?;
        Ok(std::mem::replace(slot, rec))
    }

    /// Drops a record. Only used to roll back a failed write-through.
    pub(crate) fn remove(&mut self, id: RecordId) -> Option<Record> {
        let rec = self.records.remove(&id)?;
        if let Some(pos) = self.order.iter().position(|x| *x == id) {
            self.order.remove(pos);
        }
        Some(rec)
    }

    /// Borrows the record with this id.
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(&id)
    }

    /// Owned copy of the record with this id.
    pub fn get_cloned(&self, id: RecordId) -> Option<Record> {
        self.get(id).cloned()
    }

    /// True when a record with this id is stored.
    pub fn contains(&self, id: RecordId) -> bool {
        self.records.contains_key(&id)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Record ids in insertion order.
    pub fn ordered_ids(&self) -> &[RecordId] {
        &self.order
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
