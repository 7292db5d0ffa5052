//! Local seed store
//!
//! Write-once-then-read-through cache for directory collections. The first
//! read of a known collection writes its default contents, so later reads are
//! stable. Used as the data source when no remote API is configured.

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore};

use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{Board, NewSchool, School, SchoolId};

/// An entity kept as a seeded collection
pub trait SeedEntity: Serialize + DeserializeOwned + Clone {
    /// Draft shape accepted by `add_entity`
    type Draft;

    /// Key the collection is stored under
    const COLLECTION: &'static str;

    /// Contents written on first access
    fn defaults() -> Vec<Self>;

    /// Build the stored entity once an identifier is assigned
    fn from_draft(id: String, draft: Self::Draft) -> Self;
}

impl SeedEntity for School {
    type Draft = NewSchool;

    const COLLECTION: &'static str = "schools";

    fn defaults() -> Vec<Self> {
        vec![School {
            id: SchoolId::from("1"),
            name: "Greenwood High International School".to_string(),
            address: "123 Education Lane, Bengaluru, Karnataka 560001".to_string(),
            phone: "+91 80 1234 5678".to_string(),
            email: "info@greenwoodhigh.edu".to_string(),
            admin_id: Some("2".to_string()),
            is_active: true,
            teacher_count: 0,
            student_count: 0,
            boards: vec![Board {
                id: "2".to_string(),
                name: "CBSE".to_string(),
            }],
        }]
    }

    fn from_draft(id: String, draft: NewSchool) -> Self {
        let board_ids = draft.board_ids.clone();
        let mut school = draft.into_school(SchoolId::from(id));
        school.boards = Board::defaults()
            .into_iter()
            .filter(|b| board_ids.contains(&b.id))
            .collect();
        school
    }
}

impl SeedEntity for Board {
    type Draft = String;

    const COLLECTION: &'static str = "boards";

    fn defaults() -> Vec<Self> {
        ["SSC", "CBSE", "ICSE", "IGCSE", "IB"]
            .iter()
            .enumerate()
            .map(|(i, name)| Board {
                id: (i + 1).to_string(),
                name: name.to_string(),
            })
            .collect()
    }

    fn from_draft(id: String, name: String) -> Self {
        Board { id, name }
    }
}

/// Seeding layer over a key-value backend
pub struct SeedStore {
    backend: Arc<dyn KeyValueStore>,
    last_id: Mutex<u64>,
}

impl SeedStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            last_id: Mutex::new(0),
        }
    }

    /// Seed store over a fresh in-memory backend
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Read a collection, writing its defaults first if it was never stored
    pub fn load<T: SeedEntity>(&self) -> Result<Vec<T>> {
        match self.backend.get(T::COLLECTION) {
            Ok(value) => serde_json::from_value(value).map_err(|e| Error::SeedCorrupted {
                key: T::COLLECTION.to_string(),
                message: e.to_string(),
            }),
            Err(Error::NotFound { .. }) => {
                let defaults = T::defaults();
                self.save(&defaults)?;
                info!(
                    collection = T::COLLECTION,
                    backend = self.backend.name(),
                    count = defaults.len(),
                    "Seeded default collection"
                );
                Ok(defaults)
            }
            Err(e) => Err(e),
        }
    }

    /// Replace a whole collection
    pub fn save<T: SeedEntity>(&self, items: &[T]) -> Result<()> {
        let value = serde_json::to_value(items)
            .map_err(|e| Error::Internal(format!("cannot encode {}: {}", T::COLLECTION, e)))?;
        self.backend.put(T::COLLECTION, value)
    }

    /// Append a new entity with a fresh identifier and persist the collection
    pub fn add_entity<T: SeedEntity>(&self, draft: T::Draft) -> Result<T> {
        let mut items = self.load::<T>()?;
        let id = self.next_id();
        let entity = T::from_draft(id.clone(), draft);
        items.push(entity.clone());
        self.save(&items)?;
        debug!(collection = T::COLLECTION, id = %id, "Entity added");
        Ok(entity)
    }

    /// Wall-clock millisecond token, bumped when two calls share a millisecond
    fn next_id(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut last = self.last_id.lock();
        let id = now.max(*last + 1);
        *last = id;
        id.to_string()
    }
}
