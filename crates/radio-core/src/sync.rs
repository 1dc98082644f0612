//! Remote sync: CRUD against the hosted station table.
//!
//! Every mutation is followed by a full `fetch_all`; the caller replaces the
//! store with that result.  There is no local patching and no retry: one
//! attempt per call, failures go straight back to the caller.  A write that
//! landed but whose refetch failed comes back as `SyncError::Refetch` so it
//! is never mistaken for a rejected write.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::protocol::{SortOrder, Station, StationDraft, StationId};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("backend not configured: {0}")]
    NotConfigured(String),
    /// The write went through; only the follow-up fetch failed.
    #[error("list could not be refreshed: {0}")]
    Refetch(#[source] Box<SyncError>),
}

impl SyncError {
    pub fn write_landed(&self) -> bool {
        matches!(self, SyncError::Refetch(_))
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SyncError::Decode(e.to_string())
        } else {
            SyncError::Network(e.to_string())
        }
    }
}

/// The four row operations the hosted table API offers.
#[async_trait]
pub trait StationTable: Send + Sync {
    /// All rows ordered by city then name (both in `order`), missing city last.
    async fn fetch_all(&self, order: SortOrder) -> Result<Vec<Station>, SyncError>;
    async fn insert(&self, draft: &StationDraft) -> Result<(), SyncError>;
    /// Patch name, url, color and city of one row.
    async fn update_by_id(&self, station: &Station) -> Result<(), SyncError>;
    async fn delete_by_id(&self, id: StationId) -> Result<(), SyncError>;
}

/// What a mutation was, for logging and notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Add(String),
    Update(String),
    Delete(StationId),
}

impl Mutation {
    pub fn describe(&self) -> String {
        match self {
            Self::Add(name) => format!("add \"{}\"", name),
            Self::Update(name) => format!("update \"{}\"", name),
            Self::Delete(id) => format!("delete station #{}", id),
        }
    }

    pub fn past_tense(&self) -> String {
        match self {
            Self::Add(name) => format!("Added \"{}\"", name),
            Self::Update(name) => format!("Updated \"{}\"", name),
            Self::Delete(_) => "Station deleted".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct RemoteSync {
    table: Arc<dyn StationTable>,
}

impl RemoteSync {
    pub fn new(table: Arc<dyn StationTable>) -> Self {
        Self { table }
    }

    pub async fn load(&self) -> Result<Vec<Station>, SyncError> {
        let stations = self.table.fetch_all(SortOrder::Asc).await.map_err(|e| {
            warn!("[sync] fetch failed: {}", e);
            e
        })?;
        info!("[sync] fetched {} stations", stations.len());
        Ok(stations)
    }

    pub async fn add(&self, draft: StationDraft) -> Result<Vec<Station>, SyncError> {
        let mutation = Mutation::Add(draft.name.clone());
        self.write(&mutation, self.table.insert(&draft)).await
    }

    pub async fn update(&self, station: Station) -> Result<Vec<Station>, SyncError> {
        let mutation = Mutation::Update(station.name.clone());
        self.write(&mutation, self.table.update_by_id(&station)).await
    }

    pub async fn delete(&self, id: StationId) -> Result<Vec<Station>, SyncError> {
        self.write(&Mutation::Delete(id), self.table.delete_by_id(id))
            .await
    }

    /// Run one write, then refetch the whole table.
    async fn write<F>(&self, mutation: &Mutation, op: F) -> Result<Vec<Station>, SyncError>
    where
        F: std::future::Future<Output = Result<(), SyncError>>,
    {
        if let Err(e) = op.await {
            warn!("[sync] {} failed: {}", mutation.describe(), e);
            return Err(e);
        }
        info!("[sync] {} ok, refetching", mutation.describe());
        self.load()
            .await
            .map_err(|e| SyncError::Refetch(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FlakyTable {
        rows: Mutex<Vec<Station>>,
        fail_writes: bool,
        fail_fetch: bool,
        fetches: Mutex<usize>,
    }

    #[async_trait]
    impl StationTable for FlakyTable {
        async fn fetch_all(&self, _order: SortOrder) -> Result<Vec<Station>, SyncError> {
            *self.fetches.lock().unwrap() += 1;
            if self.fail_fetch {
                return Err(SyncError::Network("connection reset".into()));
            }
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn insert(&self, draft: &StationDraft) -> Result<(), SyncError> {
            if self.fail_writes {
                return Err(SyncError::Api {
                    status: 401,
                    message: "permission denied".into(),
                });
            }
            let mut rows = self.rows.lock().unwrap();
            let id = rows.len() as StationId + 1;
            rows.push(Station {
                id,
                name: draft.name.clone(),
                url: draft.url.clone(),
                city: draft.city.clone(),
                color: draft.color.clone(),
                created_at: None,
            });
            Ok(())
        }

        async fn update_by_id(&self, _station: &Station) -> Result<(), SyncError> {
            Ok(())
        }

        async fn delete_by_id(&self, id: StationId) -> Result<(), SyncError> {
            self.rows.lock().unwrap().retain(|s| s.id != id);
            Ok(())
        }
    }

    fn draft(name: &str) -> StationDraft {
        StationDraft::from_fields(name, "http://s", "", "").unwrap()
    }

    #[tokio::test]
    async fn test_add_refetches() {
        let table = Arc::new(FlakyTable::default());
        let sync = RemoteSync::new(table.clone());
        let rows = sync.add(draft("One")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(*table.fetches.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_skips_refetch() {
        let table = Arc::new(FlakyTable {
            fail_writes: true,
            ..Default::default()
        });
        let sync = RemoteSync::new(table.clone());
        let err = sync.add(draft("One")).await.unwrap_err();
        assert!(err.to_string().contains("permission denied"));
        assert!(!err.write_landed());
        assert_eq!(*table.fetches.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_refetch_after_insert_is_distinct() {
        let table = Arc::new(FlakyTable {
            fail_fetch: true,
            ..Default::default()
        });
        let sync = RemoteSync::new(table.clone());
        let err = sync.add(draft("One")).await.unwrap_err();
        assert!(matches!(&err, SyncError::Refetch(inner) if matches!(**inner, SyncError::Network(_))));
        assert!(err.write_landed());
        assert_eq!(table.rows.lock().unwrap().len(), 1);
        assert_eq!(*table.fetches.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_plain_load_failure_is_not_wrapped() {
        let table = Arc::new(FlakyTable {
            fail_fetch: true,
            ..Default::default()
        });
        let err = RemoteSync::new(table).load().await.unwrap_err();
        assert!(matches!(err, SyncError::Network(_)));
    }

    #[test]
    fn test_mutation_labels() {
        assert_eq!(Mutation::Delete(4).describe(), "delete station #4");
        assert_eq!(Mutation::Add("X".into()).past_tense(), "Added \"X\"");
    }
}
