use super::domain::{BracketDocument, Entry, EntryId, NewEntry};

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Implementations must enforce email uniqueness themselves (a constraint, not a
/// pre-check) and must apply `replace_bracket` only while the entry is unlocked, in the
/// same atomic step as the write.
pub trait EntryRepository: Send + Sync {
    fn insert(&self, entry: NewEntry) -> Result<Entry, RepositoryError>;
    fn fetch(&self, id: EntryId) -> Result<Option<Entry>, RepositoryError>;
    /// Every entry, oldest registration first.
    fn list_by_creation(&self) -> Result<Vec<Entry>, RepositoryError>;
    /// Every entry, highest score first, earlier registration winning ties.
    fn ranked(&self) -> Result<Vec<Entry>, RepositoryError>;
    fn replace_bracket(&self, id: EntryId, bracket: &BracketDocument)
        -> Result<(), RepositoryError>;

    fn set_score(&self, id: EntryId, score: i64) -> Result<(), RepositoryError>;
    fn lock(&self, id: EntryId) -> Result<(), RepositoryError>;
    /// Returns how many entries changed state.
    fn lock_all(&self) -> Result<usize, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("email already registered")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("entry is locked")]
    Locked,
    #[error("stored record is unreadable: {0}")]
    CorruptRecord(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
