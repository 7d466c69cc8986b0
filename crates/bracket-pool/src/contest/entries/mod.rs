//! Contest entry lifecycle: registration, bracket submission, and ranking.
//!
//! `Unsubmitted -> Submitted -> Locked`. Registration and bracket edits are gated by the
//! submission window; locking and scoring are applied directly through the repository by
//! administrative tooling and never through the HTTP surface.

pub mod domain;
pub(crate) mod policy;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    BracketDocument, BracketReceipt, BracketView, Entry, EntryDetail, EntryId, EntrySummary,
    LeaderboardRow, NewEntry, Registration, RegistrationView,
};
pub use policy::PolicyViolation;
pub use repository::{EntryRepository, RepositoryError};
pub use router::entry_router;
pub use service::{EntryService, EntryServiceError};
