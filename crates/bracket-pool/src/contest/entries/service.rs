use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    BracketDocument, BracketReceipt, Entry, EntryId, EntrySummary, LeaderboardRow, Registration,
};
use super::policy::{PolicyViolation, RegistrationPolicy};
use super::repository::{EntryRepository, RepositoryError};
use crate::config::ContestConfig;
use crate::contest::window::{Clock, SubmissionWindow};

/// Service composing the registration policy, submission window, and repository.
pub struct EntryService<R, C> {
    policy: RegistrationPolicy,
    window: SubmissionWindow,
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> EntryService<R, C>
where
    R: EntryRepository + 'static,
    C: Clock + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<C>, config: &ContestConfig) -> Self {
        Self {
            policy: RegistrationPolicy::new(&config.email_domain),
            window: config.window,
            repository,
            clock,
        }
    }

    /// Whether registration and bracket edits are currently accepted. Evaluated fresh on
    /// every call.
    pub fn is_open(&self) -> bool {
        self.window.is_open_at(self.clock.now())
    }

    /// Register a new contestant.
    pub fn register(&self, registration: Registration) -> Result<Entry, EntryServiceError> {
        let now = self.clock.now();
        if !self.window.is_open_at(now) {
            warn!(deadline = %self.window.deadline(), "registration rejected after deadline");
            return Err(EntryServiceError::RegistrationClosed);
        }

        let new_entry = match self.policy.admit(registration, now) {
            Ok(new_entry) => new_entry,
            Err(violation) => {
                warn!(%violation, domain = self.policy.domain(), "registration rejected");
                return Err(violation.into());
            }
        };

        let entry = self.repository.insert(new_entry)?;
        info!(entry_id = %entry.id, "entry registered");
        Ok(entry)
    }

    /// Fetch a single entry, including its email address.
    pub fn get(&self, id: EntryId) -> Result<Entry, EntryServiceError> {
        let entry = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(entry)
    }

    /// Public listing in registration order.
    pub fn list(&self) -> Result<Vec<EntrySummary>, EntryServiceError> {
        let entries = self.repository.list_by_creation()?;
        Ok(entries.iter().map(Entry::summary).collect())
    }

    /// Replace the entry's bracket with `bracket`. Keys from earlier submissions that are
    /// missing from `bracket` are dropped.
    pub fn submit_bracket(
        &self,
        id: EntryId,
        bracket: BracketDocument,
    ) -> Result<BracketReceipt, EntryServiceError> {
        let entry = self.get(id)?;

        if !self.window.is_open_at(self.clock.now()) {
            warn!(
                entry_id = %id,
                deadline = %self.window.deadline(),
                "bracket rejected after deadline"
            );
            return Err(EntryServiceError::SubmissionsClosed);
        }
        if entry.locked {
            warn!(entry_id = %id, "bracket rejected for locked entry");
            return Err(EntryServiceError::Locked);
        }

        self.repository.replace_bracket(id, &bracket)?;
        info!(entry_id = %id, picks = bracket.len(), "bracket saved");
        Ok(BracketReceipt::saved(id))
    }

    /// Ranked standings: score descending, earlier registration first on ties.
    pub fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, EntryServiceError> {
        let entries = self.repository.ranked()?;
        Ok(entries.iter().map(Entry::leaderboard_row).collect())
    }
}

/// Error raised by the entry service.
#[derive(Debug, thiserror::Error)]
pub enum EntryServiceError {
    #[error(transparent)]
    Policy(#[from] PolicyViolation),
    #[error("Bracket entry is closed (deadline passed).")]
    RegistrationClosed,
    #[error("Bracket submissions are closed (deadline passed).")]
    SubmissionsClosed,
    #[error("Bracket is locked")]
    Locked,
    #[error("Email already used")]
    DuplicateEmail,
    #[error("Entry not found")]
    NotFound,
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for EntryServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict => Self::DuplicateEmail,
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Locked => Self::Locked,
            other => Self::Repository(other),
        }
    }
}
