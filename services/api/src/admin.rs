use bracket_pool::config::AppConfig;
use bracket_pool::contest::entries::{Entry, EntryId, EntryRepository};
use bracket_pool::error::AppError;
use bracket_pool::storage::SqliteEntryRepository;
use bracket_pool::telemetry;
use clap::{Args, Subcommand};
use std::io::Write;
use tracing::info;

/// Scoring and locking happen outside the HTTP surface; these commands write straight to
/// the entry store.
#[derive(Subcommand, Debug)]
pub(crate) enum AdminCommand {
    /// Lock an entry's bracket against further edits (irreversible)
    Lock(LockArgs),
    /// Record the score for an entry
    Score(ScoreArgs),
    /// Print the current standings
    Leaderboard,
}

#[derive(Args, Debug)]
pub(crate) struct LockArgs {
    /// Entry to lock
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub(crate) entry_id: Option<i64>,
    /// Lock every entry that is still open
    #[arg(long)]
    pub(crate) all: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Entry to score
    pub(crate) entry_id: i64,
    /// New total score
    #[arg(allow_negative_numbers = true)]
    pub(crate) score: i64,
}

pub(crate) fn run_admin(command: AdminCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let repository = SqliteEntryRepository::open(&config.storage)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    apply(command, &repository, &mut out)
}

pub(crate) fn apply<R, W>(
    command: AdminCommand,
    repository: &R,
    out: &mut W,
) -> Result<(), AppError>
where
    R: EntryRepository,
    W: Write,
{
    match command {
        AdminCommand::Lock(LockArgs { all: true, .. }) => {
            let locked = repository.lock_all()?;
            info!(locked, "locked all open entries");
            writeln!(out, "Locked {locked} entries")?;
        }
        AdminCommand::Lock(LockArgs {
            entry_id: Some(entry_id),
            ..
        }) => {
            let id = EntryId(entry_id);
            repository.lock(id)?;
            info!(entry_id = %id, "entry locked");
            writeln!(out, "Locked entry {id}")?;
        }
        AdminCommand::Lock(LockArgs { entry_id: None, .. }) => {
            writeln!(out, "Nothing to lock: pass an entry id or --all")?;
        }
        AdminCommand::Score(ScoreArgs { entry_id, score }) => {
            let id = EntryId(entry_id);
            repository.set_score(id, score)?;
            info!(entry_id = %id, score, "score recorded");
            writeln!(out, "Entry {id} now has {score} points")?;
        }
        AdminCommand::Leaderboard => {
            let entries = repository.ranked()?;
            render_leaderboard(&entries, out)?;
        }
    }

    Ok(())
}

fn render_leaderboard<W: Write>(entries: &[Entry], out: &mut W) -> std::io::Result<()> {
    if entries.is_empty() {
        return writeln!(out, "Leaderboard: no entries yet");
    }

    writeln!(out, "Leaderboard")?;
    for (rank, row) in entries.iter().map(Entry::leaderboard_row).enumerate() {
        let handle = row
            .username
            .as_deref()
            .map(|username| format!(" (@{username})"))
            .unwrap_or_default();
        let lock_note = if row.locked { "" } else { " [open]" };
        writeln!(
            out,
            "{:>3}. {}{} - {} pts (entry {}){}",
            rank + 1,
            row.name,
            handle,
            row.score,
            row.id,
            lock_note
        )?;
    }
    Ok(())
}
