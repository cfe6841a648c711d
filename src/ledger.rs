// src/ledger.rs
//! The vote ledger: one vote per user per poll, and tallies derived from it.

use crate::error::{AppError, AppResult, StoreError};
use crate::models::{OptionId, PollId, Tally, UserId, Vote};
use crate::store::VoteStore;

/// Insert attempts before giving up on a vote that keeps racing.
const MAX_VOTE_ATTEMPTS: usize = 3;

/// Record `user_id`'s choice of `option_id` in `poll_id`.
///
/// A first vote inserts a row; a later vote repoints the existing row, so the
/// vote keeps its id. The `(poll_id, user_id)` unique constraint in the store
/// is what actually guarantees a single row: when a concurrent request wins
/// the insert, we fall back to updating the row it created.
pub async fn cast_vote<S>(
    store: &S,
    poll_id: PollId,
    option_id: OptionId,
    user_id: UserId,
) -> AppResult<Vote>
where
    S: VoteStore + ?Sized,
{
    ensure_user(store, user_id).await?;
    ensure_option_in_poll(store, poll_id, option_id).await?;

    for attempt in 1..=MAX_VOTE_ATTEMPTS {
        if let Some(existing) = store.find_vote(poll_id, user_id).await? {
            if existing.poll_option_id == option_id {
                return Ok(existing);
            }
            match store.update_vote_option(existing.id, option_id).await {
                Ok(vote) => {
                    tracing::info!(poll_id, user_id, option_id, vote_id = vote.id, "vote changed");
                    return Ok(vote);
                }
                // Row vanished between read and write; go around again
                Err(StoreError::NotFound) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        match store.insert_vote(poll_id, option_id, user_id).await {
            Ok(vote) => {
                tracing::info!(poll_id, user_id, option_id, vote_id = vote.id, "vote recorded");
                return Ok(vote);
            }
            Err(StoreError::UniqueViolation(_)) => {
                tracing::debug!(poll_id, user_id, attempt, "lost vote insert race, retrying as update");
            }
            // Poll or option was deleted while we were working
            Err(StoreError::NotFound) => return Err(AppError::OptionNotFound),
            Err(err) => return Err(err.into()),
        }
    }

    Err(AppError::Internal(format!(
        "vote for poll {poll_id} by user {user_id} did not settle after {MAX_VOTE_ATTEMPTS} attempts"
    )))
}

/// Vote counts for every option of the poll, including options with no votes.
pub async fn tally<S>(store: &S, poll_id: PollId) -> AppResult<Tally>
where
    S: VoteStore + ?Sized,
{
    if !store.poll_exists(poll_id).await? {
        return Err(AppError::NotFound(format!("poll {poll_id}")));
    }

    let mut tally: Tally = store
        .list_options(poll_id)
        .await?
        .into_iter()
        .map(|option| (option.id, 0))
        .collect();

    for (option_id, count) in store.count_votes(poll_id).await? {
        // Only count options the poll still has
        if let Some(slot) = tally.get_mut(&option_id) {
            *slot = count;
        }
    }

    Ok(tally)
}

async fn ensure_user<S: VoteStore + ?Sized>(store: &S, user_id: UserId) -> AppResult<()> {
    if store.user_exists(user_id).await? {
        Ok(())
    } else {
        Err(AppError::UserNotFound)
    }
}

async fn ensure_option_in_poll<S: VoteStore + ?Sized>(
    store: &S,
    poll_id: PollId,
    option_id: OptionId,
) -> AppResult<()> {
    match store.find_option(option_id).await? {
        Some(option) if option.poll_id == poll_id => Ok(()),
        _ => Err(AppError::OptionNotFound),
    }
}
