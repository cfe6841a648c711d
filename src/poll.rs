// src/poll.rs
use crate::error::{AppError, AppResult, StoreError};
use crate::ledger;
use crate::models::{NewPoll, Poll, PollId, PollView, UserId};
use crate::store::Store;

/// Minimum number of non-empty options a poll needs.
pub const MIN_OPTIONS: usize = 2;

/// Trim option texts and drop the empty ones, keeping their relative order.
pub fn clean_options(option_texts: Vec<String>) -> Vec<String> {
    option_texts
        .into_iter()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Create a poll and its options in one unit.
///
/// Options are numbered by their position after empty entries are removed,
/// so `["A", "", "B"]` gives `A` order 0 and `B` order 1.
pub async fn create_poll(
    store: &dyn Store,
    creator_id: UserId,
    title: &str,
    description: &str,
    option_texts: Vec<String>,
) -> AppResult<PollView> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("poll title must not be empty".into()));
    }

    let options = clean_options(option_texts);
    if options.len() < MIN_OPTIONS {
        return Err(AppError::InvalidInput(format!(
            "poll must have at least {MIN_OPTIONS} options"
        )));
    }

    if !store.user_exists(creator_id).await? {
        return Err(AppError::UserNotFound);
    }

    let created = store
        .create_poll(NewPoll {
            created_by: creator_id,
            title: title.to_string(),
            description: description.trim().to_string(),
            options,
        })
        .await
        .map_err(|err| match err {
            // The creator was deleted after the check above
            StoreError::NotFound => AppError::UserNotFound,
            other => other.into(),
        })?;

    tracing::info!(
        poll_id = created.poll.id,
        creator_id,
        options = created.options.len(),
        "poll created"
    );
    Ok(PollView::new(created, &Default::default()))
}

/// Every poll with its options and current vote counts.
pub async fn list_polls(store: &dyn Store) -> AppResult<Vec<PollView>> {
    let polls = store.list_polls().await?;
    tracing::debug!(count = polls.len(), "listing polls");

    let mut views = Vec::with_capacity(polls.len());
    for poll in polls {
        let counts = match ledger::tally(store, poll.poll.id).await {
            Ok(counts) => counts,
            // Deleted since the list was read
            Err(AppError::NotFound(_)) => continue,
            Err(err) => return Err(err),
        };
        views.push(PollView::new(poll, &counts));
    }
    Ok(views)
}

pub async fn get_poll(store: &dyn Store, poll_id: PollId) -> AppResult<PollView> {
    let poll = store
        .get_poll(poll_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("poll {poll_id}")))?;
    let counts = ledger::tally(store, poll_id).await?;
    Ok(PollView::new(poll, &counts))
}

/// Change title and description. Only the creator may do this.
///
/// Existence and ownership are checked before the new title is validated.
pub async fn update_poll(
    store: &dyn Store,
    poll_id: PollId,
    requester: UserId,
    title: &str,
    description: &str,
) -> AppResult<Poll> {
    ensure_owner(store, poll_id, requester).await?;

    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("poll title must not be empty".into()));
    }

    // The write repeats the ownership predicate, so a miss here means the poll
    // was deleted after the check above.
    let updated = store
        .update_poll_owned(poll_id, requester, title, description.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("poll {poll_id}")))?;

    tracing::info!(poll_id, requester, "poll updated");
    Ok(updated)
}

/// Delete a poll with its options and votes. Only the creator may do this.
pub async fn delete_poll(store: &dyn Store, poll_id: PollId, requester: UserId) -> AppResult<()> {
    ensure_owner(store, poll_id, requester).await?;

    if !store.delete_poll_owned(poll_id, requester).await? {
        return Err(AppError::NotFound(format!("poll {poll_id}")));
    }

    tracing::info!(poll_id, requester, "poll deleted");
    Ok(())
}

async fn ensure_owner(store: &dyn Store, poll_id: PollId, requester: UserId) -> AppResult<()> {
    let poll = store
        .get_poll(poll_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("poll {poll_id}")))?;

    if poll.poll.created_by != requester {
        tracing::warn!(poll_id, requester, owner = poll.poll.created_by, "non-owner tried to modify poll");
        return Err(AppError::Forbidden);
    }
    Ok(())
}
