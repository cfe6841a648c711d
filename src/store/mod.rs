// src/store/mod.rs
//! Persistence seams for users, polls and votes.
//!
//! Two backends implement these traits: [`PgStore`] for PostgreSQL and
//! [`MemoryStore`] for local runs and tests. Both enforce the same rules:
//! unique usernames and emails, one vote per `(poll_id, user_id)`, and
//! deleting a poll removes its options and votes.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{
    NewPoll, NewUser, OptionId, Poll, PollId, PollOption, PollWithOptions, User, UserId, Vote,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Credential storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::UniqueViolation`] when the username or email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

/// Poll and option storage.
#[async_trait]
pub trait PollStore: Send + Sync {
    /// Insert the poll and all of its options atomically.
    async fn create_poll(&self, poll: NewPoll) -> StoreResult<PollWithOptions>;
    /// All polls, newest first, each with options sorted by `order`.
    async fn list_polls(&self) -> StoreResult<Vec<PollWithOptions>>;
    async fn get_poll(&self, id: PollId) -> StoreResult<Option<PollWithOptions>>;
    /// Update title and description only if `owner` created the poll.
    /// Returns `None` when no row matched.
    async fn update_poll_owned(
        &self,
        id: PollId,
        owner: UserId,
        title: &str,
        description: &str,
    ) -> StoreResult<Option<Poll>>;
    /// Delete the poll (cascading to options and votes) only if `owner` created it.
    /// Returns whether a row was removed.
    async fn delete_poll_owned(&self, id: PollId, owner: UserId) -> StoreResult<bool>;
}

/// Everything the vote ledger reads and writes.
#[async_trait]
pub trait VoteStore: Send + Sync {
    async fn user_exists(&self, id: UserId) -> StoreResult<bool>;
    async fn poll_exists(&self, id: PollId) -> StoreResult<bool>;
    async fn find_option(&self, id: OptionId) -> StoreResult<Option<PollOption>>;
    async fn list_options(&self, poll_id: PollId) -> StoreResult<Vec<PollOption>>;
    async fn find_vote(&self, poll_id: PollId, user_id: UserId) -> StoreResult<Option<Vote>>;
    /// Fails with [`StoreError::UniqueViolation`] if the user already voted on the poll.
    async fn insert_vote(
        &self,
        poll_id: PollId,
        option_id: OptionId,
        user_id: UserId,
    ) -> StoreResult<Vote>;
    /// Point an existing vote at another option. Fails with [`StoreError::NotFound`]
    /// if the vote row is gone.
    async fn update_vote_option(&self, vote_id: i64, option_id: OptionId) -> StoreResult<Vote>;
    /// `(option_id, count)` for every option of the poll that has at least one vote.
    async fn count_votes(&self, poll_id: PollId) -> StoreResult<Vec<(OptionId, i64)>>;
}

/// The full storage surface the application runs against.
pub trait Store: UserStore + PollStore + VoteStore {}

impl<T: UserStore + PollStore + VoteStore> Store for T {}
