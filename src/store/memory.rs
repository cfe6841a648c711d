// src/store/memory.rs
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{PollStore, StoreResult, UserStore, VoteStore};
use crate::error::StoreError;
use crate::models::{
    NewPoll, NewUser, OptionId, Poll, PollId, PollOption, PollWithOptions, User, UserId, Vote,
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<UserId, User>,
    polls: BTreeMap<PollId, Poll>,
    options: BTreeMap<OptionId, PollOption>,
    votes: BTreeMap<i64, Vote>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn options_of(&self, poll_id: PollId) -> Vec<PollOption> {
        let mut options: Vec<PollOption> = self
            .options
            .values()
            .filter(|o| o.poll_id == poll_id)
            .cloned()
            .collect();
        options.sort_by_key(|o| o.order);
        options
    }

    fn with_options(&self, poll: &Poll) -> PollWithOptions {
        PollWithOptions {
            poll: poll.clone(),
            options: self.options_of(poll.id),
        }
    }
}

/// In-process store. A single mutex serialises every operation, which makes
/// each call atomic the way a single statement or transaction is in Postgres.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vote rows recorded for `(poll_id, user_id)`.
    pub async fn vote_rows(&self, poll_id: PollId, user_id: UserId) -> usize {
        let tables = self.tables.lock().await;
        tables
            .votes
            .values()
            .filter(|v| v.poll_id == poll_id && v.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation("users_username_key".into()));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }

        let id = tables.next_id();
        let user = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn create_poll(&self, new: NewPoll) -> StoreResult<PollWithOptions> {
        let mut tables = self.tables.lock().await;
        let poll = Poll {
            id: tables.next_id(),
            title: new.title,
            description: new.description,
            created_by: new.created_by,
            created_at: Utc::now(),
        };

        let mut options = Vec::with_capacity(new.options.len());
        for (order, text) in new.options.into_iter().enumerate() {
            options.push(PollOption {
                id: tables.next_id(),
                poll_id: poll.id,
                option_text: text,
                order: order as i32,
            });
        }

        tables.polls.insert(poll.id, poll.clone());
        for option in &options {
            tables.options.insert(option.id, option.clone());
        }
        Ok(PollWithOptions { poll, options })
    }

    async fn list_polls(&self) -> StoreResult<Vec<PollWithOptions>> {
        let tables = self.tables.lock().await;
        // Ids are monotonic, so reverse id order is newest first
        Ok(tables
            .polls
            .values()
            .rev()
            .map(|p| tables.with_options(p))
            .collect())
    }

    async fn get_poll(&self, id: PollId) -> StoreResult<Option<PollWithOptions>> {
        let tables = self.tables.lock().await;
        Ok(tables.polls.get(&id).map(|p| tables.with_options(p)))
    }

    async fn update_poll_owned(
        &self,
        id: PollId,
        owner: UserId,
        title: &str,
        description: &str,
    ) -> StoreResult<Option<Poll>> {
        let mut tables = self.tables.lock().await;
        match tables.polls.get_mut(&id) {
            Some(poll) if poll.created_by == owner => {
                poll.title = title.to_string();
                poll.description = description.to_string();
                Ok(Some(poll.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_poll_owned(&self, id: PollId, owner: UserId) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let owned = matches!(tables.polls.get(&id), Some(p) if p.created_by == owner);
        if !owned {
            return Ok(false);
        }

        tables.polls.remove(&id);
        tables.options.retain(|_, o| o.poll_id != id);
        tables.votes.retain(|_, v| v.poll_id != id);
        Ok(true)
    }
}

#[async_trait]
impl VoteStore for MemoryStore {
    async fn user_exists(&self, id: UserId) -> StoreResult<bool> {
        Ok(self.tables.lock().await.users.contains_key(&id))
    }

    async fn poll_exists(&self, id: PollId) -> StoreResult<bool> {
        Ok(self.tables.lock().await.polls.contains_key(&id))
    }

    async fn find_option(&self, id: OptionId) -> StoreResult<Option<PollOption>> {
        Ok(self.tables.lock().await.options.get(&id).cloned())
    }

    async fn list_options(&self, poll_id: PollId) -> StoreResult<Vec<PollOption>> {
        Ok(self.tables.lock().await.options_of(poll_id))
    }

    async fn find_vote(&self, poll_id: PollId, user_id: UserId) -> StoreResult<Option<Vote>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .votes
            .values()
            .find(|v| v.poll_id == poll_id && v.user_id == user_id)
            .cloned())
    }

    async fn insert_vote(
        &self,
        poll_id: PollId,
        option_id: OptionId,
        user_id: UserId,
    ) -> StoreResult<Vote> {
        let mut tables = self.tables.lock().await;
        if tables
            .votes
            .values()
            .any(|v| v.poll_id == poll_id && v.user_id == user_id)
        {
            return Err(StoreError::UniqueViolation("votes_poll_id_user_id_key".into()));
        }
        // Foreign keys
        if !tables.polls.contains_key(&poll_id) || !tables.options.contains_key(&option_id) {
            return Err(StoreError::NotFound);
        }

        let vote = Vote {
            id: tables.next_id(),
            poll_id,
            poll_option_id: option_id,
            user_id,
            created_at: Utc::now(),
        };
        tables.votes.insert(vote.id, vote.clone());
        Ok(vote)
    }

    async fn update_vote_option(&self, vote_id: i64, option_id: OptionId) -> StoreResult<Vote> {
        let mut tables = self.tables.lock().await;
        if !tables.options.contains_key(&option_id) {
            return Err(StoreError::NotFound);
        }
        let vote = tables.votes.get_mut(&vote_id).ok_or(StoreError::NotFound)?;
        vote.poll_option_id = option_id;
        Ok(vote.clone())
    }

    async fn count_votes(&self, poll_id: PollId) -> StoreResult<Vec<(OptionId, i64)>> {
        let tables = self.tables.lock().await;
        let mut counts: HashMap<OptionId, i64> = HashMap::new();
        for vote in tables.votes.values().filter(|v| v.poll_id == poll_id) {
            *counts.entry(vote.poll_option_id).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }
}
