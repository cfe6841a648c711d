// src/store/postgres.rs
use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{PollStore, StoreResult, UserStore, VoteStore};
use crate::error::StoreError;
use crate::models::{
    NewPoll, NewUser, OptionId, Poll, PollId, PollOption, PollWithOptions, User, UserId, Vote,
};

const POLL_COLUMNS: &str = "id, title, description, created_by, created_at";
const OPTION_COLUMNS: &str = r#"id, poll_id, option_text, "order""#;
const VOTE_COLUMNS: &str = "id, poll_id, poll_option_id, user_id, created_at";

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, username, email, password_hash, created_at",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::classify)
    }

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl PollStore for PgStore {
    async fn create_poll(&self, new: NewPoll) -> StoreResult<PollWithOptions> {
        // Dropping the transaction on any early return rolls back the poll row
        let mut tx = self.pool.begin().await?;

        let poll = sqlx::query_as::<_, Poll>(&format!(
            "INSERT INTO polls (title, description, created_by) VALUES ($1, $2, $3) \
             RETURNING {POLL_COLUMNS}"
        ))
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(StoreError::classify)?;

        let mut options = Vec::with_capacity(new.options.len());
        for (order, text) in new.options.iter().enumerate() {
            let option = sqlx::query_as::<_, PollOption>(&format!(
                r#"INSERT INTO poll_options (poll_id, option_text, "order") VALUES ($1, $2, $3)
                   RETURNING {OPTION_COLUMNS}"#
            ))
            .bind(poll.id)
            .bind(text)
            .bind(order as i32)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::classify)?;
            options.push(option);
        }

        tx.commit().await?;
        Ok(PollWithOptions { poll, options })
    }

    async fn list_polls(&self) -> StoreResult<Vec<PollWithOptions>> {
        let polls = sqlx::query_as::<_, Poll>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let options = sqlx::query_as::<_, PollOption>(&format!(
            r#"SELECT {OPTION_COLUMNS} FROM poll_options ORDER BY poll_id, "order""#
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut by_poll: HashMap<PollId, Vec<PollOption>> = HashMap::new();
        for option in options {
            by_poll.entry(option.poll_id).or_default().push(option);
        }

        Ok(polls
            .into_iter()
            .map(|poll| PollWithOptions {
                options: by_poll.remove(&poll.id).unwrap_or_default(),
                poll,
            })
            .collect())
    }

    async fn get_poll(&self, id: PollId) -> StoreResult<Option<PollWithOptions>> {
        let poll = sqlx::query_as::<_, Poll>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(poll) = poll else {
            return Ok(None);
        };
        let options = self.list_options(poll.id).await?;
        Ok(Some(PollWithOptions { poll, options }))
    }

    async fn update_poll_owned(
        &self,
        id: PollId,
        owner: UserId,
        title: &str,
        description: &str,
    ) -> StoreResult<Option<Poll>> {
        let poll = sqlx::query_as::<_, Poll>(&format!(
            "UPDATE polls SET title = $3, description = $4 \
             WHERE id = $1 AND created_by = $2 RETURNING {POLL_COLUMNS}"
        ))
        .bind(id)
        .bind(owner)
        .bind(title)
        .bind(description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(poll)
    }

    async fn delete_poll_owned(&self, id: PollId, owner: UserId) -> StoreResult<bool> {
        // Options and votes go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM polls WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl VoteStore for PgStore {
    async fn user_exists(&self, id: UserId) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn poll_exists(&self, id: PollId) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM polls WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn find_option(&self, id: OptionId) -> StoreResult<Option<PollOption>> {
        let option = sqlx::query_as::<_, PollOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM poll_options WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(option)
    }

    async fn list_options(&self, poll_id: PollId) -> StoreResult<Vec<PollOption>> {
        let options = sqlx::query_as::<_, PollOption>(&format!(
            r#"SELECT {OPTION_COLUMNS} FROM poll_options WHERE poll_id = $1 ORDER BY "order""#
        ))
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }

    async fn find_vote(&self, poll_id: PollId, user_id: UserId) -> StoreResult<Option<Vote>> {
        let vote = sqlx::query_as::<_, Vote>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE poll_id = $1 AND user_id = $2"
        ))
        .bind(poll_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vote)
    }

    async fn insert_vote(
        &self,
        poll_id: PollId,
        option_id: OptionId,
        user_id: UserId,
    ) -> StoreResult<Vote> {
        sqlx::query_as::<_, Vote>(&format!(
            "INSERT INTO votes (poll_id, poll_option_id, user_id) VALUES ($1, $2, $3) \
             RETURNING {VOTE_COLUMNS}"
        ))
        .bind(poll_id)
        .bind(option_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::classify)
    }

    async fn update_vote_option(&self, vote_id: i64, option_id: OptionId) -> StoreResult<Vote> {
        sqlx::query_as::<_, Vote>(&format!(
            "UPDATE votes SET poll_option_id = $2 WHERE id = $1 RETURNING {VOTE_COLUMNS}"
        ))
        .bind(vote_id)
        .bind(option_id)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::classify)
    }

    async fn count_votes(&self, poll_id: PollId) -> StoreResult<Vec<(OptionId, i64)>> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            "SELECT poll_option_id, COUNT(*) FROM votes WHERE poll_id = $1 GROUP BY poll_option_id",
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }
}
