// models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type UserId = i64;
pub type PollId = i64;
pub type OptionId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Poll {
    pub id: PollId,
    pub title: String,
    pub description: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PollOption {
    pub id: OptionId,
    pub poll_id: PollId,
    pub option_text: String,
    pub order: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vote {
    pub id: i64,
    pub poll_id: PollId,
    pub poll_option_id: OptionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A poll together with its options in `order` sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct PollWithOptions {
    pub poll: Poll,
    pub options: Vec<PollOption>,
}

/// Per-option vote counts for one poll, keyed by option id.
pub type Tally = BTreeMap<OptionId, i64>;

// Insert payloads handed to the stores

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewPoll {
    pub created_by: UserId,
    pub title: String,
    pub description: String,
    /// Already filtered; position in this list becomes the option's `order`.
    pub options: Vec<String>,
}

// Request bodies

#[derive(Debug, Deserialize)]
pub struct CreatePollRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub options: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePollRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub poll_option_id: OptionId,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// Response bodies

#[derive(Debug, Serialize, Deserialize)]
pub struct OptionView {
    pub id: OptionId,
    pub text: String,
    pub order: i32,
    pub vote_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PollView {
    pub id: PollId,
    pub title: String,
    pub description: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub options: Vec<OptionView>,
}

impl PollView {
    /// Combine a poll with its tally. Options missing from the tally show zero votes.
    pub fn new(poll: PollWithOptions, tally: &Tally) -> Self {
        let options = poll
            .options
            .into_iter()
            .map(|option| OptionView {
                vote_count: tally.get(&option.id).copied().unwrap_or(0),
                id: option.id,
                text: option.option_text,
                order: option.order,
            })
            .collect();

        PollView {
            id: poll.poll.id,
            title: poll.poll.title,
            description: poll.poll.description,
            created_by: poll.poll.created_by,
            created_at: poll.poll.created_at,
            options,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteCountsResponse {
    pub vote_counts: Tally,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}
