//! Follow and unfollow: directed edges between users.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{FollowsRepo, RepoError, UsersRepo};
use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum FollowError {
    #[error("unknown author")]
    UnknownAuthor,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug)]
pub enum FollowOutcome {
    /// Edge exists now (created or already present); redirect to the
    /// target's profile.
    Following(UserRecord),
    /// Acting user tried to follow themselves; redirect home, create
    /// nothing, say nothing.
    SelfFollow,
}

#[derive(Debug)]
pub enum UnfollowOutcome {
    /// Edge removed, or was never there; either way redirect to the
    /// target's profile.
    NotFollowing(UserRecord),
}

#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UsersRepo>, follows: Arc<dyn FollowsRepo>) -> Self {
        Self { users, follows }
    }

    /// Follow `target_username`. Idempotent: at most one edge per
    /// (follower, author) pair can exist, enforced by get-or-create
    /// against the unique constraint.
    pub async fn follow(
        &self,
        acting_user: Uuid,
        target_username: &str,
    ) -> Result<FollowOutcome, FollowError> {
        let target = self.require_user(target_username).await?;

        if target.id == acting_user {
            return Ok(FollowOutcome::SelfFollow);
        }

        self.follows
            .get_or_create_follow(acting_user, target.id)
            .await?;
        Ok(FollowOutcome::Following(target))
    }

    /// Unfollow `target_username`. Removing a relation that does not
    /// exist is a no-op, not an error.
    pub async fn unfollow(
        &self,
        acting_user: Uuid,
        target_username: &str,
    ) -> Result<UnfollowOutcome, FollowError> {
        let target = self.require_user(target_username).await?;
        self.follows.delete_follow(acting_user, target.id).await?;
        Ok(UnfollowOutcome::NotFollowing(target))
    }

    async fn require_user(&self, username: &str) -> Result<UserRecord, FollowError> {
        self.users
            .get_user_by_username(username)
            .await?
            .ok_or(FollowError::UnknownAuthor)
    }
}
