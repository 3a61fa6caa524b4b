//! Post and comment writes: create, edit, delete, comment.
//!
//! Ownership denial is an outcome, not an error: the HTTP layer turns
//! `NotAuthor` into a redirect to the post detail page with nothing
//! surfaced to the user.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{
    CommentsRepo, CreateCommentParams, CreatePostParams, GroupsRepo, PostsRepo, RepoError,
    UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, PostRecord};
use crate::domain::posts::{CommentInput, FieldError, PostInput};

#[derive(Debug, Error)]
pub enum PostWriteError {
    #[error("unknown group")]
    UnknownGroup,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug)]
pub enum CreatePostOutcome {
    /// Persisted; redirect to the author's profile.
    Created(PostRecord),
    /// Validation failed; re-render the form with inline errors.
    Invalid(Vec<FieldError>),
}

#[derive(Debug)]
pub enum EditPostOutcome {
    /// Persisted; redirect to the post detail page.
    Updated(PostRecord),
    /// Acting user is not the author; redirect to detail, say nothing.
    NotAuthor,
    /// Validation failed; re-render the form with inline errors.
    Invalid(Vec<FieldError>),
    NotFound,
}

#[derive(Debug)]
pub enum DeletePostOutcome {
    /// Deleted; redirect to the acting user's profile.
    Deleted,
    /// Acting user is not the author; redirect to detail, say nothing.
    NotAuthor,
    NotFound,
}

#[derive(Debug)]
pub enum AddCommentOutcome {
    /// Persisted; redirect to the post detail page.
    Added(CommentRecord),
    /// Validation failed; re-render post detail with the inline error.
    Invalid(Vec<FieldError>),
    PostNotFound,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    groups: Arc<dyn GroupsRepo>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        comments: Arc<dyn CommentsRepo>,
        groups: Arc<dyn GroupsRepo>,
    ) -> Self {
        Self {
            posts,
            comments,
            groups,
        }
    }

    /// Fetch a post as stored, for prefilled edit forms.
    pub async fn load_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        self.posts.get_post_by_id(id).await
    }

    /// Create a post authored by `author_id`. A submitted group id must
    /// name an existing group; nothing is persisted on validation failure.
    pub async fn create_post(
        &self,
        author_id: Uuid,
        input: PostInput,
    ) -> Result<CreatePostOutcome, PostWriteError> {
        let valid = match input.validate() {
            Ok(valid) => valid,
            Err(errors) => return Ok(CreatePostOutcome::Invalid(errors)),
        };

        if let Some(group_id) = valid.group_id {
            self.require_group(group_id).await?;
        }

        let record = self
            .posts
            .create_post(CreatePostParams {
                author_id,
                text: valid.text,
                group_id: valid.group_id,
                image_path: valid.image_path,
            })
            .await?;

        Ok(CreatePostOutcome::Created(record))
    }

    /// Edit a post. The author check happens before validation so a
    /// non-author never sees form errors, matching the silent redirect.
    pub async fn edit_post(
        &self,
        acting_user: Uuid,
        post_id: Uuid,
        input: PostInput,
    ) -> Result<EditPostOutcome, PostWriteError> {
        let Some(existing) = self.posts.get_post_by_id(post_id).await? else {
            return Ok(EditPostOutcome::NotFound);
        };

        if existing.author_id != acting_user {
            return Ok(EditPostOutcome::NotAuthor);
        }

        let valid = match input.validate() {
            Ok(valid) => valid,
            Err(errors) => return Ok(EditPostOutcome::Invalid(errors)),
        };

        if let Some(group_id) = valid.group_id {
            self.require_group(group_id).await?;
        }

        let record = self
            .posts
            .update_post(UpdatePostParams {
                id: post_id,
                text: valid.text,
                group_id: valid.group_id,
                image_path: valid.image_path,
            })
            .await?;

        Ok(EditPostOutcome::Updated(record))
    }

    pub async fn delete_post(
        &self,
        acting_user: Uuid,
        post_id: Uuid,
    ) -> Result<DeletePostOutcome, PostWriteError> {
        let Some(existing) = self.posts.get_post_by_id(post_id).await? else {
            return Ok(DeletePostOutcome::NotFound);
        };

        if existing.author_id != acting_user {
            return Ok(DeletePostOutcome::NotAuthor);
        }

        self.posts.delete_post(post_id).await?;
        Ok(DeletePostOutcome::Deleted)
    }

    pub async fn add_comment(
        &self,
        acting_user: Uuid,
        post_id: Uuid,
        input: CommentInput,
    ) -> Result<AddCommentOutcome, PostWriteError> {
        if self.posts.get_post_by_id(post_id).await?.is_none() {
            return Ok(AddCommentOutcome::PostNotFound);
        }

        let valid = match input.validate() {
            Ok(valid) => valid,
            Err(errors) => return Ok(AddCommentOutcome::Invalid(errors)),
        };

        let record = self
            .comments
            .create_comment(CreateCommentParams {
                post_id,
                author_id: acting_user,
                text: valid.text,
            })
            .await?;

        Ok(AddCommentOutcome::Added(record))
    }

    async fn require_group(&self, group_id: Uuid) -> Result<(), PostWriteError> {
        self.groups
            .get_group_by_id(group_id)
            .await?
            .map(|_| ())
            .ok_or(PostWriteError::UnknownGroup)
    }
}
