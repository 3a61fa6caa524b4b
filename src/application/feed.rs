//! Feed assembly: resolve a filter into a reverse-chronological page of posts.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{PageNumber, PageWindow, Paginated};
use crate::application::repos::{
    CommentsRepo, FeedSlice, FollowsRepo, GroupsRepo, PostFeedScope, PostsRepo, RepoError,
    UsersRepo,
};
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Clone)]
pub enum FeedFilter {
    All,
    Group(String),
    Author(String),
    /// Posts by authors the given user follows.
    FollowedBy(Uuid),
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group")]
    UnknownGroup,
    #[error("unknown author")]
    UnknownAuthor,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// A group feed page together with the resolved group.
#[derive(Debug, Clone)]
pub struct GroupFeed {
    pub group: GroupRecord,
    pub posts: Paginated<PostRecord>,
}

/// An author's profile page: their posts, the total count shown in the
/// header, and whether the viewing user follows them.
#[derive(Debug, Clone)]
pub struct ProfileFeed {
    pub author: UserRecord,
    pub posts: Paginated<PostRecord>,
    pub post_count: u64,
    pub viewer_follows: bool,
}

/// A post detail view: the post, its comments in ascending order, and the
/// author's total post count.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostRecord,
    pub comments: Vec<CommentRecord>,
    pub author_post_count: u64,
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    users: Arc<dyn UsersRepo>,
    groups: Arc<dyn GroupsRepo>,
    comments: Arc<dyn CommentsRepo>,
    follows: Arc<dyn FollowsRepo>,
    page_size: u32,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        users: Arc<dyn UsersRepo>,
        groups: Arc<dyn GroupsRepo>,
        comments: Arc<dyn CommentsRepo>,
        follows: Arc<dyn FollowsRepo>,
        page_size: u32,
    ) -> Self {
        Self {
            posts,
            users,
            groups,
            comments,
            follows,
            page_size,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Count then slice: the window is clamped against the total, so an
    /// out-of-range page number lands on a valid page instead of erroring.
    async fn paginate(
        &self,
        scope: PostFeedScope,
        raw_page: Option<&str>,
    ) -> Result<Paginated<PostRecord>, FeedError> {
        let total = self.posts.count_posts(scope).await?;
        let window = PageWindow::resolve(total, self.page_size, PageNumber::parse(raw_page));
        let items = self
            .posts
            .list_posts(
                scope,
                FeedSlice {
                    limit: window.limit(),
                    offset: window.offset,
                },
            )
            .await?;
        Ok(Paginated::new(items, window))
    }

    /// The home feed: every post, newest first.
    pub async fn home_page(&self, raw_page: Option<&str>) -> Result<Paginated<PostRecord>, FeedError> {
        self.paginate(PostFeedScope::All, raw_page).await
    }

    /// Posts of one group, resolved by slug.
    pub async fn group_page(&self, slug: &str, raw_page: Option<&str>) -> Result<GroupFeed, FeedError> {
        let group = self
            .groups
            .get_group_by_slug(slug)
            .await?
            .ok_or(FeedError::UnknownGroup)?;
        let posts = self.paginate(PostFeedScope::Group(group.id), raw_page).await?;
        Ok(GroupFeed { group, posts })
    }

    /// An author's profile feed plus their total post count. `viewer` is
    /// the authenticated user (if any) and drives the follow toggle.
    pub async fn profile_page(
        &self,
        username: &str,
        raw_page: Option<&str>,
        viewer: Option<Uuid>,
    ) -> Result<ProfileFeed, FeedError> {
        let author = self
            .users
            .get_user_by_username(username)
            .await?
            .ok_or(FeedError::UnknownAuthor)?;
        let posts = self.paginate(PostFeedScope::Author(author.id), raw_page).await?;
        let post_count = posts.window.total_count;

        let viewer_follows = match viewer {
            Some(viewer_id) if viewer_id != author.id => {
                self.follows.follow_exists(viewer_id, author.id).await?
            }
            _ => false,
        };

        Ok(ProfileFeed {
            author,
            posts,
            post_count,
            viewer_follows,
        })
    }

    /// Posts by the authors the given user follows. A user who follows
    /// nobody gets an empty first page, not an error.
    pub async fn following_page(
        &self,
        user_id: Uuid,
        raw_page: Option<&str>,
    ) -> Result<Paginated<PostRecord>, FeedError> {
        self.paginate(PostFeedScope::FollowedBy(user_id), raw_page).await
    }

    /// One post with its comments. `None` when the id is unknown.
    pub async fn post_detail(&self, id: Uuid) -> Result<Option<PostDetail>, FeedError> {
        let Some(post) = self.posts.get_post_by_id(id).await? else {
            return Ok(None);
        };

        let comments = self.comments.list_comments(post.id).await?;
        let author_post_count = self
            .posts
            .count_posts(PostFeedScope::Author(post.author_id))
            .await?;

        Ok(Some(PostDetail {
            post,
            comments,
            author_post_count,
        }))
    }
}
