//! In-memory repository fakes and router plumbing shared by the
//! integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use time::OffsetDateTime;
use tower::util::ServiceExt;
use uuid::Uuid;

use piazza::application::{
    feed::FeedService,
    follows::FollowService,
    posts::PostService,
    repos::{
        CommentsRepo, CreateCommentParams, CreatePostParams, FeedSlice, FollowsRepo, GroupsRepo,
        PostFeedScope, PostsRepo, RepoError, UpdatePostParams, UsersRepo,
    },
};
use piazza::cache::{CacheConfig, CacheState};
use piazza::domain::entities::{
    CommentRecord, FollowRecord, GroupRecord, PostRecord, UserRecord,
};
use piazza::infra::http::{HttpState, SESSION_COOKIE, SessionKeys, build_router};

pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

const BASE_UNIX_TIME: i64 = 1_700_000_000;

#[derive(Default)]
struct Store {
    users: Vec<UserRecord>,
    groups: Vec<GroupRecord>,
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
    follows: Vec<FollowRecord>,
    next_seq: i64,
    posts_offline: bool,
}

impl Store {
    fn next_timestamp(&mut self) -> OffsetDateTime {
        let seq = self.next_seq;
        self.next_seq += 1;
        OffsetDateTime::from_unix_timestamp(BASE_UNIX_TIME + seq).expect("valid timestamp")
    }
}

/// All five repository traits over one shared in-memory store.
#[derive(Clone, Default)]
pub struct MemoryRepos {
    store: Arc<Mutex<Store>>,
}

impl MemoryRepos {
    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().expect("store lock")
    }

    pub fn add_user(&self, username: &str) -> UserRecord {
        let mut store = self.lock();
        let created_at = store.next_timestamp();
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            created_at,
        };
        store.users.push(user.clone());
        user
    }

    pub fn add_group(&self, title: &str, slug: &str) -> GroupRecord {
        let mut store = self.lock();
        let created_at = store.next_timestamp();
        let group = GroupRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: slug.to_string(),
            description: format!("About {title}"),
            created_at,
        };
        store.groups.push(group.clone());
        group
    }

    pub fn add_post(
        &self,
        author: &UserRecord,
        group: Option<&GroupRecord>,
        text: &str,
    ) -> PostRecord {
        let mut store = self.lock();
        let created_at = store.next_timestamp();
        let post = PostRecord {
            id: Uuid::new_v4(),
            text: text.to_string(),
            author_id: author.id,
            author_username: author.username.clone(),
            group_id: group.map(|g| g.id),
            group_title: group.map(|g| g.title.clone()),
            group_slug: group.map(|g| g.slug.clone()),
            image_path: None,
            created_at,
        };
        store.posts.push(post.clone());
        post
    }

    /// Make every post query fail with a persistence error.
    pub fn set_posts_offline(&self) {
        self.lock().posts_offline = true;
    }

    fn check_posts_online(store: &Store) -> Result<(), RepoError> {
        if store.posts_offline {
            return Err(RepoError::from_persistence("post storage offline"));
        }
        Ok(())
    }

    pub fn post_by_text(&self, text: &str) -> Option<PostRecord> {
        self.lock().posts.iter().find(|p| p.text == text).cloned()
    }

    pub fn post_count(&self) -> usize {
        self.lock().posts.len()
    }

    pub fn comment_count(&self) -> usize {
        self.lock().comments.len()
    }

    pub fn follow_count(&self) -> usize {
        self.lock().follows.len()
    }

    fn scoped_posts(store: &Store, scope: PostFeedScope) -> Vec<PostRecord> {
        let mut posts: Vec<PostRecord> = store
            .posts
            .iter()
            .filter(|post| match scope {
                PostFeedScope::All => true,
                PostFeedScope::Group(group_id) => post.group_id == Some(group_id),
                PostFeedScope::Author(author_id) => post.author_id == author_id,
                PostFeedScope::FollowedBy(user_id) => store
                    .follows
                    .iter()
                    .any(|f| f.user_id == user_id && f.author_id == post.author_id),
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        posts
    }
}

#[async_trait]
impl UsersRepo for MemoryRepos {
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl GroupsRepo for MemoryRepos {
    async fn get_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError> {
        Ok(self.lock().groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn get_group_by_id(&self, id: Uuid) -> Result<Option<GroupRecord>, RepoError> {
        Ok(self.lock().groups.iter().find(|g| g.id == id).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError> {
        let mut groups = self.lock().groups.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }
}

#[async_trait]
impl PostsRepo for MemoryRepos {
    async fn list_posts(
        &self,
        scope: PostFeedScope,
        slice: FeedSlice,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let store = self.lock();
        Self::check_posts_online(&store)?;
        let posts = Self::scoped_posts(&store, scope);
        Ok(posts
            .into_iter()
            .skip(slice.offset as usize)
            .take(slice.limit as usize)
            .collect())
    }

    async fn count_posts(&self, scope: PostFeedScope) -> Result<u64, RepoError> {
        let store = self.lock();
        Self::check_posts_online(&store)?;
        Ok(Self::scoped_posts(&store, scope).len() as u64)
    }

    async fn get_post_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        Ok(self.lock().posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut store = self.lock();
        let author = store
            .users
            .iter()
            .find(|u| u.id == params.author_id)
            .cloned()
            .ok_or(RepoError::NotFound)?;
        let group = params
            .group_id
            .and_then(|id| store.groups.iter().find(|g| g.id == id).cloned());
        let created_at = store.next_timestamp();
        let post = PostRecord {
            id: Uuid::new_v4(),
            text: params.text,
            author_id: author.id,
            author_username: author.username,
            group_id: group.as_ref().map(|g| g.id),
            group_title: group.as_ref().map(|g| g.title.clone()),
            group_slug: group.as_ref().map(|g| g.slug.clone()),
            image_path: params.image_path,
            created_at,
        };
        store.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let mut store = self.lock();
        let group = params
            .group_id
            .and_then(|id| store.groups.iter().find(|g| g.id == id).cloned());
        let post = store
            .posts
            .iter_mut()
            .find(|p| p.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.text = params.text;
        post.group_id = group.as_ref().map(|g| g.id);
        post.group_title = group.as_ref().map(|g| g.title.clone());
        post.group_slug = group.as_ref().map(|g| g.slug.clone());
        post.image_path = params.image_path;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.lock();
        let before = store.posts.len();
        store.posts.retain(|p| p.id != id);
        if store.posts.len() == before {
            return Err(RepoError::NotFound);
        }
        store.comments.retain(|c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for MemoryRepos {
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let mut comments: Vec<CommentRecord> = self
            .lock()
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(comments)
    }

    async fn create_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let mut store = self.lock();
        let author = store
            .users
            .iter()
            .find(|u| u.id == params.author_id)
            .cloned()
            .ok_or(RepoError::NotFound)?;
        let created_at = store.next_timestamp();
        let comment = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            author_id: author.id,
            author_username: author.username,
            text: params.text,
            created_at,
        };
        store.comments.push(comment.clone());
        Ok(comment)
    }
}

#[async_trait]
impl FollowsRepo for MemoryRepos {
    async fn get_or_create_follow(
        &self,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<FollowRecord, RepoError> {
        let mut store = self.lock();
        if let Some(existing) = store
            .follows
            .iter()
            .find(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok(existing.clone());
        }
        let created_at = store.next_timestamp();
        let follow = FollowRecord {
            id: Uuid::new_v4(),
            user_id,
            author_id,
            created_at,
        };
        store.follows.push(follow.clone());
        Ok(follow)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> Result<(), RepoError> {
        self.lock()
            .follows
            .retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(())
    }

    async fn follow_exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        Ok(self
            .lock()
            .follows
            .iter()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }
}

pub struct TestApp {
    pub repos: MemoryRepos,
    pub router: Router,
    pub sessions: SessionKeys,
}

pub fn build_app(page_size: u32, cache: Option<CacheConfig>) -> TestApp {
    let repos = MemoryRepos::default();
    let sessions = SessionKeys::new(TEST_SECRET);

    let posts_repo: Arc<dyn PostsRepo> = Arc::new(repos.clone());
    let users_repo: Arc<dyn UsersRepo> = Arc::new(repos.clone());
    let groups_repo: Arc<dyn GroupsRepo> = Arc::new(repos.clone());
    let comments_repo: Arc<dyn CommentsRepo> = Arc::new(repos.clone());
    let follows_repo: Arc<dyn FollowsRepo> = Arc::new(repos.clone());

    let feed = Arc::new(FeedService::new(
        posts_repo.clone(),
        users_repo.clone(),
        groups_repo.clone(),
        comments_repo.clone(),
        follows_repo.clone(),
        page_size,
    ));
    let posts = Arc::new(PostService::new(
        posts_repo,
        comments_repo,
        groups_repo.clone(),
    ));
    let follows = Arc::new(FollowService::new(users_repo.clone(), follows_repo));

    let state = HttpState {
        feed,
        posts,
        follows,
        users: users_repo,
        groups: groups_repo,
        db: None,
        cache: cache.map(CacheState::new),
        sessions: Arc::new(sessions.clone()),
    };

    TestApp {
        repos,
        router: build_router(state),
        sessions,
    }
}

impl TestApp {
    pub fn session_cookie(&self, user: &UserRecord) -> String {
        format!("{SESSION_COOKIE}={}", self.sessions.sign(user.id))
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }

    pub async fn get_as(&self, uri: &str, cookie: &str) -> Response<Body> {
        let request = Request::builder()
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }

    pub async fn post_form(&self, uri: &str, cookie: &str, body: &str) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(Body::from(body.to_string()))
            .expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }

    pub async fn post_anonymous(&self, uri: &str, body: &str) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(Body::from(body.to_string()))
            .expect("request");
        self.router.clone().oneshot(request).await.expect("response")
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub fn location_header(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Seed `count` posts named post-1..post-N for one author (post-N newest).
pub fn seed_posts(repos: &MemoryRepos, author: &UserRecord, count: usize) {
    for i in 1..=count {
        repos.add_post(author, None, &format!("post-{i}"));
    }
}
