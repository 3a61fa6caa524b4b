use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    application::{
        feed::FeedService,
        follows::FollowService,
        posts::PostService,
        repos::{GroupsRepo, UsersRepo},
    },
    cache::{CacheState, response_cache_layer},
    infra::db::PostgresRepositories,
    presentation::views::{
        FormErrorView, GroupTemplate, IndexTemplate, PaginationView, PostCardView,
        PostDetailTemplate, ProfileTemplate, post_cards, render_not_found_response,
        render_template_response,
    },
};

use super::{
    auth::{AuthContext, SessionKeys, authenticate},
    db_health_response, feed_error_to_response, follows, posts,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub posts: Arc<PostService>,
    pub follows: Arc<FollowService>,
    pub users: Arc<dyn UsersRepo>,
    pub groups: Arc<dyn GroupsRepo>,
    pub db: Option<Arc<PostgresRepositories>>,
    pub cache: Option<CacheState>,
    pub sessions: Arc<SessionKeys>,
}

pub fn build_router(state: HttpState) -> Router {
    // Only the home feed is cached; every other page renders fresh.
    let cached_routes = Router::new().route("/", get(home));

    let cached_routes = if let Some(cache_state) = state.cache.clone() {
        cached_routes.layer(middleware::from_fn_with_state(
            cache_state,
            response_cache_layer,
        ))
    } else {
        cached_routes
    };

    let routes = Router::new()
        .route("/group/{slug}/", get(group_feed))
        .route("/profile/{username}/", get(profile))
        .route("/posts/{id}/", get(post_detail))
        .route("/create/", get(posts::create_form).post(posts::create_submit))
        .route(
            "/posts/{id}/edit/",
            get(posts::edit_form).post(posts::edit_submit),
        )
        .route("/posts/{id}/delete/", post(posts::delete_submit))
        .route("/posts/{id}/comment/", post(posts::comment_submit))
        .route("/follow/", get(follows::follow_index))
        .route("/profile/{username}/follow/", post(follows::follow_author))
        .route(
            "/profile/{username}/unfollow/",
            post(follows::unfollow_author),
        )
        .route("/_cache/flush", post(flush_cache))
        .route("/_health/db", get(db_health));

    // Session resolution wraps the cache layer so a tampered cookie is
    // refused even when the page itself would be served from cache.
    cached_routes
        .merge(routes)
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PageQuery {
    pub page: Option<String>,
}

async fn home(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.home_page(query.page.as_deref()).await {
        Ok(page) => render_template_response(
            IndexTemplate {
                viewer: auth.viewer(),
                posts: post_cards(&page),
                pagination: PaginationView::from_window("/", &page.window),
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response(err, auth.viewer()),
    }
}

async fn group_feed(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.group_page(&slug, query.page.as_deref()).await {
        Ok(feed) => render_template_response(
            GroupTemplate {
                viewer: auth.viewer(),
                title: feed.group.title.clone(),
                description: feed.group.description.clone(),
                posts: post_cards(&feed.posts),
                pagination: PaginationView::from_window(
                    format!("/group/{}/", feed.group.slug),
                    &feed.posts.window,
                ),
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response(err, auth.viewer()),
    }
}

async fn profile(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state
        .feed
        .profile_page(&username, query.page.as_deref(), auth.viewer_id())
        .await
    {
        Ok(feed) => {
            let show_follow_toggle = auth
                .viewer_id()
                .is_some_and(|viewer_id| viewer_id != feed.author.id);
            render_template_response(
                ProfileTemplate {
                    viewer: auth.viewer(),
                    author_username: feed.author.username.clone(),
                    post_count: feed.post_count,
                    viewer_follows: feed.viewer_follows,
                    show_follow_toggle,
                    posts: post_cards(&feed.posts),
                    pagination: PaginationView::from_window(
                        format!("/profile/{}/", feed.author.username),
                        &feed.posts.window,
                    ),
                },
                StatusCode::OK,
            )
        }
        Err(err) => feed_error_to_response(err, auth.viewer()),
    }
}

async fn post_detail(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> Response {
    let Some(id) = parse_post_id(&raw_id) else {
        return render_not_found_response(auth.viewer());
    };

    render_post_detail_page(&state, &auth, id, String::new(), Vec::new()).await
}

/// Shared by the GET handler and the comment-form re-render after a
/// failed submission.
pub(super) async fn render_post_detail_page(
    state: &HttpState,
    auth: &AuthContext,
    id: Uuid,
    comment_text: String,
    comment_errors: Vec<FormErrorView>,
) -> Response {
    match state.feed.post_detail(id).await {
        Ok(Some(detail)) => {
            let can_edit = auth
                .viewer_id()
                .is_some_and(|viewer_id| viewer_id == detail.post.author_id);
            render_template_response(
                PostDetailTemplate {
                    viewer: auth.viewer(),
                    post: PostCardView::from_record(&detail.post),
                    author_post_count: detail.author_post_count,
                    can_edit,
                    comments: detail.comments.iter().map(Into::into).collect(),
                    comment_text,
                    comment_errors,
                },
                StatusCode::OK,
            )
        }
        Ok(None) => render_not_found_response(auth.viewer()),
        Err(err) => feed_error_to_response(err, auth.viewer()),
    }
}

/// An unparseable id is indistinguishable from an unknown post: 404.
pub(super) fn parse_post_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw).ok()
}

async fn flush_cache(State(state): State<HttpState>) -> Response {
    if let Some(cache) = state.cache.as_ref() {
        cache.store.flush();
        info!(target = "piazza::http::cache", "response cache flushed");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn db_health(State(state): State<HttpState>) -> Response {
    match state.db.as_ref() {
        Some(db) => db_health_response(db.health_check().await),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
