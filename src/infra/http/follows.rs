//! Follow handlers: the followed-authors feed and the follow/unfollow
//! toggles.

use axum::{
    Extension,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::application::error::repo_error_to_http;
use crate::application::follows::{FollowError, FollowOutcome, UnfollowOutcome};
use crate::presentation::views::{
    FollowTemplate, PaginationView, post_cards, render_not_found_response,
    render_template_response,
};

use super::auth::{AuthContext, require_user};
use super::feed_error_to_response;
use super::public::{HttpState, PageQuery};

const SOURCE: &str = "infra::http::follows";

pub(super) async fn follow_index(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<PageQuery>,
) -> Response {
    let user = match require_user(&auth) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    match state
        .feed
        .following_page(user.id, query.page.as_deref())
        .await
    {
        Ok(page) => render_template_response(
            FollowTemplate {
                viewer: auth.viewer(),
                posts: post_cards(&page),
                pagination: PaginationView::from_window("/follow/", &page.window),
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response(err, auth.viewer()),
    }
}

pub(super) async fn follow_author(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
    Path(username): Path<String>,
) -> Response {
    let user = match require_user(&auth) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    match state.follows.follow(user.id, &username).await {
        Ok(FollowOutcome::Following(target)) => {
            Redirect::to(&format!("/profile/{}/", target.username)).into_response()
        }
        // Following yourself is silently refused.
        Ok(FollowOutcome::SelfFollow) => Redirect::to("/").into_response(),
        Err(FollowError::UnknownAuthor) => render_not_found_response(auth.viewer()),
        Err(FollowError::Repo(err)) => repo_error_to_http(SOURCE, err).into_response(),
    }
}

pub(super) async fn unfollow_author(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
    Path(username): Path<String>,
) -> Response {
    let user = match require_user(&auth) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    match state.follows.unfollow(user.id, &username).await {
        Ok(UnfollowOutcome::NotFollowing(target)) => {
            Redirect::to(&format!("/profile/{}/", target.username)).into_response()
        }
        Err(FollowError::UnknownAuthor) => render_not_found_response(auth.viewer()),
        Err(FollowError::Repo(err)) => repo_error_to_http(SOURCE, err).into_response(),
    }
}
