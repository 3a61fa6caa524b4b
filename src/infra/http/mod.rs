mod auth;
mod follows;
mod middleware;
mod posts;
mod public;

pub use auth::{AuthContext, SESSION_COOKIE, SessionKeys};
pub use public::{HttpState, build_router};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sqlx::Error as SqlxError;

use crate::application::error::{ErrorReport, repo_error_to_http};
use crate::application::feed::FeedError;
use crate::presentation::views::{ViewerView, render_not_found_response};

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// Unknown groups and authors become rendered 404 pages; persistence
/// failures surface through the shared repository error mapping.
fn feed_error_to_response(err: FeedError, viewer: Option<ViewerView>) -> Response {
    match err {
        FeedError::UnknownGroup => {
            let mut response = render_not_found_response(viewer);
            ErrorReport::from_message(
                "infra::http::feed_error_to_response",
                StatusCode::NOT_FOUND,
                "Unknown group",
            )
            .attach(&mut response);
            response
        }
        FeedError::UnknownAuthor => {
            let mut response = render_not_found_response(viewer);
            ErrorReport::from_message(
                "infra::http::feed_error_to_response",
                StatusCode::NOT_FOUND,
                "Unknown author",
            )
            .attach(&mut response);
            response
        }
        FeedError::Repo(err) => {
            repo_error_to_http("infra::http::feed_error_to_response", err).into_response()
        }
    }
}
