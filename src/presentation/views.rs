//! View models and askama template bindings.

use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::application::error::{ErrorReport, HttpError};
use crate::application::pagination::{PageWindow, Paginated};
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};
use crate::domain::posts::{FieldError, HUMAN_DATE_FORMAT};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(viewer: Option<ViewerView>) -> Response {
    let mut response =
        render_template_response(NotFoundTemplate { viewer }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

pub fn render_forbidden_response(detail: &str) -> Response {
    let mut response =
        render_template_response(ForbiddenTemplate { viewer: None }, StatusCode::FORBIDDEN);
    ErrorReport::from_message(
        "presentation::views::render_forbidden_response",
        StatusCode::FORBIDDEN,
        detail.to_string(),
    )
    .attach(&mut response);
    response
}

/// Body for 5xx responses. Rendered directly rather than through
/// [`render_template_response`]: that helper reports render failures as a
/// 500, which would recurse back here.
pub fn render_server_error_page(status: StatusCode) -> Response {
    match (ServerErrorTemplate { viewer: None }).render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (status, "Something went wrong").into_response(),
    }
}

/// The authenticated user as the navigation bar sees them.
#[derive(Debug, Clone)]
pub struct ViewerView {
    pub id: Uuid,
    pub username: String,
}

impl From<&UserRecord> for ViewerView {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupLinkView {
    pub title: String,
    pub slug: String,
}

/// One post as rendered in feeds and on the detail page.
#[derive(Debug, Clone)]
pub struct PostCardView {
    pub id: Uuid,
    pub text: String,
    pub author_username: String,
    pub group: Option<GroupLinkView>,
    pub image_path: Option<String>,
    pub published: String,
}

impl PostCardView {
    pub fn from_record(record: &PostRecord) -> Self {
        let group = match (&record.group_title, &record.group_slug) {
            (Some(title), Some(slug)) => Some(GroupLinkView {
                title: title.clone(),
                slug: slug.clone(),
            }),
            _ => None,
        };

        Self {
            id: record.id,
            text: record.text.clone(),
            author_username: record.author_username.clone(),
            group,
            image_path: record.image_path.clone(),
            published: human_date(record),
        }
    }
}

fn human_date(record: &PostRecord) -> String {
    record
        .created_at
        .format(HUMAN_DATE_FORMAT)
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct CommentView {
    pub author_username: String,
    pub text: String,
    pub published: String,
}

impl From<&CommentRecord> for CommentView {
    fn from(record: &CommentRecord) -> Self {
        Self {
            author_username: record.author_username.clone(),
            text: record.text.clone(),
            published: record
                .created_at
                .format(HUMAN_DATE_FORMAT)
                .unwrap_or_default(),
        }
    }
}

/// Page navigation links derived from the resolved window. `base_path`
/// already ends in a slash; the page number rides in the query string.
#[derive(Debug, Clone)]
pub struct PaginationView {
    pub number: u64,
    pub total_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page: u64,
    pub next_page: u64,
    pub base_path: String,
}

impl PaginationView {
    pub fn from_window(base_path: impl Into<String>, window: &PageWindow) -> Self {
        Self {
            number: window.number,
            total_pages: window.total_pages,
            has_previous: window.has_previous(),
            has_next: window.has_next(),
            previous_page: window.number.saturating_sub(1).max(1),
            next_page: (window.number + 1).min(window.total_pages),
            base_path: base_path.into(),
        }
    }
}

pub fn post_cards(page: &Paginated<PostRecord>) -> Vec<PostCardView> {
    page.items.iter().map(PostCardView::from_record).collect()
}

#[derive(Debug, Clone)]
pub struct GroupOptionView {
    pub id: Uuid,
    pub title: String,
    pub selected: bool,
}

impl GroupOptionView {
    pub fn from_records(groups: &[GroupRecord], selected: Option<Uuid>) -> Vec<Self> {
        groups
            .iter()
            .map(|group| Self {
                id: group.id,
                title: group.title.clone(),
                selected: selected == Some(group.id),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct FormErrorView {
    pub field: String,
    pub message: String,
}

impl FormErrorView {
    pub fn from_field_errors(errors: &[FieldError]) -> Vec<Self> {
        errors
            .iter()
            .map(|err| Self {
                field: err.field.to_string(),
                message: err.message.to_string(),
            })
            .collect()
    }

    pub fn custom(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub viewer: Option<ViewerView>,
    pub posts: Vec<PostCardView>,
    pub pagination: PaginationView,
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate {
    pub viewer: Option<ViewerView>,
    pub title: String,
    pub description: String,
    pub posts: Vec<PostCardView>,
    pub pagination: PaginationView,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub viewer: Option<ViewerView>,
    pub author_username: String,
    pub post_count: u64,
    pub viewer_follows: bool,
    pub show_follow_toggle: bool,
    pub posts: Vec<PostCardView>,
    pub pagination: PaginationView,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub viewer: Option<ViewerView>,
    pub post: PostCardView,
    pub author_post_count: u64,
    pub can_edit: bool,
    pub comments: Vec<CommentView>,
    pub comment_text: String,
    pub comment_errors: Vec<FormErrorView>,
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub viewer: Option<ViewerView>,
    pub heading: String,
    pub action: String,
    pub text: String,
    pub image_path: String,
    pub groups: Vec<GroupOptionView>,
    pub errors: Vec<FormErrorView>,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub viewer: Option<ViewerView>,
    pub posts: Vec<PostCardView>,
    pub pagination: PaginationView,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub viewer: Option<ViewerView>,
}

#[derive(Template)]
#[template(path = "forbidden.html")]
pub struct ForbiddenTemplate {
    pub viewer: Option<ViewerView>,
}

#[derive(Template)]
#[template(path = "server_error.html")]
pub struct ServerErrorTemplate {
    pub viewer: Option<ViewerView>,
}
