//! Write handlers: create, edit, delete, comment.
//!
//! Authorization denials never render an error: a non-author editing or
//! deleting someone else's post is redirected to the post detail page as
//! if nothing happened.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::error::repo_error_to_http;
use crate::application::posts::{
    AddCommentOutcome, CreatePostOutcome, DeletePostOutcome, EditPostOutcome, PostWriteError,
};
use crate::domain::posts::{CommentInput, PostInput};
use crate::presentation::views::{
    FormErrorView, GroupOptionView, PostFormTemplate, ViewerView, render_not_found_response,
    render_template_response,
};

use super::auth::{AuthContext, require_user};
use super::public::{HttpState, parse_post_id, render_post_detail_page};

const SOURCE: &str = "infra::http::posts";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PostForm {
    text: String,
    group: String,
    image: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct CommentForm {
    text: String,
}

pub(super) async fn create_form(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
) -> Response {
    if let Err(redirect) = require_user(&auth) {
        return redirect;
    }

    render_post_form(
        &state,
        auth.viewer(),
        "New post",
        "/create/".to_string(),
        String::new(),
        None,
        String::new(),
        Vec::new(),
    )
    .await
}

pub(super) async fn create_submit(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<PostForm>,
) -> Response {
    let user = match require_user(&auth) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };

    let group_id = match parse_group_field(&form.group) {
        Ok(group_id) => group_id,
        Err(error) => {
            return render_post_form(
                &state,
                auth.viewer(),
                "New post",
                "/create/".to_string(),
                form.text,
                None,
                form.image,
                vec![error],
            )
            .await;
        }
    };

    let input = PostInput {
        text: form.text.clone(),
        group_id,
        image_path: non_empty(&form.image),
    };

    match state.posts.create_post(user.id, input).await {
        Ok(CreatePostOutcome::Created(_)) => {
            Redirect::to(&format!("/profile/{}/", user.username)).into_response()
        }
        Ok(CreatePostOutcome::Invalid(errors)) => {
            render_post_form(
                &state,
                auth.viewer(),
                "New post",
                "/create/".to_string(),
                form.text,
                group_id,
                form.image,
                FormErrorView::from_field_errors(&errors),
            )
            .await
        }
        Err(PostWriteError::UnknownGroup) => {
            render_post_form(
                &state,
                auth.viewer(),
                "New post",
                "/create/".to_string(),
                form.text,
                None,
                form.image,
                vec![FormErrorView::custom("group", "Choose a valid group")],
            )
            .await
        }
        Err(PostWriteError::Repo(err)) => repo_error_to_http(SOURCE, err).into_response(),
    }
}

pub(super) async fn edit_form(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> Response {
    let user = match require_user(&auth) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let Some(id) = parse_post_id(&raw_id) else {
        return render_not_found_response(auth.viewer());
    };

    let post = match state.posts.load_post(id).await {
        Ok(Some(post)) => post,
        Ok(None) => return render_not_found_response(auth.viewer()),
        Err(err) => return repo_error_to_http(SOURCE, err).into_response(),
    };

    if post.author_id != user.id {
        return Redirect::to(&format!("/posts/{id}/")).into_response();
    }

    render_post_form(
        &state,
        auth.viewer(),
        "Edit post",
        format!("/posts/{id}/edit/"),
        post.text,
        post.group_id,
        post.image_path.unwrap_or_default(),
        Vec::new(),
    )
    .await
}

pub(super) async fn edit_submit(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    Form(form): Form<PostForm>,
) -> Response {
    let user = match require_user(&auth) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let Some(id) = parse_post_id(&raw_id) else {
        return render_not_found_response(auth.viewer());
    };
    let action = format!("/posts/{id}/edit/");

    let group_id = match parse_group_field(&form.group) {
        Ok(group_id) => group_id,
        Err(error) => {
            return render_post_form(
                &state,
                auth.viewer(),
                "Edit post",
                action,
                form.text,
                None,
                form.image,
                vec![error],
            )
            .await;
        }
    };

    let input = PostInput {
        text: form.text.clone(),
        group_id,
        image_path: non_empty(&form.image),
    };

    match state.posts.edit_post(user.id, id, input).await {
        Ok(EditPostOutcome::Updated(_)) | Ok(EditPostOutcome::NotAuthor) => {
            Redirect::to(&format!("/posts/{id}/")).into_response()
        }
        Ok(EditPostOutcome::Invalid(errors)) => {
            render_post_form(
                &state,
                auth.viewer(),
                "Edit post",
                action,
                form.text,
                group_id,
                form.image,
                FormErrorView::from_field_errors(&errors),
            )
            .await
        }
        Ok(EditPostOutcome::NotFound) => render_not_found_response(auth.viewer()),
        Err(PostWriteError::UnknownGroup) => {
            render_post_form(
                &state,
                auth.viewer(),
                "Edit post",
                action,
                form.text,
                None,
                form.image,
                vec![FormErrorView::custom("group", "Choose a valid group")],
            )
            .await
        }
        Err(PostWriteError::Repo(err)) => repo_error_to_http(SOURCE, err).into_response(),
    }
}

pub(super) async fn delete_submit(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
) -> Response {
    let user = match require_user(&auth) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let Some(id) = parse_post_id(&raw_id) else {
        return render_not_found_response(auth.viewer());
    };

    match state.posts.delete_post(user.id, id).await {
        Ok(DeletePostOutcome::Deleted) => {
            Redirect::to(&format!("/profile/{}/", user.username)).into_response()
        }
        Ok(DeletePostOutcome::NotAuthor) => {
            Redirect::to(&format!("/posts/{id}/")).into_response()
        }
        Ok(DeletePostOutcome::NotFound) => render_not_found_response(auth.viewer()),
        Err(PostWriteError::UnknownGroup) => render_not_found_response(auth.viewer()),
        Err(PostWriteError::Repo(err)) => repo_error_to_http(SOURCE, err).into_response(),
    }
}

pub(super) async fn comment_submit(
    State(state): State<HttpState>,
    Extension(auth): Extension<AuthContext>,
    Path(raw_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Response {
    let user = match require_user(&auth) {
        Ok(user) => user,
        Err(redirect) => return redirect,
    };
    let Some(id) = parse_post_id(&raw_id) else {
        return render_not_found_response(auth.viewer());
    };

    let input = CommentInput {
        text: form.text.clone(),
    };

    match state.posts.add_comment(user.id, id, input).await {
        Ok(AddCommentOutcome::Added(_)) => {
            Redirect::to(&format!("/posts/{id}/")).into_response()
        }
        Ok(AddCommentOutcome::Invalid(errors)) => {
            render_post_detail_page(
                &state,
                &auth,
                id,
                form.text,
                FormErrorView::from_field_errors(&errors),
            )
            .await
        }
        Ok(AddCommentOutcome::PostNotFound) => render_not_found_response(auth.viewer()),
        Err(PostWriteError::UnknownGroup) => render_not_found_response(auth.viewer()),
        Err(PostWriteError::Repo(err)) => repo_error_to_http(SOURCE, err).into_response(),
    }
}

#[allow(clippy::too_many_arguments)]
async fn render_post_form(
    state: &HttpState,
    viewer: Option<ViewerView>,
    heading: &str,
    action: String,
    text: String,
    selected_group: Option<Uuid>,
    image_path: String,
    errors: Vec<FormErrorView>,
) -> Response {
    let groups = match state.groups.list_groups().await {
        Ok(groups) => groups,
        Err(err) => return repo_error_to_http(SOURCE, err).into_response(),
    };

    render_template_response(
        PostFormTemplate {
            viewer,
            heading: heading.to_string(),
            action,
            text,
            image_path,
            groups: GroupOptionView::from_records(&groups, selected_group),
            errors,
        },
        StatusCode::OK,
    )
}

fn parse_group_field(raw: &str) -> Result<Option<Uuid>, FormErrorView> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(trimmed)
        .map(Some)
        .map_err(|_| FormErrorView::custom("group", "Choose a valid group"))
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
