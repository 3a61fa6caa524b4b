//! Post and comment form inputs with their validation rules.

use time::format_description::FormatItem;
use time::macros::format_description;
use uuid::Uuid;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

/// Field-level validation failure, rendered inline next to the form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Submitted post form, before validation.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image_path: Option<String>,
}

impl PostInput {
    /// Validate the submission. Text is required and must not be blank
    /// after trimming; the trimmed text is what gets persisted.
    pub fn validate(&self) -> Result<ValidPostInput, Vec<FieldError>> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(vec![FieldError {
                field: "text",
                message: "Post text is required",
            }]);
        }

        Ok(ValidPostInput {
            text: text.to_string(),
            group_id: self.group_id,
            image_path: normalize_optional(self.image_path.as_deref()),
        })
    }
}

/// A post submission that passed validation.
#[derive(Debug, Clone)]
pub struct ValidPostInput {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image_path: Option<String>,
}

/// Submitted comment form, before validation.
#[derive(Debug, Clone, Default)]
pub struct CommentInput {
    pub text: String,
}

impl CommentInput {
    pub fn validate(&self) -> Result<ValidCommentInput, Vec<FieldError>> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(vec![FieldError {
                field: "text",
                message: "Comment text is required",
            }]);
        }

        Ok(ValidCommentInput {
            text: text.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ValidCommentInput {
    pub text: String,
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_text_is_trimmed_before_persisting() {
        let input = PostInput {
            text: "  hello piazza  ".to_string(),
            ..Default::default()
        };
        let valid = input.validate().expect("valid input");
        assert_eq!(valid.text, "hello piazza");
    }

    #[test]
    fn blank_post_text_is_rejected() {
        let input = PostInput {
            text: "   \n\t".to_string(),
            ..Default::default()
        };
        let errors = input.validate().expect_err("blank text rejected");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "text");
    }

    #[test]
    fn empty_image_path_normalizes_to_none() {
        let input = PostInput {
            text: "post with no image".to_string(),
            image_path: Some("   ".to_string()),
            ..Default::default()
        };
        let valid = input.validate().expect("valid input");
        assert!(valid.image_path.is_none());
    }

    #[test]
    fn blank_comment_text_is_rejected() {
        let input = CommentInput {
            text: String::new(),
        };
        assert!(input.validate().is_err());
    }
}
