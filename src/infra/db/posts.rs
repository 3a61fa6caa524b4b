use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, FeedSlice, PostFeedScope, PostsRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

use super::PostgresRepositories;
use super::types::PostRow;
use super::util::map_sqlx_error;

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        scope: PostFeedScope,
        slice: FeedSlice,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let limit = i64::from(slice.limit.clamp(1, 100));
        let offset = i64::try_from(slice.offset)
            .map_err(|_| RepoError::from_persistence("offset exceeds supported range"))?;

        let mut qb = Self::post_select_builder();
        Self::apply_feed_scope(&mut qb, scope);

        // Tie-break on id so pages stay stable for equal timestamps.
        qb.push(" ORDER BY p.created_at DESC, p.id DESC ");
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_posts(&self, scope: PostFeedScope) -> Result<u64, RepoError> {
        let mut qb = Self::post_count_builder();
        Self::apply_feed_scope(&mut qb, scope);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Self::convert_count(count)
    }

    async fn get_post_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = Self::post_select_builder();
        qb.push(" AND p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            author_id,
            text,
            group_id,
            image_path,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        sqlx::query(
            "INSERT INTO posts (id, text, author_id, group_id, image_path, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(&text)
        .bind(author_id)
        .bind(group_id)
        .bind(&image_path)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        self.get_post_by_id(id).await?.ok_or(RepoError::NotFound)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            text,
            group_id,
            image_path,
        } = params;

        let result = sqlx::query(
            "UPDATE posts SET text = $2, group_id = $3, image_path = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(&text)
        .bind(group_id)
        .bind(&image_path)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        self.get_post_by_id(id).await?.ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
