//! Page repository.

use async_trait::async_trait;
use domain::models::{Page, PageGrant, PageRange, User};
use domain::services::{DirectoryError, PageDirectory};
use sqlx::PgPool;
use uuid::Uuid;

use super::db_error;
use crate::entities::PageEntity;
use crate::metrics::QueryTimer;

/// Pages created by `$1`, visible to viewer `$2`, sliced by `$3`/`$4`.
const LIST_BY_CREATOR_SQL: &str = r#"
    SELECT
        p.id, p.path, p.creator_id, p.grant_type, p.created_at, p.updated_at,
        lu.id AS lu_id,
        lu.name AS lu_name,
        lu.username AS lu_username,
        lu.email AS lu_email,
        lu.status AS lu_status,
        lu.admin AS lu_admin,
        lu.image_url AS lu_image_url,
        lu.created_at AS lu_created_at,
        lu.last_login_at AS lu_last_login_at
    FROM pages p
    LEFT JOIN users lu ON lu.id = p.last_update_user_id
    WHERE p.creator_id = $1
      AND p.path <> '/trash'
      AND p.path NOT LIKE '/trash/%'
      AND (p.grant_type = $5 OR (p.grant_type = $6 AND p.creator_id = $2))
    ORDER BY p.updated_at DESC
    LIMIT $3 OFFSET $4
"#;

/// PostgreSQL-backed [`PageDirectory`].
#[derive(Clone)]
pub struct PageRepository {
    pool: PgPool,
}

impl PageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PageDirectory for PageRepository {
    async fn find_list_by_creator(
        &self,
        creator: &User,
        viewer: Option<Uuid>,
        range: PageRange,
    ) -> Result<Vec<Page>, DirectoryError> {
        let timer = QueryTimer::new("find_pages_by_creator");
        let rows = sqlx::query_as::<_, PageEntity>(LIST_BY_CREATOR_SQL)
            .bind(creator.id)
            .bind(viewer)
            .bind(i64::from(range.limit))
            .bind(i64::try_from(range.offset).unwrap_or(i64::MAX))
            .bind(PageGrant::Public.code())
            .bind(PageGrant::Owner.code())
            .fetch_all(&self.pool)
            .await;
        timer.record();

        rows.map_err(db_error)?
            .into_iter()
            .map(Page::try_from)
            .collect()
    }
}
