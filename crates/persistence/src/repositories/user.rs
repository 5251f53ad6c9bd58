//! User repository.

use async_trait::async_trait;
use domain::models::{
    NewInvitedUser, User, UserListFilter, UserListOptions, UserStatus,
};
use domain::services::{DirectoryError, UserDirectory};
use shared::pagination::Paginated;
use sqlx::PgPool;
use uuid::Uuid;

use super::db_error;
use crate::entities::{UserEntity, USER_COLUMNS};
use crate::metrics::QueryTimer;

/// SQL for one page of the user list: `(count, select)`.
///
/// `$1` is the status array, `$2` the search needle when there is one,
/// followed by limit and offset in the select.
fn user_list_sql(filter: &UserListFilter, options: &UserListOptions) -> (String, String) {
    let mut where_clause = String::from("WHERE status = ANY($1)");
    let mut param_idx = 2;

    if filter.search.as_substring().is_some() {
        where_clause.push_str(&format!(
            " AND (strpos(name, ${0}) > 0 OR strpos(COALESCE(username, ''), ${0}) > 0 OR strpos(email, ${0}) > 0)",
            param_idx
        ));
        param_idx += 1;
    }

    let count = format!("SELECT COUNT(*) FROM users {}", where_clause);
    let select = format!(
        "SELECT {} FROM users {} ORDER BY {} {} LIMIT ${} OFFSET ${}",
        USER_COLUMNS,
        where_clause,
        options.sort.as_sql_column(),
        options.sort_order.as_sql(),
        param_idx,
        param_idx + 1
    );

    (count, select)
}

fn to_users(rows: Vec<UserEntity>) -> Result<Vec<User>, DirectoryError> {
    rows.into_iter().map(User::try_from).collect()
}

fn to_user(row: Option<UserEntity>) -> Result<Option<User>, DirectoryError> {
    row.map(User::try_from).transpose()
}

/// PostgreSQL-backed [`UserDirectory`].
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn update_returning(
        &self,
        query_name: &'static str,
        sql: &str,
        id: Uuid,
        bind: UpdateValue<'_>,
    ) -> Result<Option<User>, DirectoryError> {
        let timer = QueryTimer::new(query_name);
        let query = sqlx::query_as::<_, UserEntity>(sql).bind(id);
        let query = match bind {
            UpdateValue::Bool(value) => query.bind(value),
            UpdateValue::SmallInt(value) => query.bind(value),
            UpdateValue::Text(value) => query.bind(value),
        };
        let result = query.fetch_optional(&self.pool).await;
        timer.record();

        to_user(result.map_err(db_error)?)
    }
}

enum UpdateValue<'a> {
    Bool(bool),
    SmallInt(i16),
    Text(&'a str),
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn paginate(
        &self,
        filter: &UserListFilter,
        options: &UserListOptions,
    ) -> Result<Paginated<User>, DirectoryError> {
        let (count_sql, select_sql) = user_list_sql(filter, options);
        let statuses: Vec<i16> = filter.statuses.iter().map(|s| s.code()).collect();
        let needle = filter.search.as_substring();

        let timer = QueryTimer::new("count_users");
        let mut count = sqlx::query_scalar::<_, i64>(&count_sql).bind(&statuses);
        if let Some(needle) = needle {
            count = count.bind(needle);
        }
        let total = count.fetch_one(&self.pool).await;
        timer.record();
        let total = total.map_err(db_error)?;

        let timer = QueryTimer::new("paginate_users");
        let mut select = sqlx::query_as::<_, UserEntity>(&select_sql).bind(&statuses);
        if let Some(needle) = needle {
            select = select.bind(needle);
        }
        let rows = select
            .bind(i64::from(options.limit))
            .bind(i64::try_from(options.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await;
        timer.record();

        let docs = to_users(rows.map_err(db_error)?)?;
        Ok(Paginated::new(
            docs,
            u64::try_from(total).unwrap_or(0),
            options.page,
            options.limit,
        ))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DirectoryError> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        to_user(result.map_err(db_error)?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DirectoryError> {
        let timer = QueryTimer::new("find_user_by_username");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        to_user(result.map_err(db_error)?)
    }

    async fn create_invited_users(
        &self,
        users: &[NewInvitedUser],
    ) -> Result<Vec<User>, DirectoryError> {
        let timer = QueryTimer::new("create_invited_users");
        let sql = format!(
            r#"
            INSERT INTO users (name, email, status, admin, password_hash)
            VALUES ('', $1, $2, FALSE, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let mut created = Vec::with_capacity(users.len());
        for user in users {
            let row = sqlx::query_as::<_, UserEntity>(&sql)
                .bind(&user.email)
                .bind(UserStatus::Invited.code())
                .bind(&user.password_hash)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;

            match row {
                Some(row) => created.push(User::try_from(row)?),
                None => tracing::debug!(email = %user.email, "Skipping invitation for existing account"),
            }
        }
        tx.commit().await.map_err(db_error)?;
        timer.record();

        Ok(created)
    }

    async fn set_admin(&self, id: Uuid, admin: bool) -> Result<Option<User>, DirectoryError> {
        let sql = format!(
            "UPDATE users SET admin = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        self.update_returning("set_user_admin", &sql, id, UpdateValue::Bool(admin))
            .await
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: UserStatus,
    ) -> Result<Option<User>, DirectoryError> {
        let sql = format!(
            "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        self.update_returning("set_user_status", &sql, id, UpdateValue::SmallInt(status.code()))
            .await
    }

    async fn set_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<Option<User>, DirectoryError> {
        let sql = format!(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        self.update_returning("set_user_password", &sql, id, UpdateValue::Text(password_hash))
            .await
    }
}
