use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::domain::{AccountPatch, UNBOUND_HWID, UserRecord, is_unbound};
use crate::entities::{prelude::*, users};

/// Matches rows whose device slot is free ("0", empty, or whitespace).
const UNBOUND_CONDITION: &str = "TRIM(\"hwid\") IN ('0', '')";

impl From<users::Model> for UserRecord {
    fn from(model: users::Model) -> Self {
        Self {
            username: model.username,
            password: model.password,
            hwid: model.hwid,
            admin: model.admin,
        }
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(UserRecord::from))
    }

    pub async fn create(&self, record: &UserRecord) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            username: Set(record.username.clone()),
            password: Set(record.password.clone()),
            hwid: Set(record.hwid.clone()),
            admin: Set(record.admin),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .with_context(|| format!("Failed to create user {}", record.username))?;

        Ok(())
    }

    /// Overwrites password, hwid and admin flag of an existing row.
    pub async fn update(&self, record: &UserRecord) -> Result<()> {
        let user = Users::find()
            .filter(users::Column::Username.eq(record.username.as_str()))
            .one(&self.conn)
            .await
            .context("Failed to query user for update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {}", record.username))?;

        let mut active: users::ActiveModel = user.into();
        active.password = Set(record.password.clone());
        active.hwid = Set(record.hwid.clone());
        active.admin = Set(record.admin);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Single UPDATE of password and admin; `hwid` is only in the SET list
    /// when the patch carries one.
    pub async fn update_account(&self, username: &str, patch: &AccountPatch) -> Result<bool> {
        let mut update = Users::update_many()
            .col_expr(users::Column::Password, Expr::value(patch.password.clone()))
            .col_expr(users::Column::Admin, Expr::value(patch.admin))
            .col_expr(
                users::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            );

        if let Some(hwid) = &patch.hwid {
            update = update.col_expr(users::Column::Hwid, Expr::value(hwid.clone()));
        }

        let result = update
            .filter(users::Column::Username.eq(username))
            .exec(&self.conn)
            .await
            .with_context(|| format!("Failed to update user {username}"))?;

        Ok(result.rows_affected == 1)
    }

    pub async fn unbind_hwid(&self, username: &str) -> Result<bool> {
        let result = Users::update_many()
            .col_expr(users::Column::Hwid, Expr::value(UNBOUND_HWID))
            .col_expr(
                users::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(users::Column::Username.eq(username))
            .exec(&self.conn)
            .await
            .with_context(|| format!("Failed to reset hwid for {username}"))?;

        Ok(result.rows_affected == 1)
    }

    /// Single conditional UPDATE; returns whether this call claimed the slot.
    pub async fn bind_hwid(&self, username: &str, hwid: &str) -> Result<bool> {
        anyhow::ensure!(!is_unbound(hwid), "Refusing to bind an unbound hwid value");

        let result = Users::update_many()
            .col_expr(users::Column::Hwid, Expr::value(hwid))
            .col_expr(
                users::Column::UpdatedAt,
                Expr::value(chrono::Utc::now().to_rfc3339()),
            )
            .filter(users::Column::Username.eq(username))
            .filter(Expr::cust(UNBOUND_CONDITION))
            .exec(&self.conn)
            .await
            .context("Failed to bind hwid")?;

        Ok(result.rows_affected == 1)
    }

    pub async fn delete_by_username(&self, username: &str) -> Result<bool> {
        let result = Users::delete_many()
            .filter(users::Column::Username.eq(username))
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn list_all(&self) -> Result<Vec<UserRecord>> {
        let rows = Users::find()
            .order_by_asc(users::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Users::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")
    }
}
