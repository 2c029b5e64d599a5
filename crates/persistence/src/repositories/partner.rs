//! Partner repository backed by PostgreSQL.

use async_trait::async_trait;
use domain::errors::StoreError;
use domain::models::{NewPartner, Partner, PartnerChanges};
use domain::ports::PartnerStore;
use sqlx::PgPool;
use uuid::Uuid;

use super::map_sqlx_error;
use crate::entities::PartnerEntity;
use crate::metrics::{QueryTimer, Table};

const PARTNER_COLUMNS: &str = r#"
    id, organization_name, contact_name, email, phone, country, website,
    partnership_type, message, status, created_at, updated_at
"#;

/// Repository for partner application database operations.
#[derive(Clone)]
pub struct PgPartnerRepository {
    pool: PgPool,
}

impl PgPartnerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PartnerStore for PgPartnerRepository {
    async fn insert(&self, new: NewPartner) -> Result<Partner, StoreError> {
        let timer = QueryTimer::start(Table::Partners, "insert");
        let sql = format!(
            r#"
            INSERT INTO partners (
                organization_name, contact_name, email, phone, country, website,
                partnership_type, message, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PARTNER_COLUMNS
        );
        let result = sqlx::query_as::<_, PartnerEntity>(&sql)
            .bind(&new.organization_name)
            .bind(&new.contact_name)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(&new.country)
            .bind(&new.website)
            .bind(&new.partnership_type)
            .bind(&new.message)
            .bind(new.status.as_str())
            .fetch_one(&self.pool)
            .await;
        timer.observe(result).map(Into::into).map_err(map_sqlx_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Partner>, StoreError> {
        let timer = QueryTimer::start(Table::Partners, "find_by_id");
        let sql = format!("SELECT {} FROM partners WHERE id = $1", PARTNER_COLUMNS);
        let result = sqlx::query_as::<_, PartnerEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.observe(result).map(|row| row.map(Into::into)).map_err(map_sqlx_error)
    }

    async fn list_all(&self) -> Result<Vec<Partner>, StoreError> {
        let timer = QueryTimer::start(Table::Partners, "list_all");
        let sql = format!(
            "SELECT {} FROM partners ORDER BY created_at DESC, id DESC",
            PARTNER_COLUMNS
        );
        let result = sqlx::query_as::<_, PartnerEntity>(&sql)
            .fetch_all(&self.pool)
            .await;
        timer.observe(result)
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(map_sqlx_error)
    }

    async fn update(&self, id: Uuid, changes: PartnerChanges) -> Result<Partner, StoreError> {
        let timer = QueryTimer::start(Table::Partners, "update");
        let sql = format!(
            r#"
            UPDATE partners
            SET organization_name = COALESCE($2, organization_name),
                contact_name = COALESCE($3, contact_name),
                phone = COALESCE($4, phone),
                country = COALESCE($5, country),
                website = COALESCE($6, website),
                partnership_type = COALESCE($7, partnership_type),
                message = COALESCE($8, message),
                status = COALESCE($9, status),
                updated_at = GREATEST(NOW(), created_at)
            WHERE id = $1
            RETURNING {}
            "#,
            PARTNER_COLUMNS
        );
        let result = sqlx::query_as::<_, PartnerEntity>(&sql)
            .bind(id)
            .bind(&changes.organization_name)
            .bind(&changes.contact_name)
            .bind(&changes.phone)
            .bind(&changes.country)
            .bind(&changes.website)
            .bind(&changes.partnership_type)
            .bind(&changes.message)
            .bind(changes.status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await;
        match timer.observe(result).map_err(map_sqlx_error)? {
            Some(row) => Ok(row.into()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let timer = QueryTimer::start(Table::Partners, "delete");
        let result = sqlx::query("DELETE FROM partners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        Ok(timer.observe(result).map_err(map_sqlx_error)?.rows_affected() > 0)
    }
}
