//! Registration repository backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::errors::StoreError;
use domain::models::{
    CountryCount, NewRegistration, Registration, RegistrationChanges, RegistrationStatus,
    UNKNOWN_COUNTRY,
};
use domain::ports::RegistrationStore;
use sqlx::PgPool;
use uuid::Uuid;

use super::map_sqlx_error;
use crate::entities::{CountryCountEntity, RegistrationEntity};
use crate::metrics::{QueryTimer, Table};

const REGISTRATION_COLUMNS: &str = r#"
    id, name, email, whatsapp_contact, country_of_origin, country_of_residence,
    group_type, location, ip_address, user_agent, status, created_at, updated_at
"#;

/// Repository for registration database operations.
#[derive(Clone)]
pub struct PgRegistrationRepository {
    pool: PgPool,
}

impl PgRegistrationRepository {
    /// Creates a new registration repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationStore for PgRegistrationRepository {
    async fn insert(&self, new: NewRegistration) -> Result<Registration, StoreError> {
        let timer = QueryTimer::start(Table::Registrations, "insert");
        let sql = format!(
            r#"
            INSERT INTO registrations (
                name, email, whatsapp_contact, country_of_origin, country_of_residence,
                group_type, location, ip_address, user_agent, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.whatsapp_contact)
            .bind(&new.country_of_origin)
            .bind(&new.country_of_residence)
            .bind(new.group_type.as_str())
            .bind(&new.location)
            .bind(&new.ip_address)
            .bind(&new.user_agent)
            .bind(new.status.as_str())
            .fetch_one(&self.pool)
            .await;
        timer.observe(result).map(Into::into).map_err(map_sqlx_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>, StoreError> {
        let timer = QueryTimer::start(Table::Registrations, "find_by_id");
        let sql = format!(
            "SELECT {} FROM registrations WHERE id = $1",
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.observe(result).map(|row| row.map(Into::into)).map_err(map_sqlx_error)
    }

    async fn list_all(&self) -> Result<Vec<Registration>, StoreError> {
        let timer = QueryTimer::start(Table::Registrations, "list_all");
        let sql = format!(
            "SELECT {} FROM registrations ORDER BY created_at DESC, id DESC",
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .fetch_all(&self.pool)
            .await;
        timer.observe(result)
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(map_sqlx_error)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Registration>, StoreError> {
        let timer = QueryTimer::start(Table::Registrations, "list_recent");
        let sql = format!(
            "SELECT {} FROM registrations ORDER BY created_at DESC, id DESC LIMIT $1",
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await;
        timer.observe(result)
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(map_sqlx_error)
    }

    async fn count_all(&self) -> Result<i64, StoreError> {
        let timer = QueryTimer::start(Table::Registrations, "count_all");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM registrations")
            .fetch_one(&self.pool)
            .await;
        timer.observe(result).map_err(map_sqlx_error)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64, StoreError> {
        let timer = QueryTimer::start(Table::Registrations, "count_since");
        let result = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM registrations WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await;
        timer.observe(result).map_err(map_sqlx_error)
    }

    async fn top_countries(&self, limit: usize) -> Result<Vec<CountryCount>, StoreError> {
        let timer = QueryTimer::start(Table::Registrations, "top_countries");
        // Ties go to the country seen most recently, matching a newest-first scan.
        let result = sqlx::query_as::<_, CountryCountEntity>(
            r#"
            SELECT COALESCE(NULLIF(TRIM(country_of_residence), ''), $1) AS country,
                   COUNT(*) AS count
            FROM registrations
            GROUP BY 1
            ORDER BY count DESC, MAX(created_at) DESC
            LIMIT $2
            "#,
        )
        .bind(UNKNOWN_COUNTRY)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await;
        timer.observe(result)
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(map_sqlx_error)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: RegistrationChanges,
    ) -> Result<Registration, StoreError> {
        let timer = QueryTimer::start(Table::Registrations, "update");
        let sql = format!(
            r#"
            UPDATE registrations
            SET name = COALESCE($2, name),
                whatsapp_contact = COALESCE($3, whatsapp_contact),
                country_of_origin = COALESCE($4, country_of_origin),
                country_of_residence = COALESCE($5, country_of_residence),
                location = COALESCE($6, location),
                status = COALESCE($7, status),
                updated_at = GREATEST(NOW(), created_at)
            WHERE id = $1
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(id)
            .bind(&changes.name)
            .bind(&changes.whatsapp_contact)
            .bind(&changes.country_of_origin)
            .bind(&changes.country_of_residence)
            .bind(&changes.location)
            .bind(changes.status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await;
        match timer.observe(result).map_err(map_sqlx_error)? {
            Some(row) => Ok(row.into()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
    ) -> Result<Registration, StoreError> {
        let timer = QueryTimer::start(Table::Registrations, "update_status");
        let sql = format!(
            r#"
            UPDATE registrations
            SET status = $2, updated_at = GREATEST(NOW(), created_at)
            WHERE id = $1
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await;
        match timer.observe(result).map_err(map_sqlx_error)? {
            Some(row) => Ok(row.into()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let timer = QueryTimer::start(Table::Registrations, "delete");
        let result = sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        Ok(timer.observe(result).map_err(map_sqlx_error)?.rows_affected() > 0)
    }
}
