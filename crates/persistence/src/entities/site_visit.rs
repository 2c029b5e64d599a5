//! Site visit aggregate rows.

use sqlx::FromRow;

/// Visit totals for the stats endpoint.
#[derive(Debug, Clone, FromRow)]
pub struct VisitTotalsEntity {
    pub total_visits: i64,
    pub today_visits: i64,
}

/// `{page, count}` aggregate row.
#[derive(Debug, Clone, FromRow)]
pub struct PageCountEntity {
    pub page: String,
    pub count: i64,
}

impl From<PageCountEntity> for domain::models::PageCount {
    fn from(entity: PageCountEntity) -> Self {
        Self {
            page: entity.page,
            count: entity.count,
        }
    }
}
