//! Registration statistics models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::registration::{GroupType, Registration, RegistrationStatus};
use super::visit::VisitStats;

/// Sentinel used when a record has no country of residence.
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Number of countries kept in the ranking.
pub const TOP_COUNTRIES_LIMIT: usize = 5;

/// Number of records in the recent-activity feed.
pub const RECENT_ACTIVITY_LIMIT: i64 = 10;

/// A `{country, count}` pair in the country ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCount {
    pub country: String,
    pub count: i64,
}

/// Public-facing entry of the recent-activity feed. Contact details are
/// intentionally not part of this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub id: Uuid,
    pub name: String,
    pub country_of_origin: String,
    pub country_of_residence: String,
    pub group_type: GroupType,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Registration> for RecentActivity {
    fn from(r: Registration) -> Self {
        Self {
            id: r.id,
            name: r.name,
            country_of_origin: r.country_of_origin,
            country_of_residence: r.country_of_residence,
            group_type: r.group_type,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

/// Statistics recomputed on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_registrations: i64,
    pub today_registrations: i64,
    pub this_week_registrations: i64,
    pub this_month_registrations: i64,
    pub top_countries: Vec<CountryCount>,
    pub recent_activity: Vec<RecentActivity>,
    /// Present only when the visit source answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_stats: Option<VisitStats>,
}

/// Ranks countries by frequency.
///
/// Missing or blank values count as [`UNKNOWN_COUNTRY`]. Ties keep the order
/// in which a country was first encountered, so callers should feed records
/// newest-first. The result holds at most `limit` entries.
pub fn rank_countries<'a, I>(countries: I, limit: usize) -> Vec<CountryCount>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut order: HashMap<String, usize> = HashMap::new();
    let mut ranked: Vec<CountryCount> = Vec::new();

    for country in countries {
        let key = match country.map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => UNKNOWN_COUNTRY.to_string(),
        };
        match order.get(&key) {
            Some(&idx) => ranked[idx].count += 1,
            None => {
                order.insert(key.clone(), ranked.len());
                ranked.push(CountryCount {
                    country: key,
                    count: 1,
                });
            }
        }
    }

    // Stable sort keeps first-encountered order for equal counts.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}
