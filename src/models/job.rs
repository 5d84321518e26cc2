use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub salary: Decimal,
    pub employer_id: Uuid,
    pub logo_url: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    /// Set when a cascading delete has started; a job carrying this mark is
    /// mid-cascade and the delete can be re-run to finish the purge.
    pub deleting_at: Option<DateTime<Utc>>,
}
