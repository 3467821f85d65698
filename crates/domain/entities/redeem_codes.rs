use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infra::db::postgres::schema::redeem_codes;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = redeem_codes)]
pub struct RedeemCodeEntity {
    pub id: Uuid,
    pub code: String,
    pub credit_amount: i32,
    pub is_used: bool,
    pub used_by: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
