//! PostgreSQL implementation of the store traits.
//!
//! Enums are stored as text codes and parsed back when rows are loaded.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{FromRow, QueryBuilder};
use std::str::FromStr;
use uuid::Uuid;

use super::store::{
    ActivityRepository, AlertRepository, BookingRepository, LeaseRepository,
    NotificationRepository, PropertyRepository, Store, UserRepository,
};
use crate::models::{
    ActivityAction, ActivityFilter, ActivityLog, ActivityStatus, Booking, IdentProvider, Lease,
    Notification, Property, PropertyFilter, SecurityAlert, User,
};
use crate::utils::PageParams;

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(anyhow::anyhow!(e))
}

fn write_error(e: sqlx::Error, conflict: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(anyhow::anyhow!("{}", conflict))
        }
        _ => db_error(e),
    }
}

fn parse_code<T>(code: &str) -> Result<T, AppError>
where
    T: FromStr<Err = String>,
{
    code.parse()
        .map_err(|e: String| AppError::DatabaseError(anyhow::anyhow!("Corrupt row: {}", e)))
}

fn page_bounds(page: &PageParams) -> (i64, i64) {
    (i64::from(page.limit()), i64::from(page.offset()))
}

// ==================== Row types ====================

#[derive(FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    password_hash: Option<String>,
    display_name: String,
    phone: Option<String>,
    role_code: String,
    is_active: bool,
    mfa_secret: Option<String>,
    mfa_enabled: bool,
    google_id: Option<String>,
    github_id: Option<String>,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.user_id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.display_name,
            phone: row.phone,
            role: parse_code(&row.role_code)?,
            is_active: row.is_active,
            mfa_secret: row.mfa_secret,
            mfa_enabled: row.mfa_enabled,
            google_id: row.google_id,
            github_id: row.github_id,
            created_at: row.created_utc,
            updated_at: row.updated_utc,
        })
    }
}

#[derive(FromRow)]
struct ActivityRow {
    log_id: Uuid,
    user_id: Option<Uuid>,
    action_code: String,
    status_code: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    details: Option<String>,
    created_utc: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for ActivityLog {
    type Error = AppError;

    fn try_from(row: ActivityRow) -> Result<Self, Self::Error> {
        Ok(ActivityLog {
            id: row.log_id,
            user_id: row.user_id,
            action: parse_code(&row.action_code)?,
            status: parse_code(&row.status_code)?,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            details: row.details,
            created_at: row.created_utc,
        })
    }
}

#[derive(FromRow)]
struct AlertRow {
    alert_id: Uuid,
    user_id: Option<Uuid>,
    kind_code: String,
    severity_code: String,
    ip_address: Option<String>,
    details: String,
    resolved: bool,
    resolved_by: Option<Uuid>,
    resolved_utc: Option<DateTime<Utc>>,
    created_utc: DateTime<Utc>,
}

impl TryFrom<AlertRow> for SecurityAlert {
    type Error = AppError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(SecurityAlert {
            id: row.alert_id,
            user_id: row.user_id,
            kind: parse_code(&row.kind_code)?,
            severity: parse_code(&row.severity_code)?,
            ip_address: row.ip_address,
            details: row.details,
            resolved: row.resolved,
            resolved_by: row.resolved_by,
            resolved_at: row.resolved_utc,
            created_at: row.created_utc,
        })
    }
}

#[derive(FromRow)]
struct NotificationRow {
    notification_id: Uuid,
    user_id: Uuid,
    kind_code: String,
    title: String,
    message: String,
    is_read: bool,
    created_utc: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.notification_id,
            user_id: row.user_id,
            kind: parse_code(&row.kind_code)?,
            title: row.title,
            message: row.message,
            read: row.is_read,
            created_at: row.created_utc,
        })
    }
}

#[derive(FromRow)]
struct LeaseRow {
    lease_id: Uuid,
    property_id: Option<Uuid>,
    tenant_id: Uuid,
    landlord_id: Uuid,
    monthly_rent_cents: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    tenant_signature: Option<String>,
    landlord_signature: Option<String>,
    tenant_signed_utc: Option<DateTime<Utc>>,
    landlord_signed_utc: Option<DateTime<Utc>>,
    status_code: String,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl TryFrom<LeaseRow> for Lease {
    type Error = AppError;

    fn try_from(row: LeaseRow) -> Result<Self, Self::Error> {
        Ok(Lease {
            id: row.lease_id,
            property_id: row.property_id,
            tenant_id: row.tenant_id,
            landlord_id: row.landlord_id,
            monthly_rent_cents: row.monthly_rent_cents,
            start_date: row.start_date,
            end_date: row.end_date,
            tenant_signature: row.tenant_signature,
            landlord_signature: row.landlord_signature,
            tenant_signed_at: row.tenant_signed_utc,
            landlord_signed_at: row.landlord_signed_utc,
            status: parse_code(&row.status_code)?,
            created_at: row.created_utc,
            updated_at: row.updated_utc,
        })
    }
}

#[derive(FromRow)]
struct PropertyRow {
    property_id: Uuid,
    landlord_id: Uuid,
    title: String,
    description: String,
    address: String,
    city: String,
    monthly_rent_cents: i64,
    bedrooms: i32,
    bathrooms: i32,
    available: bool,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Property {
            id: row.property_id,
            landlord_id: row.landlord_id,
            title: row.title,
            description: row.description,
            address: row.address,
            city: row.city,
            monthly_rent_cents: row.monthly_rent_cents,
            bedrooms: row.bedrooms,
            bathrooms: row.bathrooms,
            available: row.available,
            created_at: row.created_utc,
            updated_at: row.updated_utc,
        }
    }
}

#[derive(FromRow)]
struct BookingRow {
    booking_id: Uuid,
    property_id: Uuid,
    tenant_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status_code: String,
    message: Option<String>,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.booking_id,
            property_id: row.property_id,
            tenant_id: row.tenant_id,
            start_date: row.start_date,
            end_date: row.end_date,
            status: parse_code(&row.status_code)?,
            message: row.message,
            created_at: row.created_utc,
            updated_at: row.updated_utc,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, AppError>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// ==================== User Operations ====================

#[async_trait]
impl UserRepository for Database {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, email, password_hash, display_name, phone, role_code, is_active,
                               mfa_secret, mfa_enabled, google_id, github_id, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(&user.mfa_secret)
        .bind(user.mfa_enabled)
        .bind(&user.google_id)
        .bind(&user.github_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "Email already registered"))?;
        Ok(())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_provider(
        &self,
        provider: IdentProvider,
        subject: &str,
    ) -> Result<Option<User>, AppError> {
        let sql = match provider {
            IdentProvider::Google => "SELECT * FROM users WHERE google_id = $1",
            IdentProvider::Github => "SELECT * FROM users WHERE github_id = $1",
        };
        sqlx::query_as::<_, UserRow>(sql)
            .bind(subject)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(User::try_from)
            .transpose()
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, password_hash = $3, display_name = $4, phone = $5, role_code = $6,
                is_active = $7, mfa_secret = $8, mfa_enabled = $9, google_id = $10, github_id = $11,
                updated_utc = $12
            WHERE user_id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(&user.mfa_secret)
        .bind(user.mfa_enabled)
        .bind(&user.google_id)
        .bind(&user.github_id)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, "Identity already linked to another account"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("User not found")));
        }
        Ok(())
    }
}

// ==================== Activity Operations ====================

fn push_activity_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a ActivityFilter) {
    qb.push(" WHERE TRUE");
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(action) = filter.action {
        qb.push(" AND action_code = ").push_bind(action.as_str());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status_code = ").push_bind(status.as_str());
    }
}

#[async_trait]
impl ActivityRepository for Database {
    async fn insert_activity(&self, log: &ActivityLog) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO activity_logs (log_id, user_id, action_code, status_code, ip_address, user_agent, details, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(log.id)
        .bind(log.user_id)
        .bind(log.action.as_str())
        .bind(log.status.as_str())
        .bind(&log.ip_address)
        .bind(&log.user_agent)
        .bind(&log.details)
        .bind(log.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn count_activity(
        &self,
        user_id: Uuid,
        action: ActivityAction,
        status: ActivityStatus,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM activity_logs
            WHERE user_id = $1 AND action_code = $2 AND status_code = $3 AND created_utc >= $4
            "#,
        )
        .bind(user_id)
        .bind(action.as_str())
        .bind(status.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn recent_activity(
        &self,
        user_id: Uuid,
        action: ActivityAction,
        status: ActivityStatus,
        since: DateTime<Utc>,
        limit: i64,
        exclude: Option<Uuid>,
    ) -> Result<Vec<ActivityLog>, AppError> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT * FROM activity_logs
            WHERE user_id = $1 AND action_code = $2 AND status_code = $3 AND created_utc >= $4
              AND ($5::uuid IS NULL OR log_id <> $5)
            ORDER BY created_utc DESC
            LIMIT $6
            "#,
        )
        .bind(user_id)
        .bind(action.as_str())
        .bind(status.as_str())
        .bind(since)
        .bind(exclude)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        convert_all(rows)
    }

    async fn list_activity(
        &self,
        filter: &ActivityFilter,
        page: &PageParams,
    ) -> Result<(Vec<ActivityLog>, i64), AppError> {
        let (limit, offset) = page_bounds(page);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM activity_logs");
        push_activity_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM activity_logs");
        push_activity_filter(&mut select, filter);
        select
            .push(" ORDER BY created_utc DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows: Vec<ActivityRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok((convert_all(rows)?, total))
    }

    async fn count_activity_by_status(
        &self,
        action: ActivityAction,
        since: DateTime<Utc>,
    ) -> Result<Vec<(ActivityStatus, i64)>, AppError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status_code, COUNT(*) FROM activity_logs
            WHERE action_code = $1 AND created_utc >= $2
            GROUP BY status_code
            "#,
        )
        .bind(action.as_str())
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter()
            .map(|(code, count)| Ok((parse_code(&code)?, count)))
            .collect()
    }
}

// ==================== Alert Operations ====================

#[async_trait]
impl AlertRepository for Database {
    async fn insert_alert(&self, alert: &SecurityAlert) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO security_alerts (alert_id, user_id, kind_code, severity_code, ip_address, details,
                                         resolved, resolved_by, resolved_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(alert.id)
        .bind(alert.user_id)
        .bind(alert.kind.as_str())
        .bind(alert.severity.as_str())
        .bind(&alert.ip_address)
        .bind(&alert.details)
        .bind(alert.resolved)
        .bind(alert.resolved_by)
        .bind(alert.resolved_at)
        .bind(alert.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn find_alert(&self, alert_id: Uuid) -> Result<Option<SecurityAlert>, AppError> {
        sqlx::query_as::<_, AlertRow>("SELECT * FROM security_alerts WHERE alert_id = $1")
            .bind(alert_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(SecurityAlert::try_from)
            .transpose()
    }

    async fn update_alert(&self, alert: &SecurityAlert) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE security_alerts SET resolved = $2, resolved_by = $3, resolved_utc = $4 WHERE alert_id = $1",
        )
        .bind(alert.id)
        .bind(alert.resolved)
        .bind(alert.resolved_by)
        .bind(alert.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn list_alerts(
        &self,
        resolved: Option<bool>,
        page: &PageParams,
    ) -> Result<(Vec<SecurityAlert>, i64), AppError> {
        let (limit, offset) = page_bounds(page);

        let total = self.count_alerts(resolved, None).await?;
        let rows = sqlx::query_as::<_, AlertRow>(
            r#"
            SELECT * FROM security_alerts
            WHERE ($1::boolean IS NULL OR resolved = $1)
            ORDER BY created_utc DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(resolved)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok((convert_all(rows)?, total))
    }

    async fn count_alerts(
        &self,
        resolved: Option<bool>,
        since: Option<DateTime<Utc>>,
    ) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM security_alerts
            WHERE ($1::boolean IS NULL OR resolved = $1)
              AND ($2::timestamptz IS NULL OR created_utc >= $2)
            "#,
        )
        .bind(resolved)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }
}

// ==================== Notification Operations ====================

#[async_trait]
impl NotificationRepository for Database {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (notification_id, user_id, kind_code, title, message, is_read, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        page: &PageParams,
    ) -> Result<(Vec<Notification>, i64), AppError> {
        let (limit, offset) = page_bounds(page);

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT * FROM notifications WHERE user_id = $1
            ORDER BY created_utc DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok((convert_all(rows)?, total))
    }

    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE notification_id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

// ==================== Lease Operations ====================

#[async_trait]
impl LeaseRepository for Database {
    async fn insert_lease(&self, lease: &Lease) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO leases (lease_id, property_id, tenant_id, landlord_id, monthly_rent_cents, start_date, end_date,
                                tenant_signature, landlord_signature, tenant_signed_utc, landlord_signed_utc,
                                status_code, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(lease.id)
        .bind(lease.property_id)
        .bind(lease.tenant_id)
        .bind(lease.landlord_id)
        .bind(lease.monthly_rent_cents)
        .bind(lease.start_date)
        .bind(lease.end_date)
        .bind(&lease.tenant_signature)
        .bind(&lease.landlord_signature)
        .bind(lease.tenant_signed_at)
        .bind(lease.landlord_signed_at)
        .bind(lease.status.as_str())
        .bind(lease.created_at)
        .bind(lease.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn find_lease(&self, lease_id: Uuid) -> Result<Option<Lease>, AppError> {
        sqlx::query_as::<_, LeaseRow>("SELECT * FROM leases WHERE lease_id = $1")
            .bind(lease_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Lease::try_from)
            .transpose()
    }

    async fn update_lease(&self, lease: &Lease) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE leases
            SET tenant_signature = $2, landlord_signature = $3, tenant_signed_utc = $4,
                landlord_signed_utc = $5, status_code = $6, updated_utc = $7
            WHERE lease_id = $1
            "#,
        )
        .bind(lease.id)
        .bind(&lease.tenant_signature)
        .bind(&lease.landlord_signature)
        .bind(lease.tenant_signed_at)
        .bind(lease.landlord_signed_at)
        .bind(lease.status.as_str())
        .bind(lease.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn list_leases_for_user(
        &self,
        user_id: Uuid,
        page: &PageParams,
    ) -> Result<(Vec<Lease>, i64), AppError> {
        let (limit, offset) = page_bounds(page);

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM leases WHERE tenant_id = $1 OR landlord_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        let rows = sqlx::query_as::<_, LeaseRow>(
            r#"
            SELECT * FROM leases WHERE tenant_id = $1 OR landlord_id = $1
            ORDER BY created_utc DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok((convert_all(rows)?, total))
    }
}

// ==================== Property Operations ====================

fn push_property_filter<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a PropertyFilter) {
    qb.push(" WHERE available = TRUE");
    if let Some(city) = filter.city.as_deref() {
        qb.push(" AND LOWER(city) = LOWER(").push_bind(city).push(")");
    }
    if let Some(min) = filter.min_rent {
        qb.push(" AND monthly_rent_cents >= ").push_bind(min);
    }
    if let Some(max) = filter.max_rent {
        qb.push(" AND monthly_rent_cents <= ").push_bind(max);
    }
    if let Some(bedrooms) = filter.bedrooms {
        qb.push(" AND bedrooms >= ").push_bind(bedrooms);
    }
}

#[async_trait]
impl PropertyRepository for Database {
    async fn insert_property(&self, property: &Property) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO properties (property_id, landlord_id, title, description, address, city, monthly_rent_cents,
                                    bedrooms, bathrooms, available, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(property.id)
        .bind(property.landlord_id)
        .bind(&property.title)
        .bind(&property.description)
        .bind(&property.address)
        .bind(&property.city)
        .bind(property.monthly_rent_cents)
        .bind(property.bedrooms)
        .bind(property.bathrooms)
        .bind(property.available)
        .bind(property.created_at)
        .bind(property.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn find_property(&self, property_id: Uuid) -> Result<Option<Property>, AppError> {
        let row = sqlx::query_as::<_, PropertyRow>("SELECT * FROM properties WHERE property_id = $1")
            .bind(property_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(row.map(Property::from))
    }

    async fn update_property(&self, property: &Property) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE properties
            SET title = $2, description = $3, address = $4, city = $5, monthly_rent_cents = $6,
                bedrooms = $7, bathrooms = $8, available = $9, updated_utc = $10
            WHERE property_id = $1
            "#,
        )
        .bind(property.id)
        .bind(&property.title)
        .bind(&property.description)
        .bind(&property.address)
        .bind(&property.city)
        .bind(property.monthly_rent_cents)
        .bind(property.bedrooms)
        .bind(property.bathrooms)
        .bind(property.available)
        .bind(property.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn search_properties(
        &self,
        filter: &PropertyFilter,
        page: &PageParams,
    ) -> Result<(Vec<Property>, i64), AppError> {
        let (limit, offset) = page_bounds(page);

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM properties");
        push_property_filter(&mut count, filter);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM properties");
        push_property_filter(&mut select, filter);
        select
            .push(" ORDER BY created_utc DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows: Vec<PropertyRow> = select
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok((rows.into_iter().map(Property::from).collect(), total))
    }
}

// ==================== Booking Operations ====================

#[async_trait]
impl BookingRepository for Database {
    async fn insert_booking(&self, booking: &Booking) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (booking_id, property_id, tenant_id, start_date, end_date, status_code, message,
                                  created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(booking.id)
        .bind(booking.property_id)
        .bind(booking.tenant_id)
        .bind(booking.start_date)
        .bind(booking.end_date)
        .bind(booking.status.as_str())
        .bind(&booking.message)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn find_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE booking_id = $1")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Booking::try_from)
            .transpose()
    }

    async fn update_booking(&self, booking: &Booking) -> Result<(), AppError> {
        sqlx::query("UPDATE bookings SET status_code = $2, updated_utc = $3 WHERE booking_id = $1")
            .bind(booking.id)
            .bind(booking.status.as_str())
            .bind(booking.updated_at)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn list_bookings_for_tenant(
        &self,
        tenant_id: Uuid,
        page: &PageParams,
    ) -> Result<(Vec<Booking>, i64), AppError> {
        let (limit, offset) = page_bounds(page);

        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bookings WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;

        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT * FROM bookings WHERE tenant_id = $1
            ORDER BY created_utc DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok((convert_all(rows)?, total))
    }

    async fn list_bookings_for_landlord(
        &self,
        landlord_id: Uuid,
        page: &PageParams,
    ) -> Result<(Vec<Booking>, i64), AppError> {
        let (limit, offset) = page_bounds(page);

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM bookings b
            JOIN properties p ON b.property_id = p.property_id
            WHERE p.landlord_id = $1
            "#,
        )
        .bind(landlord_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT b.* FROM bookings b
            JOIN properties p ON b.property_id = p.property_id
            WHERE p.landlord_id = $1
            ORDER BY b.created_utc DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(landlord_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok((convert_all(rows)?, total))
    }
}

#[async_trait]
impl Store for Database {
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }
}
