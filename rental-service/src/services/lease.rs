//! Lease creation and two-party signing.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::activity::ActivityMonitor;
use super::error::ServiceError;
use super::store::Store;
use crate::models::{
    ActivityAction, ActivityStatus, Lease, LeaseParty, Notification, NotificationKind,
    RequestOrigin, UserRole,
};
use crate::utils::{Page, PageParams};

/// Terms of a lease as proposed by its landlord.
#[derive(Debug, Clone)]
pub struct NewLease {
    pub property_id: Option<Uuid>,
    pub tenant_id: Uuid,
    pub monthly_rent_cents: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Clone)]
pub struct LeaseService {
    store: Arc<dyn Store>,
    monitor: ActivityMonitor,
}

impl LeaseService {
    pub fn new(store: Arc<dyn Store>, monitor: ActivityMonitor) -> Self {
        Self { store, monitor }
    }

    #[tracing::instrument(skip(self, terms))]
    pub async fn create(
        &self,
        landlord_id: Uuid,
        landlord_role: UserRole,
        terms: NewLease,
    ) -> Result<Lease, ServiceError> {
        if landlord_role != UserRole::Landlord {
            return Err(ServiceError::Forbidden(
                "Only landlords can create leases".to_string(),
            ));
        }
        if terms.tenant_id == landlord_id {
            return Err(ServiceError::Validation(
                "Tenant and landlord must be different users".to_string(),
            ));
        }
        if terms.end_date <= terms.start_date {
            return Err(ServiceError::Validation(
                "end_date must be after start_date".to_string(),
            ));
        }
        if terms.monthly_rent_cents <= 0 {
            return Err(ServiceError::Validation(
                "monthly_rent_cents must be positive".to_string(),
            ));
        }

        self.store
            .find_user_by_id(terms.tenant_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(ServiceError::NotFound("Tenant"))?;

        if let Some(property_id) = terms.property_id {
            let property = self
                .store
                .find_property(property_id)
                .await?
                .ok_or(ServiceError::NotFound("Property"))?;
            if property.landlord_id != landlord_id {
                return Err(ServiceError::Forbidden(
                    "Property belongs to another landlord".to_string(),
                ));
            }
        }

        let lease = Lease::new(
            terms.property_id,
            terms.tenant_id,
            landlord_id,
            terms.monthly_rent_cents,
            terms.start_date,
            terms.end_date,
        );
        self.store.insert_lease(&lease).await?;
        tracing::info!(lease_id = %lease.id, tenant_id = %lease.tenant_id, "Lease created");
        Ok(lease)
    }

    /// Visible to its two parties and to admins.
    pub async fn get(
        &self,
        lease_id: Uuid,
        user_id: Uuid,
        role: UserRole,
    ) -> Result<Lease, ServiceError> {
        let lease = self
            .store
            .find_lease(lease_id)
            .await?
            .ok_or(ServiceError::NotFound("Lease"))?;

        if lease.party_of(user_id).is_none() && role != UserRole::Admin {
            return Err(ServiceError::Forbidden(
                "Not a party to this lease".to_string(),
            ));
        }
        Ok(lease)
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        page: &PageParams,
    ) -> Result<Page<Lease>, ServiceError> {
        let (items, total) = self.store.list_leases_for_user(user_id, page).await?;
        Ok(Page::new(items, page, total))
    }

    /// Record the signer's signature; the signer's party is derived from
    /// identity, never from input.
    #[tracing::instrument(skip(self, signature, origin))]
    pub async fn sign(
        &self,
        lease_id: Uuid,
        signer_id: Uuid,
        signature: &str,
        origin: &RequestOrigin,
    ) -> Result<Lease, ServiceError> {
        let signature = signature.trim();
        if signature.is_empty() {
            return Err(ServiceError::Validation(
                "Signature must not be empty".to_string(),
            ));
        }

        let mut lease = self
            .store
            .find_lease(lease_id)
            .await?
            .ok_or(ServiceError::NotFound("Lease"))?;

        let party = lease.party_of(signer_id).ok_or_else(|| {
            ServiceError::Forbidden("Not a party to this lease".to_string())
        })?;

        lease.sign(party, signature.to_string(), Utc::now());
        self.store.update_lease(&lease).await?;

        self.monitor
            .record(
                Some(signer_id),
                ActivityAction::LeaseSign,
                ActivityStatus::Success,
                origin,
                Some(format!("lease {} status {}", lease.id, lease.status.as_str())),
            )
            .await;

        let who = match party {
            LeaseParty::Tenant => "tenant",
            LeaseParty::Landlord => "landlord",
        };
        self.monitor
            .notify(Notification::new(
                lease.counterparty_of(party),
                NotificationKind::LeaseSigned,
                "Lease signed",
                format!(
                    "The {} signed lease {}. Current status: {}.",
                    who,
                    lease.id,
                    lease.status.as_str()
                ),
            ))
            .await;

        tracing::info!(lease_id = %lease.id, status = lease.status.as_str(), "Lease signed");
        Ok(lease)
    }
}
