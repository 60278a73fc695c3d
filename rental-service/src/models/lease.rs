//! Leases and their two-party signature state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaseStatus {
    Pending,
    TenantSigned,
    LandlordSigned,
    FullySigned,
}

impl LeaseStatus {
    /// The only valid status for a given pair of signature states.
    pub fn from_signatures(tenant_signed: bool, landlord_signed: bool) -> Self {
        match (tenant_signed, landlord_signed) {
            (false, false) => LeaseStatus::Pending,
            (true, false) => LeaseStatus::TenantSigned,
            (false, true) => LeaseStatus::LandlordSigned,
            (true, true) => LeaseStatus::FullySigned,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseStatus::Pending => "PENDING",
            LeaseStatus::TenantSigned => "TENANT_SIGNED",
            LeaseStatus::LandlordSigned => "LANDLORD_SIGNED",
            LeaseStatus::FullySigned => "FULLY_SIGNED",
        }
    }
}

impl FromStr for LeaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(LeaseStatus::Pending),
            "TENANT_SIGNED" => Ok(LeaseStatus::TenantSigned),
            "LANDLORD_SIGNED" => Ok(LeaseStatus::LandlordSigned),
            "FULLY_SIGNED" => Ok(LeaseStatus::FullySigned),
            other => Err(format!("Unknown lease status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseParty {
    Tenant,
    Landlord,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Lease {
    pub id: Uuid,
    pub property_id: Option<Uuid>,
    pub tenant_id: Uuid,
    pub landlord_id: Uuid,
    pub monthly_rent_cents: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub tenant_signature: Option<String>,
    pub landlord_signature: Option<String>,
    pub tenant_signed_at: Option<DateTime<Utc>>,
    pub landlord_signed_at: Option<DateTime<Utc>>,
    pub status: LeaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lease {
    pub fn new(
        property_id: Option<Uuid>,
        tenant_id: Uuid,
        landlord_id: Uuid,
        monthly_rent_cents: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            property_id,
            tenant_id,
            landlord_id,
            monthly_rent_cents,
            start_date,
            end_date,
            tenant_signature: None,
            landlord_signature: None,
            tenant_signed_at: None,
            landlord_signed_at: None,
            status: LeaseStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn party_of(&self, user_id: Uuid) -> Option<LeaseParty> {
        if self.tenant_id == user_id {
            Some(LeaseParty::Tenant)
        } else if self.landlord_id == user_id {
            Some(LeaseParty::Landlord)
        } else {
            None
        }
    }

    pub fn counterparty_of(&self, party: LeaseParty) -> Uuid {
        match party {
            LeaseParty::Tenant => self.landlord_id,
            LeaseParty::Landlord => self.tenant_id,
        }
    }

    /// Record `party`'s signature. Only that party's fields are touched.
    pub fn sign(&mut self, party: LeaseParty, signature: String, at: DateTime<Utc>) {
        match party {
            LeaseParty::Tenant => {
                self.tenant_signature = Some(signature);
                self.tenant_signed_at = Some(at);
            }
            LeaseParty::Landlord => {
                self.landlord_signature = Some(signature);
                self.landlord_signed_at = Some(at);
            }
        }
        self.status = LeaseStatus::from_signatures(
            self.tenant_signature.is_some(),
            self.landlord_signature.is_some(),
        );
        self.updated_at = at;
    }
}
