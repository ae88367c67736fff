//! Traits for upstream providers and record-store abstraction

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::*;

/// A reservation as delivered by an upstream provider, before normalization.
///
/// Both upstream systems are mapped onto this DTO at the HTTP-client boundary;
/// the engines never see provider-specific response shapes. Optional fields
/// reflect real gaps in the upstream feeds, which the reconciler resolves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawReservation {
    pub id: String,
    pub property_id: String,
    pub guest_name: String,
    /// Email under the provider's primary key
    pub guest_email: Option<String>,
    /// Email under the provider's legacy key
    pub email: Option<String>,
    /// Email as reported by some booking channels
    pub contact_email: Option<String>,
    /// Email as reported by the secondary provider's channel bridge
    pub guest_contact_email: Option<String>,
    pub phone: Option<String>,
    pub arrival: Option<NaiveDate>,
    pub departure: Option<NaiveDate>,
    /// Night count when the provider precomputes it
    pub nights: Option<u32>,
    pub adults: Option<u32>,
    pub children: Option<u32>,
    pub total_price: Option<BigDecimal>,
    pub cleaning_fee: Option<BigDecimal>,
    pub host_commission: Option<BigDecimal>,
    pub tourist_tax: Option<BigDecimal>,
    /// Raw booking status in the provider's own vocabulary
    pub status: Option<String>,
    /// Raw payment status in the provider's own vocabulary
    pub payment_status: Option<String>,
    /// Check-in hour of day (0-23) when the provider reports one
    pub check_in_hour: Option<u8>,
    pub check_out_hour: Option<u8>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// One day of a property's availability calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCalendarDay {
    pub date: NaiveDate,
    pub status: CalendarDayStatus,
    pub price: Option<BigDecimal>,
    pub minimum_stay: Option<u32>,
}

/// Calendar day status understood by both providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalendarDayStatus {
    Available,
    Booked,
    Blocked,
    Maintenance,
    Cleaning,
}

/// Upstream response to a compliance-submission status check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComplianceCheck {
    pub status: String,
    /// Date of the most recent accepted submission, when the channel has one
    pub last_submission: Option<NaiveDate>,
}

/// Upstream acknowledgement of a compliance submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReceipt {
    pub status: String,
    pub submission_id: String,
}

/// An upstream reservation system (Primary or Secondary).
///
/// Implementations are HTTP clients owned by the surrounding application;
/// timeouts and retries live there. This core only assumes any call may
/// fail with [`EngineError::Upstream`] and degrades accordingly.
#[async_trait]
pub trait ReservationProvider: Send + Sync {
    /// Fetch raw reservations for a property.
    ///
    /// Providers may ignore the date bounds (not all upstreams support
    /// server-side filtering); callers must filter client-side.
    async fn get_reservations(
        &self,
        property_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<Vec<RawReservation>>;

    /// Fetch the availability calendar for a date range.
    async fn get_calendar(
        &self,
        property_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<Vec<RawCalendarDay>>;

    /// Set the calendar status (available/blocked/maintenance/cleaning)
    /// for a date range.
    async fn update_calendar(
        &self,
        property_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: CalendarDayStatus,
    ) -> EngineResult<()>;

    /// Set the nightly price for a date range.
    async fn update_pricing(
        &self,
        property_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        price: BigDecimal,
    ) -> EngineResult<()>;

    /// Set the minimum-stay requirement for a date range.
    async fn update_minimum_stay(
        &self,
        property_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        minimum_stay: u32,
    ) -> EngineResult<()>;

    /// Property-level regulatory status: the date of the latest accepted
    /// submission, when the channel tracks one.
    async fn get_compliance_status(&self, property_id: &str) -> EngineResult<ComplianceCheck>;

    /// Check the regulatory submission status of a reservation.
    async fn validate_compliance_submission(
        &self,
        property_id: &str,
        reservation_code: &str,
    ) -> EngineResult<ComplianceCheck>;

    /// Send a regulatory guest-reporting submission.
    async fn send_compliance_submission(
        &self,
        property_id: &str,
        reservation_code: &str,
    ) -> EngineResult<ComplianceReceipt>;
}

/// The pair of upstream systems, selected per property via
/// [`Property::source`].
#[derive(Clone)]
pub struct ProviderSet {
    pub primary: std::sync::Arc<dyn ReservationProvider>,
    pub secondary: std::sync::Arc<dyn ReservationProvider>,
}

impl ProviderSet {
    pub fn new(
        primary: std::sync::Arc<dyn ReservationProvider>,
        secondary: std::sync::Arc<dyn ReservationProvider>,
    ) -> Self {
        Self { primary, secondary }
    }

    /// The provider responsible for the given property.
    pub fn for_property(&self, property: &Property) -> &std::sync::Arc<dyn ReservationProvider> {
        match property.source {
            ProviderKind::Primary => &self.primary,
            ProviderKind::Secondary => &self.secondary,
        }
    }
}

/// Catalog of managed properties.
///
/// Keeps the engines free of global state: the surrounding application
/// injects whatever backs this (database, config file, in-memory fixture).
#[async_trait]
pub trait PropertyCatalog: Send + Sync {
    /// All known properties.
    async fn list_properties(&self) -> EngineResult<Vec<Property>>;

    /// Get a property by ID.
    async fn get_property(&self, property_id: &str) -> EngineResult<Option<Property>>;
}

/// Keyed store for locally recorded compliance submissions.
///
/// The engine writes here when the upstream regulatory channel is
/// unreachable; durable persistence is the collaborator's concern.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Record a local submission.
    async fn put(&self, submission: LocalSubmission) -> EngineResult<()>;

    /// Get a local submission by ID.
    async fn get(&self, id: &str) -> EngineResult<Option<LocalSubmission>>;

    /// List local submissions for a property.
    async fn list_for_property(&self, property_id: &str) -> EngineResult<Vec<LocalSubmission>>;

    /// Delete a local submission (after a successful upstream resend).
    async fn delete(&self, id: &str) -> EngineResult<()>;
}
