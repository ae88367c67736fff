//! Regulatory guest-reporting compliance engine
//!
//! Derives per-property submission state, validates and submits individual
//! reports with a local fallback, and assembles the bulk compliance
//! dashboard. Submissions are never silently lost: when the regulatory
//! channel is unreachable the engine records locally and reports
//! success-with-warning, keeping a human-auditable trail.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::reconciliation::status::normalize_booking_status;
use crate::traits::{PropertyCatalog, ProviderSet, RawReservation, SubmissionStore};
use crate::types::*;
use crate::utils::resolve::{resolve_count, resolve_date, resolve_str};
use crate::utils::rounding::round1;

/// Days after a submission before the next one falls due.
pub const DEFAULT_GRACE_DAYS: i64 = 7;

/// How far back the fuzzy reservation match searches.
pub const DEFAULT_MATCH_LOOKBACK_DAYS: i64 = 90;

/// Window for the dashboard's pending/overdue reservation metrics.
pub const METRICS_WINDOW_DAYS: i64 = 30;

/// Tunable compliance knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub grace_days: i64,
    pub match_lookback_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grace_days: DEFAULT_GRACE_DAYS,
            match_lookback_days: DEFAULT_MATCH_LOOKBACK_DAYS,
        }
    }
}

/// Classify a signed days-until-due figure.
///
/// The boundary day counts as due-soon: a submission due today is amber,
/// not green, and only a passed deadline is red.
pub fn classify(days_until_due: i64, grace_days: i64) -> ComplianceState {
    if days_until_due < 0 {
        ComplianceState::Overdue
    } else if days_until_due <= grace_days {
        ComplianceState::DueSoon
    } else {
        ComplianceState::Compliant
    }
}

/// Build a compliance record from a last-submission date, as seen on `today`.
pub fn build_record(
    property_id: &str,
    last_submission: Option<NaiveDate>,
    source: SubmissionSource,
    today: NaiveDate,
    grace_days: i64,
) -> ComplianceRecord {
    match last_submission {
        Some(last) => {
            let next_due = last + Duration::days(grace_days);
            let days_until_due = (next_due - today).num_days();
            ComplianceRecord {
                property_id: property_id.to_string(),
                last_submission: Some(last),
                next_due: Some(next_due),
                state: classify(days_until_due, grace_days),
                days_until_due: Some(days_until_due),
                source,
            }
        }
        None => ComplianceRecord {
            property_id: property_id.to_string(),
            last_submission: None,
            next_due: None,
            state: ComplianceState::Unknown,
            days_until_due: None,
            source: SubmissionSource::Unavailable,
        },
    }
}

/// A compliance submission payload after field-name normalization.
///
/// Controller clients spell field names inconsistently; the payload is
/// resolved into this typed form immediately on entry and nothing downstream
/// touches the raw JSON again.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionData {
    pub guest_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub reservation_code: Option<String>,
}

/// Resolve and structurally validate a submission payload.
///
/// Collects every structural problem instead of stopping at the first, so
/// the caller gets the full error list in one round trip.
pub fn resolve_submission(payload: &Value) -> Result<SubmissionData, Vec<String>> {
    let mut errors = Vec::new();

    let guest_name = resolve_str(payload, &["guestName", "guest_name", "name"]);
    if guest_name.is_none() {
        errors.push("Missing guest name".to_string());
    }
    let check_in = resolve_date(
        payload,
        &["checkIn", "checkin", "check_in", "checkInDate", "arrival"],
    );
    if check_in.is_none() {
        errors.push("Missing or invalid check-in date".to_string());
    }
    let check_out = resolve_date(
        payload,
        &["checkOut", "checkout", "check_out", "checkOutDate", "departure"],
    );
    if check_out.is_none() {
        errors.push("Missing or invalid check-out date".to_string());
    }
    let adults = resolve_count(payload, &["adults", "adultCount", "adult_count", "numAdults"]);
    if adults.is_none() {
        errors.push("Missing adult count".to_string());
    }
    let children =
        resolve_count(payload, &["children", "childCount", "child_count", "numChildren"])
            .unwrap_or(0);

    if let (Some(check_in), Some(check_out)) = (check_in, check_out) {
        if check_out <= check_in {
            errors.push("Check-out must be after check-in".to_string());
        }
    }
    if let Some(adults) = adults {
        if adults + children == 0 {
            errors.push("Total guest count is zero".to_string());
        }
    }

    match (guest_name, check_in, check_out, adults, errors.is_empty()) {
        (Some(guest_name), Some(check_in), Some(check_out), Some(adults), true) => {
            Ok(SubmissionData {
                guest_name,
                check_in,
                check_out,
                adults,
                children,
                reservation_code: resolve_str(
                    payload,
                    &["reservationCode", "reservation_code", "code"],
                ),
            })
        }
        _ => Err(errors),
    }
}

/// The compliance engine. All state lives behind the injected traits.
pub struct ComplianceEngine {
    providers: ProviderSet,
    catalog: Arc<dyn PropertyCatalog>,
    store: Arc<dyn SubmissionStore>,
    config: EngineConfig,
}

impl ComplianceEngine {
    /// Create an engine with the default grace and lookback windows.
    pub fn new(
        providers: ProviderSet,
        catalog: Arc<dyn PropertyCatalog>,
        store: Arc<dyn SubmissionStore>,
    ) -> Self {
        Self::with_config(providers, catalog, store, EngineConfig::default())
    }

    /// Create an engine with custom windows.
    pub fn with_config(
        providers: ProviderSet,
        catalog: Arc<dyn PropertyCatalog>,
        store: Arc<dyn SubmissionStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            providers,
            catalog,
            store,
            config,
        }
    }

    /// Current compliance record for one property.
    ///
    /// Degrades instead of failing: an unreachable upstream or unknown
    /// property yields an `Unknown`/`Unavailable` record.
    pub async fn property_status(&self, property_id: &str) -> ComplianceRecord {
        let today = Utc::now().date_naive();
        match self.catalog.get_property(property_id).await {
            Ok(Some(property)) => self.record_for(&property, today).await,
            Ok(None) => {
                warn!(property_id, "Property not in catalog");
                build_record(property_id, None, SubmissionSource::Unavailable, today, 0)
            }
            Err(err) => {
                warn!(property_id, error = %err, "Catalog lookup failed");
                build_record(property_id, None, SubmissionSource::Unavailable, today, 0)
            }
        }
    }

    /// Validate a submission payload, recovering the upstream reservation
    /// code by fuzzy match when the caller did not supply one.
    pub async fn validate(&self, property_id: &str, payload: &Value) -> ValidationResult {
        match resolve_submission(payload) {
            Ok(data) => self.validate_resolved(property_id, &data).await,
            Err(errors) => ValidationResult {
                valid: false,
                errors,
                ..Default::default()
            },
        }
    }

    /// Validate and submit a compliance report.
    ///
    /// Invalid payloads fail hard with the validation errors and nothing is
    /// sent. Valid payloads always succeed: if the upstream is unreachable,
    /// or no reservation code could be resolved, the report is recorded
    /// locally and the result carries a warning instead of an error.
    pub async fn send(&self, property_id: &str, payload: &Value) -> SubmissionResult {
        let data = match resolve_submission(payload) {
            Ok(data) => data,
            Err(errors) => return SubmissionResult::invalid(errors),
        };
        let validation = self.validate_resolved(property_id, &data).await;
        let mut warnings = validation.warnings;

        if let Some(code) = validation.reservation_code.clone() {
            match self.send_upstream(property_id, &code).await {
                Ok(submission_id) => {
                    debug!(property_id, code, "Compliance submission accepted upstream");
                    return SubmissionResult {
                        success: true,
                        submission_id: Some(submission_id),
                        reservation_code: Some(code),
                        warnings,
                        errors: Vec::new(),
                    };
                }
                Err(err) => {
                    warn!(property_id, code, error = %err, "Upstream submission failed; recording locally");
                    warnings.push(
                        "Regulatory channel unreachable; submission recorded locally".to_string(),
                    );
                }
            }
        }

        self.record_locally(property_id, &data, validation.reservation_code, warnings)
            .await
    }

    /// Bulk compliance dashboard over every catalog property.
    ///
    /// Properties are processed in independent tasks; one property's
    /// upstream failure produces an error-flagged row, never a dashboard-wide
    /// failure. Rows are sorted worst-first (overdue, due-soon, compliant,
    /// then error rows), stable within each class.
    pub async fn dashboard(&self) -> EngineResult<Vec<PropertyComplianceRow>> {
        let properties = self.catalog.list_properties().await?;
        let today = Utc::now().date_naive();

        let mut rows = join_all(
            properties
                .into_iter()
                .map(|property| self.dashboard_row(property, today)),
        )
        .await;

        rows.sort_by_key(|row| row.record.state.priority());
        Ok(rows)
    }

    async fn validate_resolved(&self, property_id: &str, data: &SubmissionData) -> ValidationResult {
        if data.reservation_code.is_some() {
            return ValidationResult {
                valid: true,
                reservation_code: data.reservation_code.clone(),
                ..Default::default()
            };
        }

        match self.locate(property_id, data).await {
            Ok(Some(code)) => ValidationResult {
                valid: true,
                reservation_code: Some(code),
                ..Default::default()
            },
            Ok(None) => ValidationResult {
                valid: true,
                warnings: vec![
                    "No matching reservation found; manual processing will be required"
                        .to_string(),
                ],
                ..Default::default()
            },
            Err(err) => {
                warn!(property_id, error = %err, "Reservation lookup failed during validation");
                ValidationResult {
                    valid: true,
                    warnings: vec![format!(
                        "Could not search upstream reservations ({err}); manual processing will be required"
                    )],
                    ..Default::default()
                }
            }
        }
    }

    /// Fuzzy match: case-insensitive guest-name substring plus exact
    /// check-in/check-out dates, over the lookback window. Multiple matches
    /// resolve deterministically to the lowest (arrival, id) pair.
    async fn locate(
        &self,
        property_id: &str,
        data: &SubmissionData,
    ) -> EngineResult<Option<String>> {
        let property = self
            .catalog
            .get_property(property_id)
            .await?
            .ok_or_else(|| EngineError::PropertyNotFound(property_id.to_string()))?;
        let provider = self.providers.for_property(&property);

        let today = Utc::now().date_naive();
        let window_start = today - Duration::days(self.config.match_lookback_days);
        let raws = provider
            .get_reservations(property_id, window_start, today)
            .await?;

        let needle = data.guest_name.to_lowercase();
        let mut candidates: Vec<&RawReservation> = raws
            .iter()
            .filter(|raw| {
                raw.arrival == Some(data.check_in)
                    && raw.departure == Some(data.check_out)
                    && raw.arrival.is_some_and(|arrival| arrival >= window_start)
                    && raw.guest_name.to_lowercase().contains(&needle)
            })
            .collect();
        candidates.sort_by(|a, b| (a.arrival, &a.id).cmp(&(b.arrival, &b.id)));

        Ok(candidates.first().map(|raw| raw.id.clone()))
    }

    async fn send_upstream(&self, property_id: &str, code: &str) -> EngineResult<String> {
        let property = self
            .catalog
            .get_property(property_id)
            .await?
            .ok_or_else(|| EngineError::PropertyNotFound(property_id.to_string()))?;
        let provider = self.providers.for_property(&property);
        let receipt = provider
            .send_compliance_submission(property_id, code)
            .await?;
        Ok(receipt.submission_id)
    }

    async fn record_locally(
        &self,
        property_id: &str,
        data: &SubmissionData,
        reservation_code: Option<String>,
        mut warnings: Vec<String>,
    ) -> SubmissionResult {
        let now = Utc::now().naive_utc();
        let submission = LocalSubmission {
            id: format!("local-{}-{}", now.format("%Y%m%d%H%M%S"), Uuid::new_v4()),
            property_id: property_id.to_string(),
            reservation_code: reservation_code.clone(),
            guest_name: data.guest_name.clone(),
            check_in: data.check_in,
            check_out: data.check_out,
            recorded_at: now,
        };
        let submission_id = submission.id.clone();

        match self.store.put(submission).await {
            Ok(()) => {
                if !warnings
                    .iter()
                    .any(|warning| warning.contains("recorded locally"))
                {
                    warnings.push("Submission recorded locally".to_string());
                }
                SubmissionResult {
                    success: true,
                    submission_id: Some(submission_id),
                    reservation_code,
                    warnings,
                    errors: Vec::new(),
                }
            }
            Err(err) => SubmissionResult {
                success: false,
                submission_id: None,
                reservation_code,
                warnings,
                errors: vec![format!("Could not record submission locally: {err}")],
            },
        }
    }

    async fn record_for(&self, property: &Property, today: NaiveDate) -> ComplianceRecord {
        let provider = self.providers.for_property(property);
        let provider_date = match provider.get_compliance_status(&property.id).await {
            Ok(check) => check.last_submission,
            Err(err) => {
                warn!(property_id = %property.id, error = %err, "Compliance status check failed");
                None
            }
        };
        let local_date = match self.store.list_for_property(&property.id).await {
            Ok(submissions) => submissions
                .iter()
                .map(|submission| submission.recorded_at.date())
                .max(),
            Err(err) => {
                warn!(property_id = %property.id, error = %err, "Local submission store unavailable");
                None
            }
        };

        let (last_submission, source) = match (provider_date, local_date) {
            (Some(provider), Some(local)) if local > provider => {
                (Some(local), SubmissionSource::LocalFallback)
            }
            (Some(provider), _) => (Some(provider), SubmissionSource::Provider),
            (None, Some(local)) => (Some(local), SubmissionSource::LocalFallback),
            (None, None) => (None, SubmissionSource::Unavailable),
        };

        build_record(
            &property.id,
            last_submission,
            source,
            today,
            self.config.grace_days,
        )
    }

    async fn dashboard_row(
        &self,
        property: Property,
        today: NaiveDate,
    ) -> PropertyComplianceRow {
        let provider = self.providers.for_property(&property);
        let window_start = today - Duration::days(METRICS_WINDOW_DAYS);

        let raws = match provider
            .get_reservations(&property.id, window_start, today)
            .await
        {
            Ok(raws) => raws,
            Err(err) => {
                warn!(property_id = %property.id, error = %err, "Dashboard fetch failed");
                return PropertyComplianceRow {
                    property_id: property.id.clone(),
                    property_name: property.name,
                    record: build_record(
                        &property.id,
                        None,
                        SubmissionSource::Unavailable,
                        today,
                        self.config.grace_days,
                    ),
                    pending: 0,
                    overdue: 0,
                    compliance_rate: 0.0,
                };
            }
        };

        let record = self.record_for(&property, today).await;

        let mut pending = 0usize;
        let mut overdue = 0usize;
        for raw in &raws {
            let Some(departure) = raw.departure else {
                continue;
            };
            if departure < window_start || departure > today {
                continue;
            }
            if normalize_booking_status(raw.status.as_deref()) == BookingStatus::Cancelled {
                continue;
            }
            pending += 1;
            if departure < today - Duration::days(self.config.grace_days) {
                overdue += 1;
            }
        }

        let compliance_rate = if pending == 0 {
            100.0
        } else {
            round1((pending - overdue) as f64 / pending as f64 * 100.0)
        };

        PropertyComplianceRow {
            property_id: property.id.clone(),
            property_name: property.name,
            record,
            pending,
            overdue,
            compliance_rate,
        }
    }
}
