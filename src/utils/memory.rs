//! In-memory implementations of the catalog, submission store, and upstream
//! provider traits, for testing and development

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// In-memory property catalog.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    properties: Arc<RwLock<HashMap<String, Property>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a property.
    pub fn insert(&self, property: Property) {
        self.properties
            .write()
            .unwrap()
            .insert(property.id.clone(), property);
    }

    /// Clear all data (useful for testing).
    pub fn clear(&self) {
        self.properties.write().unwrap().clear();
    }
}

#[async_trait]
impl PropertyCatalog for MemoryCatalog {
    async fn list_properties(&self) -> EngineResult<Vec<Property>> {
        let mut properties: Vec<Property> =
            self.properties.read().unwrap().values().cloned().collect();
        properties.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(properties)
    }

    async fn get_property(&self, property_id: &str) -> EngineResult<Option<Property>> {
        Ok(self.properties.read().unwrap().get(property_id).cloned())
    }
}

/// In-memory store for locally recorded compliance submissions.
#[derive(Debug, Clone, Default)]
pub struct MemorySubmissionStore {
    submissions: Arc<RwLock<HashMap<String, LocalSubmission>>>,
}

impl MemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing).
    pub fn clear(&self) {
        self.submissions.write().unwrap().clear();
    }
}

#[async_trait]
impl SubmissionStore for MemorySubmissionStore {
    async fn put(&self, submission: LocalSubmission) -> EngineResult<()> {
        self.submissions
            .write()
            .unwrap()
            .insert(submission.id.clone(), submission);
        Ok(())
    }

    async fn get(&self, id: &str) -> EngineResult<Option<LocalSubmission>> {
        Ok(self.submissions.read().unwrap().get(id).cloned())
    }

    async fn list_for_property(&self, property_id: &str) -> EngineResult<Vec<LocalSubmission>> {
        let mut submissions: Vec<LocalSubmission> = self
            .submissions
            .read()
            .unwrap()
            .values()
            .filter(|submission| submission.property_id == property_id)
            .cloned()
            .collect();
        submissions.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
        Ok(submissions)
    }

    async fn delete(&self, id: &str) -> EngineResult<()> {
        if self.submissions.write().unwrap().remove(id).is_some() {
            Ok(())
        } else {
            Err(EngineError::Store(format!("No local submission '{id}'")))
        }
    }
}

/// Scriptable in-memory upstream provider.
///
/// Backs both the Primary and Secondary slots in tests; individual
/// properties can be marked as failing to exercise the degradation paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    reservations: Arc<RwLock<HashMap<String, Vec<RawReservation>>>>,
    calendars: Arc<RwLock<HashMap<String, Vec<RawCalendarDay>>>>,
    compliance: Arc<RwLock<HashMap<String, ComplianceCheck>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    submissions_failing: Arc<RwLock<bool>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored reservations for a property.
    pub fn set_reservations(&self, property_id: &str, reservations: Vec<RawReservation>) {
        self.reservations
            .write()
            .unwrap()
            .insert(property_id.to_string(), reservations);
    }

    /// Replace the stored calendar for a property.
    pub fn set_calendar(&self, property_id: &str, days: Vec<RawCalendarDay>) {
        self.calendars
            .write()
            .unwrap()
            .insert(property_id.to_string(), days);
    }

    /// Set the property-level compliance status.
    pub fn set_compliance_status(&self, property_id: &str, check: ComplianceCheck) {
        self.compliance
            .write()
            .unwrap()
            .insert(property_id.to_string(), check);
    }

    /// Make every call for this property fail with an upstream error.
    pub fn fail_property(&self, property_id: &str) {
        self.failing.write().unwrap().insert(property_id.to_string());
    }

    /// Make compliance submissions fail while fetches keep working.
    pub fn set_submission_failure(&self, failing: bool) {
        *self.submissions_failing.write().unwrap() = failing;
    }

    fn check_available(&self, property_id: &str) -> EngineResult<()> {
        if self.failing.read().unwrap().contains(property_id) {
            Err(EngineError::Upstream(format!(
                "Provider unreachable for property '{property_id}'"
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ReservationProvider for MemoryProvider {
    async fn get_reservations(
        &self,
        property_id: &str,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> EngineResult<Vec<RawReservation>> {
        self.check_available(property_id)?;
        // Date bounds are ignored, like an upstream without server-side
        // filtering; callers filter client-side.
        Ok(self
            .reservations
            .read()
            .unwrap()
            .get(property_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_calendar(
        &self,
        property_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<Vec<RawCalendarDay>> {
        self.check_available(property_id)?;
        Ok(self
            .calendars
            .read()
            .unwrap()
            .get(property_id)
            .map(|days| {
                days.iter()
                    .filter(|day| day.date >= start_date && day.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_calendar(
        &self,
        property_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: CalendarDayStatus,
    ) -> EngineResult<()> {
        self.check_available(property_id)?;
        if let Some(days) = self.calendars.write().unwrap().get_mut(property_id) {
            for day in days
                .iter_mut()
                .filter(|day| day.date >= start_date && day.date <= end_date)
            {
                day.status = status;
            }
        }
        Ok(())
    }

    async fn update_pricing(
        &self,
        property_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        price: BigDecimal,
    ) -> EngineResult<()> {
        self.check_available(property_id)?;
        if let Some(days) = self.calendars.write().unwrap().get_mut(property_id) {
            for day in days
                .iter_mut()
                .filter(|day| day.date >= start_date && day.date <= end_date)
            {
                day.price = Some(price.clone());
            }
        }
        Ok(())
    }

    async fn update_minimum_stay(
        &self,
        property_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        minimum_stay: u32,
    ) -> EngineResult<()> {
        self.check_available(property_id)?;
        if let Some(days) = self.calendars.write().unwrap().get_mut(property_id) {
            for day in days
                .iter_mut()
                .filter(|day| day.date >= start_date && day.date <= end_date)
            {
                day.minimum_stay = Some(minimum_stay);
            }
        }
        Ok(())
    }

    async fn get_compliance_status(&self, property_id: &str) -> EngineResult<ComplianceCheck> {
        self.check_available(property_id)?;
        Ok(self
            .compliance
            .read()
            .unwrap()
            .get(property_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn validate_compliance_submission(
        &self,
        property_id: &str,
        reservation_code: &str,
    ) -> EngineResult<ComplianceCheck> {
        self.check_available(property_id)?;
        let known = self
            .reservations
            .read()
            .unwrap()
            .get(property_id)
            .is_some_and(|reservations| reservations.iter().any(|r| r.id == reservation_code));
        Ok(ComplianceCheck {
            status: if known { "found" } else { "not_found" }.to_string(),
            last_submission: None,
        })
    }

    async fn send_compliance_submission(
        &self,
        property_id: &str,
        _reservation_code: &str,
    ) -> EngineResult<ComplianceReceipt> {
        self.check_available(property_id)?;
        if *self.submissions_failing.read().unwrap() {
            return Err(EngineError::Upstream(
                "Regulatory channel rejected the connection".to_string(),
            ));
        }
        Ok(ComplianceReceipt {
            status: "accepted".to_string(),
            submission_id: Uuid::new_v4().to_string(),
        })
    }
}
