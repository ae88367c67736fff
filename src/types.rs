//! Core types and data structures for the reservation engine

use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Sentinel used when no guest email could be resolved from any upstream field.
///
/// Some booking channels withhold guest contact data for privacy reasons, so
/// an absent email is an expected condition, never an empty string.
pub const EMAIL_NOT_PROVIDED: &str = "not provided";

/// Canonical booking status, normalized from the raw vocabularies of both
/// upstream providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    /// Confirmed stay (raw: confirmed, active, booked, reserved, ...)
    Confirmed,
    /// Cancelled by either party
    Cancelled,
    /// Confirmed booking that was later altered
    Modified,
    /// Enquiry/request that has not been accepted yet
    InEnquiry,
    /// Guest never arrived
    NoShow,
    /// Enquiry or hold that lapsed without confirmation
    Expired,
    /// Unrecognized raw value, passed through verbatim
    Other(String),
}

impl BookingStatus {
    /// True for statuses where no stay takes place and no payment applies.
    pub fn is_terminated(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Expired)
    }

    /// True for bookings that represent an actual (past or upcoming) stay.
    pub fn is_reportable(&self) -> bool {
        !matches!(
            self,
            BookingStatus::Cancelled | BookingStatus::Expired | BookingStatus::InEnquiry
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Confirmed => write!(f, "Confirmed"),
            BookingStatus::Cancelled => write!(f, "Cancelled"),
            BookingStatus::Modified => write!(f, "Modified"),
            BookingStatus::InEnquiry => write!(f, "In Enquiry"),
            BookingStatus::NoShow => write!(f, "No Show"),
            BookingStatus::Expired => write!(f, "Expired"),
            BookingStatus::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Canonical payment status.
///
/// There is deliberately no `Unknown` variant: an unresolvable raw payment
/// value is always re-derived from the booking status and lands on `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Partial,
    Pending,
    Failed,
    Refunded,
    /// Payment does not apply (cancelled/expired bookings)
    NotApplicable,
    /// Unrecognized raw value, passed through verbatim
    Other(String),
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Paid => write!(f, "Paid"),
            PaymentStatus::Partial => write!(f, "Partial"),
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Failed => write!(f, "Failed"),
            PaymentStatus::Refunded => write!(f, "Refunded"),
            PaymentStatus::NotApplicable => write!(f, "N/A"),
            PaymentStatus::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Which upstream system a property is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    Primary,
    Secondary,
}

/// A managed property as known to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Unique identifier for the property
    pub id: String,
    /// Human-readable property name
    pub name: String,
    /// Upstream system holding this property's reservations
    pub source: ProviderKind,
    /// Internally managed properties are exempt from the VAT uplift
    pub admin_owned: bool,
    /// Management commission rate as a fraction (e.g. 0.25 for 25%)
    pub commission_rate: BigDecimal,
}

/// Canonical reservation record, the merged and enriched form every engine
/// in this crate consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Provider-assigned reservation identifier
    pub id: String,
    /// Property the reservation belongs to
    pub property_id: String,
    /// Guest full name
    pub guest_name: String,
    /// Resolved guest email, or [`EMAIL_NOT_PROVIDED`]
    pub guest_email: String,
    /// Guest phone number, if the channel shares one
    pub guest_phone: Option<String>,
    /// Arrival date
    pub arrival: NaiveDate,
    /// Departure date, strictly after arrival
    pub departure: NaiveDate,
    /// Number of nights, always `departure - arrival` in whole days
    pub nights: u32,
    /// Adult guest count, defaulted to 1 when the upstream omits it
    pub adults: u32,
    /// Child guest count, defaulted to 0
    pub children: u32,
    /// Gross total price, already net of all deductions
    pub total_price: BigDecimal,
    /// Cleaning fee, informational only (already included in the total)
    pub cleaning_fee: BigDecimal,
    /// Host-side channel commission reported by the upstream
    pub host_commission: BigDecimal,
    /// Tourist/city tax collected for this stay
    pub tourist_tax: BigDecimal,
    /// Canonical booking status
    pub booking_status: BookingStatus,
    /// Canonical payment status
    pub payment_status: PaymentStatus,
    /// Check-in time formatted as "HH:00", when the upstream reports an hour
    pub check_in_time: Option<String>,
    /// Check-out time formatted as "HH:00"
    pub check_out_time: Option<String>,
    /// When the reservation was created upstream
    pub created_at: NaiveDateTime,
    /// When the reservation was last updated upstream
    pub updated_at: NaiveDateTime,
}

impl Reservation {
    /// Number of nights between two dates (whole days).
    pub fn nights_between(arrival: NaiveDate, departure: NaiveDate) -> i64 {
        (departure - arrival).num_days()
    }
}

/// Whether the upstream fetch behind a result succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchStatus {
    Ok,
    Error,
}

/// Aggregate statistics over a reconciled reservation set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservationSummary {
    pub booking_count: usize,
    pub total_revenue: BigDecimal,
    pub total_cleaning_fees: BigDecimal,
    pub total_tourist_tax: BigDecimal,
    pub total_nights: u32,
    /// Nightly rate averaged per booking, guarded against zero-night rows
    pub average_nightly_rate: BigDecimal,
}

/// Non-fatal data-quality observations over a reconciled set.
///
/// Surfaced alongside a successful result, never thrown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    /// Reservation ids whose email fell through to the sentinel
    pub missing_email: Vec<String>,
    /// Reservation ids whose payment status survived as raw "unknown"
    pub unknown_payment_status: Vec<String>,
    /// Reservation ids arriving more than one year past current year-end
    pub far_future_arrivals: Vec<String>,
    /// Raw record ids dropped because departure was not after arrival
    pub invalid_date_rows: Vec<String>,
}

/// The canonical result of reconciling one property's reservations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationSet {
    pub property_id: String,
    /// `Error` means the upstream was unavailable and the set is empty
    pub status: FetchStatus,
    /// Sorted by arrival date, most recent first
    pub reservations: Vec<Reservation>,
    pub summary: ReservationSummary,
    pub quality: DataQualityReport,
}

/// Compliance classification for a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplianceState {
    /// Next submission is comfortably in the future (green)
    Compliant,
    /// Submission due within the grace window (amber)
    DueSoon,
    /// Submission deadline has passed (red)
    Overdue,
    /// No submission data available, or the upstream could not be reached
    Unknown,
}

impl ComplianceState {
    /// Dashboard sort key: overdue rows first, unknown/error rows last.
    pub fn priority(&self) -> u8 {
        match self {
            ComplianceState::Overdue => 0,
            ComplianceState::DueSoon => 1,
            ComplianceState::Compliant => 2,
            ComplianceState::Unknown => 3,
        }
    }
}

/// Where the last-submission information for a property came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionSource {
    /// Reported by the upstream regulatory channel
    Provider,
    /// Recorded locally while the upstream was unreachable
    LocalFallback,
    /// Neither channel had any data
    Unavailable,
}

/// Per-property regulatory submission state, recomputed on every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    pub property_id: String,
    pub last_submission: Option<NaiveDate>,
    pub next_due: Option<NaiveDate>,
    pub state: ComplianceState,
    /// Signed days until the next due date; negative means overdue
    pub days_until_due: Option<i64>,
    pub source: SubmissionSource,
}

/// One dashboard row: compliance state plus 30-day reservation metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyComplianceRow {
    pub property_id: String,
    pub property_name: String,
    pub record: ComplianceRecord,
    /// Non-cancelled reservations with checkout in the last 30 days
    pub pending: usize,
    /// Pending reservations more than the grace window past checkout
    pub overdue: usize,
    /// `(pending - overdue) / pending * 100`, or 100 when pending is zero
    pub compliance_rate: f64,
}

/// Outcome of compliance-submission validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Upstream reservation code, supplied or recovered by fuzzy matching
    pub reservation_code: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Outcome of one compliance submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub success: bool,
    /// Provider-issued id, or a synthetic local id on fallback
    pub submission_id: Option<String>,
    pub reservation_code: Option<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl SubmissionResult {
    /// A hard failure carrying only validation errors.
    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            success: false,
            submission_id: None,
            reservation_code: None,
            warnings: Vec::new(),
            errors,
        }
    }
}

/// A compliance submission recorded by this engine while the upstream
/// regulatory channel was unreachable. Preserves the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSubmission {
    /// Synthetic, timestamped identifier
    pub id: String,
    pub property_id: String,
    pub reservation_code: Option<String>,
    pub guest_name: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub recorded_at: NaiveDateTime,
}

/// One reservation's contribution to an owner statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    pub reservation_id: String,
    pub guest_name: String,
    pub received_amount: BigDecimal,
    pub host_commission: BigDecimal,
    pub cleaning_fee: BigDecimal,
    /// `max(0, received + host_commission - cleaning_fee)`
    pub commissionable_amount: BigDecimal,
    /// Zero for admin-owned properties
    pub management_commission: BigDecimal,
}

/// Owner financial statement over a set of reservations.
///
/// Invariant: `total_to_pay + total_to_invoice == total_received` exactly,
/// after monetary rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub lines: Vec<StatementLine>,
    pub commission_rate: BigDecimal,
    pub is_admin_owned: bool,
    pub total_received: BigDecimal,
    pub total_management_commission: BigDecimal,
    /// Sum of cleaning fees as reported by the upstream
    pub total_cleaning_fees: BigDecimal,
    /// Cleaning fees as invoiced: +23% VAT unless the property is admin-owned
    pub total_cleaning_fees_invoiced: BigDecimal,
    pub total_to_invoice: BigDecimal,
    pub total_to_pay: BigDecimal,
}

/// A calendar month, parsed from `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> EngineResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::Validation(format!(
                "Month out of range: {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Parse a `YYYY-MM` string.
    pub fn parse(value: &str) -> EngineResult<Self> {
        let (year, month) = value
            .trim()
            .split_once('-')
            .ok_or_else(|| EngineError::Validation(format!("Invalid month: '{value}'")))?;
        let year: i32 = year
            .parse()
            .map_err(|_| EngineError::Validation(format!("Invalid month: '{value}'")))?;
        let month: u32 = month
            .parse()
            .map_err(|_| EngineError::Validation(format!("Invalid month: '{value}'")))?;
        Self::new(year, month)
    }

    pub fn first_day(&self) -> NaiveDate {
        // Month is validated at construction, so this cannot fail
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or_default()
    }

    pub fn days(&self) -> u32 {
        self.last_day().day()
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Per-property performance for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySnapshot {
    pub property_id: String,
    pub property_name: String,
    pub month: Month,
    /// `Error` means the upstream fetch failed and every figure is zero
    pub status: FetchStatus,
    pub booking_count: usize,
    pub total_nights: u32,
    /// `total_nights / days_in_month * 100`, rounded to 1 decimal
    pub occupancy_rate: f64,
    /// Average daily rate: gross revenue / nights, zero-guarded
    pub adr: BigDecimal,
    pub gross_revenue: BigDecimal,
    pub commission: BigDecimal,
    pub cleaning_fees: BigDecimal,
    pub tourist_tax: BigDecimal,
    pub net_payout: BigDecimal,
}

/// Cross-property totals for one month. Error rows contribute zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub booking_count: usize,
    pub total_nights: u32,
    pub gross_revenue: BigDecimal,
    pub commission: BigDecimal,
    pub cleaning_fees: BigDecimal,
    pub tourist_tax: BigDecimal,
    pub net_payout: BigDecimal,
}

/// Portfolio rollup for one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioOverview {
    pub month: Month,
    pub properties: Vec<PropertySnapshot>,
    pub totals: PortfolioTotals,
    /// Averaged over non-error rows only
    pub average_occupancy: f64,
    /// Averaged over non-error rows only
    pub average_adr: BigDecimal,
}

/// Month-over-month portfolio series with first-to-last growth figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTrends {
    pub months: Vec<PortfolioOverview>,
    /// Relative revenue growth in percent; `None` when the base month is zero
    pub revenue_growth_pct: Option<f64>,
    /// Relative occupancy growth in percent; `None` when the base is zero
    pub occupancy_growth_pct: Option<f64>,
}

/// Errors that can occur in the reservation engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Upstream unavailable: {0}")]
    Upstream(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Store error: {0}")]
    Store(String),
    #[error("Property not found: {0}")]
    PropertyNotFound(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_parse_and_bounds() {
        let month = Month::parse("2025-07").unwrap();
        assert_eq!(
            month.first_day(),
            NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
        );
        assert_eq!(
            month.last_day(),
            NaiveDate::from_ymd_opt(2025, 7, 31).unwrap()
        );
        assert_eq!(month.days(), 31);
        assert_eq!(month.to_string(), "2025-07");
    }

    #[test]
    fn test_month_parse_rejects_garbage() {
        assert!(Month::parse("2025").is_err());
        assert!(Month::parse("2025-13").is_err());
        assert!(Month::parse("x-07").is_err());
    }

    #[test]
    fn test_february_leap_year() {
        assert_eq!(Month::parse("2024-02").unwrap().days(), 29);
        assert_eq!(Month::parse("2025-02").unwrap().days(), 28);
    }

    #[test]
    fn test_nights_between() {
        let arrival = NaiveDate::from_ymd_opt(2025, 7, 10).unwrap();
        let departure = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
        assert_eq!(Reservation::nights_between(arrival, departure), 5);
    }

    #[test]
    fn test_compliance_state_priority_order() {
        assert!(ComplianceState::Overdue.priority() < ComplianceState::DueSoon.priority());
        assert!(ComplianceState::DueSoon.priority() < ComplianceState::Compliant.priority());
        assert!(ComplianceState::Compliant.priority() < ComplianceState::Unknown.priority());
    }
}
