//! Merging, filtering, and enrichment of raw upstream reservations into the
//! canonical reservation model

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{Datelike, NaiveDate, Utc};
use tracing::warn;

use crate::reconciliation::status::{normalize_booking_status, normalize_payment_status};
use crate::traits::{PropertyCatalog, ProviderSet, RawReservation};
use crate::types::*;
use crate::utils::resolve::resolve_guest_email;
use crate::utils::rounding::round_money;

/// Start of the sentinel full-range query window.
pub fn full_range_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

/// End of the sentinel full-range query window.
pub fn full_range_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 12, 31).unwrap_or_default()
}

/// Reconciles one property's reservations from its upstream provider into a
/// canonical, filtered, enriched [`ReservationSet`].
pub struct ReservationReconciler {
    providers: ProviderSet,
    catalog: Arc<dyn PropertyCatalog>,
}

impl ReservationReconciler {
    /// Create a new reconciler over the given upstreams and catalog.
    pub fn new(providers: ProviderSet, catalog: Arc<dyn PropertyCatalog>) -> Self {
        Self { providers, catalog }
    }

    /// Fetch, filter, and enrich reservations for a property.
    ///
    /// Never fails: an unreachable upstream (or unknown property) yields an
    /// empty set flagged [`FetchStatus::Error`], which callers treat as "no
    /// data available", not as a request failure.
    pub async fn reconcile(
        &self,
        property_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ReservationSet {
        let property = match self.catalog.get_property(property_id).await {
            Ok(Some(property)) => property,
            Ok(None) => {
                warn!(property_id, "Property not in catalog; returning empty set");
                return error_set(property_id);
            }
            Err(err) => {
                warn!(property_id, error = %err, "Catalog lookup failed");
                return error_set(property_id);
            }
        };

        // The upstreams may not support server-side date filtering, so the
        // fetch is unbounded and the window is applied client-side.
        let provider = self.providers.for_property(&property);
        let raws = match provider
            .get_reservations(property_id, full_range_start(), full_range_end())
            .await
        {
            Ok(raws) => raws,
            Err(err) => {
                warn!(property_id, error = %err, "Upstream reservation fetch failed");
                return error_set(property_id);
            }
        };

        assemble_set(
            property_id,
            raws,
            start_date,
            end_date,
            Utc::now().date_naive(),
        )
    }
}

/// Pure assembly step: overlap-filter, enrich, sort, and summarize raw
/// reservations for the `[start_date, end_date]` window as seen on `today`.
pub fn assemble_set(
    property_id: &str,
    raws: Vec<RawReservation>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    today: NaiveDate,
) -> ReservationSet {
    // The full-range sentinel means "no filtering".
    let unfiltered = start_date == full_range_start() && end_date == full_range_end();

    let mut quality = DataQualityReport::default();
    let mut reservations: Vec<Reservation> = Vec::new();

    for raw in raws {
        let reservation = match enrich(property_id, raw) {
            Ok(reservation) => reservation,
            Err(raw_id) => {
                quality.invalid_date_rows.push(raw_id);
                continue;
            }
        };

        // Inclusive overlap filter: a reservation matches when its arrival
        // or its departure falls inside the window. A reservation fully
        // spanning the window matches neither endpoint and is excluded;
        // callers depend on this exact behavior.
        let arrival_in = reservation.arrival >= start_date && reservation.arrival <= end_date;
        let departure_in =
            reservation.departure >= start_date && reservation.departure <= end_date;
        if !unfiltered && !arrival_in && !departure_in {
            continue;
        }

        if reservation.guest_email == EMAIL_NOT_PROVIDED {
            quality.missing_email.push(reservation.id.clone());
        }
        if let PaymentStatus::Other(raw_value) = &reservation.payment_status {
            if raw_value.eq_ignore_ascii_case("unknown") {
                quality.unknown_payment_status.push(reservation.id.clone());
            }
        }
        // Heuristic data-quality signal, not an error: arrivals more than a
        // year past the current year-end are almost always feed glitches.
        if reservation.arrival.year() > today.year() + 1 {
            quality.far_future_arrivals.push(reservation.id.clone());
        }

        reservations.push(reservation);
    }

    reservations.sort_by(|a, b| b.arrival.cmp(&a.arrival));

    let summary = summarize(&reservations);

    ReservationSet {
        property_id: property_id.to_string(),
        status: FetchStatus::Ok,
        reservations,
        summary,
        quality,
    }
}

/// Convert one raw record into the canonical model.
///
/// Returns the raw id as the error when the record has no usable date pair
/// (missing dates, or departure not after arrival).
fn enrich(property_id: &str, raw: RawReservation) -> Result<Reservation, String> {
    let (Some(arrival), Some(departure)) = (raw.arrival, raw.departure) else {
        return Err(raw.id);
    };
    let computed_nights = Reservation::nights_between(arrival, departure);
    if computed_nights <= 0 {
        return Err(raw.id);
    }

    let guest_email = resolve_guest_email(&raw);
    let nights = raw
        .nights
        .filter(|n| *n > 0)
        .unwrap_or(computed_nights as u32);
    let fallback_timestamp = arrival.and_hms_opt(0, 0, 0).unwrap_or_default();

    let booking_status = normalize_booking_status(raw.status.as_deref());
    let payment_status =
        normalize_payment_status(raw.payment_status.as_deref(), &booking_status);

    Ok(Reservation {
        id: raw.id,
        property_id: property_id.to_string(),
        guest_name: raw.guest_name,
        guest_email,
        guest_phone: raw.phone,
        arrival,
        departure,
        nights,
        adults: raw.adults.unwrap_or(1),
        children: raw.children.unwrap_or(0),
        total_price: raw.total_price.unwrap_or_else(|| BigDecimal::from(0)),
        cleaning_fee: raw.cleaning_fee.unwrap_or_else(|| BigDecimal::from(0)),
        host_commission: raw.host_commission.unwrap_or_else(|| BigDecimal::from(0)),
        tourist_tax: raw.tourist_tax.unwrap_or_else(|| BigDecimal::from(0)),
        booking_status,
        payment_status,
        check_in_time: raw.check_in_hour.map(|hour| format!("{hour:02}:00")),
        check_out_time: raw.check_out_hour.map(|hour| format!("{hour:02}:00")),
        created_at: raw.created_at.unwrap_or(fallback_timestamp),
        updated_at: raw.updated_at.unwrap_or(fallback_timestamp),
    })
}

fn summarize(reservations: &[Reservation]) -> ReservationSummary {
    let mut total_revenue = BigDecimal::from(0);
    let mut total_cleaning_fees = BigDecimal::from(0);
    let mut total_tourist_tax = BigDecimal::from(0);
    let mut total_nights: u32 = 0;
    let mut nightly_rate_sum = BigDecimal::from(0);

    for reservation in reservations {
        total_revenue += &reservation.total_price;
        total_cleaning_fees += &reservation.cleaning_fee;
        total_tourist_tax += &reservation.tourist_tax;
        total_nights += reservation.nights;
        if reservation.nights > 0 {
            nightly_rate_sum +=
                &reservation.total_price / BigDecimal::from(reservation.nights);
        }
    }

    let booking_count = reservations.len();
    let average_nightly_rate = if booking_count > 0 {
        round_money(&(nightly_rate_sum / BigDecimal::from(booking_count as u64)))
    } else {
        BigDecimal::from(0)
    };

    ReservationSummary {
        booking_count,
        total_revenue,
        total_cleaning_fees,
        total_tourist_tax,
        total_nights,
        average_nightly_rate,
    }
}

fn error_set(property_id: &str) -> ReservationSet {
    ReservationSet {
        property_id: property_id.to_string(),
        status: FetchStatus::Error,
        reservations: Vec::new(),
        summary: ReservationSummary::default(),
        quality: DataQualityReport::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn raw(id: &str, arrival: NaiveDate, departure: NaiveDate) -> RawReservation {
        RawReservation {
            id: id.to_string(),
            property_id: "prop-1".to_string(),
            guest_name: "Ana Silva".to_string(),
            guest_email: Some("ana@example.com".to_string()),
            arrival: Some(arrival),
            departure: Some(departure),
            total_price: Some(BigDecimal::from(500)),
            status: Some("confirmed".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_overlap_filter_matches_either_endpoint() {
        let raws = vec![
            raw("inside", date(2025, 7, 10), date(2025, 7, 15)),
            raw("arrival-only", date(2025, 7, 30), date(2025, 8, 4)),
            raw("departure-only", date(2025, 6, 28), date(2025, 7, 2)),
            raw("outside", date(2025, 9, 1), date(2025, 9, 5)),
        ];
        let set = assemble_set(
            "prop-1",
            raws,
            date(2025, 7, 1),
            date(2025, 7, 31),
            date(2025, 7, 1),
        );
        let ids: Vec<&str> = set.reservations.iter().map(|r| r.id.as_str()).collect();
        assert!(ids.contains(&"inside"));
        assert!(ids.contains(&"arrival-only"));
        assert!(ids.contains(&"departure-only"));
        assert!(!ids.contains(&"outside"));
    }

    #[test]
    fn test_fully_spanning_reservation_is_not_matched() {
        // Documented simplification: neither endpoint inside the window.
        let raws = vec![raw("spanning", date(2025, 6, 20), date(2025, 8, 10))];
        let set = assemble_set(
            "prop-1",
            raws,
            date(2025, 7, 1),
            date(2025, 7, 31),
            date(2025, 7, 1),
        );
        assert!(set.reservations.is_empty());
    }

    #[test]
    fn test_full_range_sentinel_disables_filtering() {
        let raws = vec![raw("spanning", date(2025, 6, 20), date(2025, 8, 10))];
        let set = assemble_set(
            "prop-1",
            raws,
            full_range_start(),
            full_range_end(),
            date(2025, 7, 1),
        );
        assert_eq!(set.reservations.len(), 1);
    }

    #[test]
    fn test_nights_computed_and_positive() {
        let raws = vec![
            raw("five-nights", date(2025, 7, 10), date(2025, 7, 15)),
            raw("same-day", date(2025, 7, 10), date(2025, 7, 10)),
            raw("inverted", date(2025, 7, 15), date(2025, 7, 10)),
        ];
        let set = assemble_set(
            "prop-1",
            raws,
            full_range_start(),
            full_range_end(),
            date(2025, 7, 1),
        );
        assert_eq!(set.reservations.len(), 1);
        assert_eq!(set.reservations[0].nights, 5);
        assert_eq!(
            set.quality.invalid_date_rows,
            vec!["same-day".to_string(), "inverted".to_string()]
        );
    }

    #[test]
    fn test_sorted_by_arrival_descending() {
        let raws = vec![
            raw("early", date(2025, 7, 1), date(2025, 7, 3)),
            raw("late", date(2025, 7, 20), date(2025, 7, 25)),
            raw("middle", date(2025, 7, 10), date(2025, 7, 12)),
        ];
        let set = assemble_set(
            "prop-1",
            raws,
            full_range_start(),
            full_range_end(),
            date(2025, 7, 1),
        );
        let ids: Vec<&str> = set.reservations.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["late", "middle", "early"]);
    }

    #[test]
    fn test_defaults_and_time_formatting() {
        let mut record = raw("r1", date(2025, 7, 10), date(2025, 7, 15));
        record.adults = None;
        record.children = None;
        record.check_in_hour = Some(15);
        let set = assemble_set(
            "prop-1",
            vec![record],
            full_range_start(),
            full_range_end(),
            date(2025, 7, 1),
        );
        let reservation = &set.reservations[0];
        assert_eq!(reservation.adults, 1);
        assert_eq!(reservation.children, 0);
        assert_eq!(reservation.check_in_time.as_deref(), Some("15:00"));
        assert_eq!(reservation.check_out_time, None);
    }

    #[test]
    fn test_summary_statistics() {
        let mut first = raw("r1", date(2025, 7, 10), date(2025, 7, 15));
        first.total_price = Some(BigDecimal::from(500));
        first.cleaning_fee = Some(BigDecimal::from(50));
        first.tourist_tax = Some(BigDecimal::from(10));
        let mut second = raw("r2", date(2025, 7, 20), date(2025, 7, 22));
        second.total_price = Some(BigDecimal::from(300));

        let set = assemble_set(
            "prop-1",
            vec![first, second],
            full_range_start(),
            full_range_end(),
            date(2025, 7, 1),
        );
        assert_eq!(set.summary.booking_count, 2);
        assert_eq!(set.summary.total_revenue, BigDecimal::from(800));
        assert_eq!(set.summary.total_cleaning_fees, BigDecimal::from(50));
        assert_eq!(set.summary.total_tourist_tax, BigDecimal::from(10));
        assert_eq!(set.summary.total_nights, 7);
        // (500/5 + 300/2) / 2 = (100 + 150) / 2 = 125
        assert_eq!(set.summary.average_nightly_rate, BigDecimal::from(125));
    }

    #[test]
    fn test_empty_set_summary_is_zeroed() {
        let set = assemble_set(
            "prop-1",
            Vec::new(),
            full_range_start(),
            full_range_end(),
            date(2025, 7, 1),
        );
        assert_eq!(set.summary.booking_count, 0);
        assert_eq!(set.summary.average_nightly_rate, BigDecimal::from(0));
        assert_eq!(set.status, FetchStatus::Ok);
    }

    #[test]
    fn test_quality_flags() {
        let mut no_email = raw("no-email", date(2025, 7, 10), date(2025, 7, 15));
        no_email.guest_email = None;
        let far_future = raw("far-future", date(2027, 3, 1), date(2027, 3, 5));

        let set = assemble_set(
            "prop-1",
            vec![no_email, far_future],
            full_range_start(),
            full_range_end(),
            date(2025, 7, 1),
        );
        assert_eq!(set.quality.missing_email, vec!["no-email".to_string()]);
        assert_eq!(
            set.quality.far_future_arrivals,
            vec!["far-future".to_string()]
        );
        assert!(set.quality.unknown_payment_status.is_empty());
        // The sentinel replaces the missing address; empty string never leaks.
        let flagged = set
            .reservations
            .iter()
            .find(|r| r.id == "no-email")
            .unwrap();
        assert_eq!(flagged.guest_email, EMAIL_NOT_PROVIDED);
    }
}
