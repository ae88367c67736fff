//! Status normalization for upstream booking and payment vocabularies
//!
//! Both functions are total: they never fail, and raw values outside the
//! synonym tables pass through verbatim so that upstream vocabulary drift
//! degrades to an unrecognized-but-visible status instead of an error.

use crate::types::{BookingStatus, PaymentStatus};

/// Map a raw upstream booking status onto the canonical vocabulary.
///
/// Matching is trimmed and case-insensitive. `None` and unrecognized values
/// are passed through as [`BookingStatus::Other`].
pub fn normalize_booking_status(raw: Option<&str>) -> BookingStatus {
    let Some(raw) = raw else {
        return BookingStatus::Other(String::new());
    };
    let key = raw.trim().to_ascii_lowercase();
    match key.as_str() {
        "confirmed" | "active" | "booked" | "reserved" | "accepted" => BookingStatus::Confirmed,
        "cancelled" | "canceled" | "cancelledbyguest" | "cancelled_by_guest"
        | "cancelledbyhost" | "cancelled_by_host" | "guest_cancelled" => BookingStatus::Cancelled,
        "modified" | "changed" | "altered" => BookingStatus::Modified,
        "inquiry" | "enquiry" | "request" => BookingStatus::InEnquiry,
        "noshow" | "no-show" | "no_show" => BookingStatus::NoShow,
        "expired" | "timeout" | "timed_out" => BookingStatus::Expired,
        _ => BookingStatus::Other(raw.trim().to_string()),
    }
}

/// Derive the canonical payment status from the raw upstream value and the
/// already-normalized booking status.
///
/// Policy, evaluated in order:
/// 1. Cancelled/Expired bookings carry no payment: `NotApplicable`.
/// 2. Enquiries are always `Pending`.
/// 3. An absent raw value derives from the booking status.
/// 4. A raw `"unknown"` re-derives the same way; `Unknown` is never a
///    terminal payment state.
/// 5. Anything else maps through the synonym table, or passes through.
pub fn normalize_payment_status(raw: Option<&str>, booking: &BookingStatus) -> PaymentStatus {
    if booking.is_terminated() {
        return PaymentStatus::NotApplicable;
    }
    if matches!(booking, BookingStatus::InEnquiry) {
        return PaymentStatus::Pending;
    }

    let raw = raw.map(str::trim).filter(|value| !value.is_empty());
    let Some(raw) = raw else {
        return derive_from_booking(booking);
    };

    let key = raw.to_ascii_lowercase();
    if key == "unknown" {
        return derive_from_booking(booking);
    }

    match key.as_str() {
        "paid" | "completed" | "success" | "settled" => PaymentStatus::Paid,
        "partial" | "partially_paid" | "partiallypaid" | "partially-paid" => {
            PaymentStatus::Partial
        }
        "pending" | "awaiting" | "due" | "unpaid" => PaymentStatus::Pending,
        "failed" | "declined" | "error" => PaymentStatus::Failed,
        "refunded" | "cancelled" | "canceled" | "chargeback" => PaymentStatus::Refunded,
        _ => PaymentStatus::Other(raw.to_string()),
    }
}

fn derive_from_booking(booking: &BookingStatus) -> PaymentStatus {
    match booking {
        BookingStatus::Confirmed | BookingStatus::Modified => PaymentStatus::Paid,
        _ => PaymentStatus::Pending,
    }
}
