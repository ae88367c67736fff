//! Owner financial statement calculation
//!
//! Commission and VAT rules: the management commission is charged on the
//! received amount plus host commission minus the cleaning fee, and already
//! embeds VAT for externally owned properties. Cleaning fees carry a
//! separate 23% VAT surcharge, again only for externally owned properties.
//! Admin-owned properties are exempt from both.

use bigdecimal::BigDecimal;

use crate::types::{Property, Reservation, Statement, StatementLine};
use crate::utils::rounding::round_money;

/// VAT rate applied to cleaning fees of externally owned properties.
pub fn cleaning_fee_vat_rate() -> BigDecimal {
    BigDecimal::from(23) / BigDecimal::from(100)
}

/// Compute an owner statement for a set of reservations.
///
/// Totals reconcile exactly: `total_to_pay + total_to_invoice` equals the
/// total received amount for every statement.
pub fn compute_statement(
    reservations: &[Reservation],
    commission_rate: &BigDecimal,
    is_admin_owned: bool,
) -> Statement {
    let vat_rate = cleaning_fee_vat_rate();
    let mut lines = Vec::with_capacity(reservations.len());

    let mut total_received = BigDecimal::from(0);
    let mut total_management_commission = BigDecimal::from(0);
    let mut total_cleaning_fees = BigDecimal::from(0);
    let mut total_cleaning_fees_invoiced = BigDecimal::from(0);

    for reservation in reservations {
        let received = reservation.total_price.clone();
        let host_commission = reservation.host_commission.clone();
        let cleaning_fee = reservation.cleaning_fee.clone();

        let commissionable = {
            let base = &received + &host_commission - &cleaning_fee;
            if base < BigDecimal::from(0) {
                BigDecimal::from(0)
            } else {
                base
            }
        };
        let management_commission = if is_admin_owned {
            BigDecimal::from(0)
        } else {
            round_money(&(commission_rate * &commissionable))
        };
        let cleaning_fee_invoiced = if is_admin_owned {
            cleaning_fee.clone()
        } else {
            round_money(&(&cleaning_fee + &cleaning_fee * &vat_rate))
        };

        total_received += &received;
        total_management_commission += &management_commission;
        total_cleaning_fees += &cleaning_fee;
        total_cleaning_fees_invoiced += &cleaning_fee_invoiced;

        lines.push(StatementLine {
            reservation_id: reservation.id.clone(),
            guest_name: reservation.guest_name.clone(),
            received_amount: received,
            host_commission,
            cleaning_fee,
            commissionable_amount: commissionable,
            management_commission,
        });
    }

    let total_received = round_money(&total_received);
    let total_to_invoice =
        round_money(&(&total_management_commission + &total_cleaning_fees_invoiced));
    // Derived by subtraction so the reconciliation invariant holds exactly.
    let total_to_pay = &total_received - &total_to_invoice;

    Statement {
        lines,
        commission_rate: commission_rate.clone(),
        is_admin_owned,
        total_received,
        total_management_commission: round_money(&total_management_commission),
        total_cleaning_fees: round_money(&total_cleaning_fees),
        total_cleaning_fees_invoiced: round_money(&total_cleaning_fees_invoiced),
        total_to_invoice,
        total_to_pay,
    }
}

/// Compute a statement using a property's own commission rate and ownership
/// flag.
pub fn compute_statement_for_property(
    reservations: &[Reservation],
    property: &Property,
) -> Statement {
    compute_statement(reservations, &property.commission_rate, property.admin_owned)
}
