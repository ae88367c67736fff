//! Cross-property portfolio rollups: per-month performance, occupancy, and
//! first-to-last growth trends

use std::sync::Arc;

use bigdecimal::{BigDecimal, ToPrimitive};
use futures::future::join_all;
use tracing::warn;

use crate::reconciliation::ReservationReconciler;
use crate::statement::compute_statement_for_property;
use crate::traits::{PropertyCatalog, ProviderSet};
use crate::types::*;
use crate::utils::rounding::{round1, round_money};

/// Rolls reservation and statement data up across properties and months.
pub struct PortfolioAggregator {
    reconciler: ReservationReconciler,
    catalog: Arc<dyn PropertyCatalog>,
}

impl PortfolioAggregator {
    pub fn new(providers: ProviderSet, catalog: Arc<dyn PropertyCatalog>) -> Self {
        Self {
            reconciler: ReservationReconciler::new(providers, catalog.clone()),
            catalog,
        }
    }

    /// Portfolio overview for one month.
    ///
    /// Properties are computed in independent tasks; a failed fetch yields a
    /// zeroed row tagged [`FetchStatus::Error`] instead of aborting the
    /// overview. Totals sum every row (error rows contribute zero); the
    /// occupancy and ADR averages cover non-error rows only.
    pub async fn overview(&self, property_ids: &[String], month: Month) -> PortfolioOverview {
        let snapshots = join_all(
            property_ids
                .iter()
                .map(|property_id| self.snapshot(property_id, month)),
        )
        .await;

        let mut totals = PortfolioTotals::default();
        let mut occupancy_sum = 0.0;
        let mut adr_sum = BigDecimal::from(0);
        let mut ok_rows = 0usize;

        for snapshot in &snapshots {
            totals.booking_count += snapshot.booking_count;
            totals.total_nights += snapshot.total_nights;
            totals.gross_revenue += &snapshot.gross_revenue;
            totals.commission += &snapshot.commission;
            totals.cleaning_fees += &snapshot.cleaning_fees;
            totals.tourist_tax += &snapshot.tourist_tax;
            totals.net_payout += &snapshot.net_payout;

            if snapshot.status == FetchStatus::Ok {
                ok_rows += 1;
                occupancy_sum += snapshot.occupancy_rate;
                adr_sum += &snapshot.adr;
            }
        }

        let (average_occupancy, average_adr) = if ok_rows > 0 {
            (
                round1(occupancy_sum / ok_rows as f64),
                round_money(&(adr_sum / BigDecimal::from(ok_rows as u64))),
            )
        } else {
            (0.0, BigDecimal::from(0))
        };

        PortfolioOverview {
            month,
            properties: snapshots,
            totals,
            average_occupancy,
            average_adr,
        }
    }

    /// Overview per month plus first-to-last growth percentages.
    ///
    /// Growth is relative and zero-guarded: `None` when fewer than two
    /// months were requested or the base month's figure is zero.
    pub async fn trends(&self, property_ids: &[String], months: &[Month]) -> PortfolioTrends {
        let mut overviews = Vec::with_capacity(months.len());
        for month in months {
            overviews.push(self.overview(property_ids, *month).await);
        }

        let (revenue_growth_pct, occupancy_growth_pct) = match (overviews.first(), overviews.last())
        {
            (Some(first), Some(last)) if overviews.len() >= 2 => {
                let first_revenue = first.totals.gross_revenue.to_f64().unwrap_or(0.0);
                let last_revenue = last.totals.gross_revenue.to_f64().unwrap_or(0.0);
                let revenue = if first_revenue > 0.0 {
                    Some(round1((last_revenue - first_revenue) / first_revenue * 100.0))
                } else {
                    None
                };
                let occupancy = if first.average_occupancy > 0.0 {
                    Some(round1(
                        (last.average_occupancy - first.average_occupancy)
                            / first.average_occupancy
                            * 100.0,
                    ))
                } else {
                    None
                };
                (revenue, occupancy)
            }
            _ => (None, None),
        };

        PortfolioTrends {
            months: overviews,
            revenue_growth_pct,
            occupancy_growth_pct,
        }
    }

    async fn snapshot(&self, property_id: &str, month: Month) -> PropertySnapshot {
        let property = match self.catalog.get_property(property_id).await {
            Ok(Some(property)) => property,
            Ok(None) => {
                warn!(property_id, "Property not in catalog");
                return error_snapshot(property_id, property_id, month);
            }
            Err(err) => {
                warn!(property_id, error = %err, "Catalog lookup failed");
                return error_snapshot(property_id, property_id, month);
            }
        };

        let set = self
            .reconciler
            .reconcile(property_id, month.first_day(), month.last_day())
            .await;
        if set.status == FetchStatus::Error {
            return error_snapshot(property_id, &property.name, month);
        }

        // Enquiries and cancellations carry no revenue or occupied nights.
        let reportable: Vec<Reservation> = set
            .reservations
            .into_iter()
            .filter(|reservation| reservation.booking_status.is_reportable())
            .collect();

        let statement = compute_statement_for_property(&reportable, &property);
        let total_nights: u32 = reportable.iter().map(|r| r.nights).sum();
        let tourist_tax = round_money(
            &reportable
                .iter()
                .map(|r| r.tourist_tax.clone())
                .sum::<BigDecimal>(),
        );

        let occupancy_rate = round1(total_nights as f64 / month.days() as f64 * 100.0);
        let adr = if total_nights > 0 {
            round_money(&(&statement.total_received / BigDecimal::from(total_nights)))
        } else {
            BigDecimal::from(0)
        };

        PropertySnapshot {
            property_id: property_id.to_string(),
            property_name: property.name.clone(),
            month,
            status: FetchStatus::Ok,
            booking_count: reportable.len(),
            total_nights,
            occupancy_rate,
            adr,
            gross_revenue: statement.total_received.clone(),
            commission: statement.total_management_commission.clone(),
            cleaning_fees: statement.total_cleaning_fees.clone(),
            tourist_tax,
            net_payout: statement.total_to_pay,
        }
    }
}

fn error_snapshot(property_id: &str, property_name: &str, month: Month) -> PropertySnapshot {
    PropertySnapshot {
        property_id: property_id.to_string(),
        property_name: property_name.to_string(),
        month,
        status: FetchStatus::Error,
        booking_count: 0,
        total_nights: 0,
        occupancy_rate: 0.0,
        adr: BigDecimal::from(0),
        gross_revenue: BigDecimal::from(0),
        commission: BigDecimal::from(0),
        cleaning_fees: BigDecimal::from(0),
        tourist_tax: BigDecimal::from(0),
        net_payout: BigDecimal::from(0),
    }
}
