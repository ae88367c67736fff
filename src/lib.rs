//! # Lettings Core
//!
//! The reservation reconciliation and compliance/financial calculation engine
//! behind a short-term rental property-management dashboard.
//!
//! ## Features
//!
//! - **Status normalization**: total mapping of heterogeneous upstream
//!   booking/payment vocabularies onto one canonical enum set
//! - **Reservation reconciliation**: merge, filter, and enrich raw upstream
//!   reservations into a canonical model with summary statistics and
//!   data-quality reporting
//! - **Regulatory compliance**: per-property submission state, payload
//!   validation with fuzzy reservation matching, and a send workflow that
//!   falls back to local recording when the regulatory channel is down
//! - **Owner statements**: commission and VAT calculations with admin-owned
//!   exemptions and exact to-the-cent reconciliation
//! - **Portfolio rollups**: occupancy, ADR, revenue, and compliance metrics
//!   across properties and months, degrading per property on upstream failure
//! - **Storage abstraction**: upstream providers, the property catalog, and
//!   the local submission store are all injected trait objects
//!
//! ## Quick Start
//!
//! ```rust
//! use lettings_core::{ProviderSet, ReservationReconciler};
//! use lettings_core::utils::{MemoryCatalog, MemoryProvider};
//! use std::sync::Arc;
//!
//! let provider = Arc::new(MemoryProvider::new());
//! let providers = ProviderSet::new(provider.clone(), provider);
//! let reconciler = ReservationReconciler::new(providers, Arc::new(MemoryCatalog::new()));
//! ```

pub mod compliance;
pub mod portfolio;
pub mod reconciliation;
pub mod statement;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use compliance::*;
pub use portfolio::*;
pub use reconciliation::*;
pub use statement::*;
pub use traits::*;
pub use types::*;
