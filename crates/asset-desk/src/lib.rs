//! Asset request, approval, and issuance workflow for internal inventory tracking.
//!
//! Employees request assets from the catalogue; each request is routed through a fixed chain of
//! approval gates (team lead, then IT) resolved from the org chart at creation time, and the
//! final approval issues the asset and decrements stock in the same transaction.

pub mod config;
pub mod error;
mod http;
pub mod inventory;
pub mod organization;
pub mod store;
pub mod telemetry;
pub mod workflows;
