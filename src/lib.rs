//! Procurement Audit Engine
//!
//! Document intelligence pipeline for government procurement audit:
//! - Extracts structured data from scanned financial documents through a
//!   cascading set of extraction providers with graceful degradation
//! - Reconciles one contract against one-or-many invoices into a typed
//!   discrepancy report with severity and financial-impact classification
//! - Aggregates free-text vendor intelligence into fixed risk schemas with
//!   banded scoring
//!
//! PIPELINE:
//! DOCUMENT → EXTRACT (cost-ordered fallback) → RECORD → RECONCILE → REPORT

pub mod advisory;
pub mod api;
pub mod error;
pub mod extraction;
pub mod gemini;
pub mod intelligence;
pub mod models;
pub mod structured;
pub mod validation;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use structured::{GenerativeModel, StructuredClient};
