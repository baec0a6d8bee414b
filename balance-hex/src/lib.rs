//! # Balance Hex
//!
//! Application service layer and HTTP adapter for the balance service.
//!
//! ## Architecture
//!
//! - `service` - Application service (orchestrates deposits and the ledger)
//! - `locks` - Per-account mutual exclusion used by the service
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over `R: BalanceRepository` and
//! `X: ExchangeRateProvider`, allowing different adapters to be injected.

pub mod inbound;
pub mod locks;
pub mod service;


pub use service::{BalanceService, DEFAULT_OPERATION_TIMEOUT, ServiceConfig};
