//! # Warchest Valuation Crate
//!
//! This crate turns raw exchange data into a valued wallet. It defines the
//! `ValuationEngine`, which runs every supported coin through a fixed pipeline
//! (transactions, cost, rates, profit), and the `WalletSession`, which owns the single
//! shared wallet and decides whether a refresh discovers or re-prices it.
//!
//! ## Architectural Principles
//!
//! - **Silent Degradation:** A failing exchange call never aborts a refresh. The affected
//!   data is reset to its neutral value (no transactions, zero rates) and the failure is
//!   reported back as a `StepOutcome::Degraded` and logged. Only the account listing
//!   during discovery can fail a refresh.
//! - **Client Abstraction:** The engine only sees the `ExchangeClient` trait, so the same
//!   pipeline runs against Coinbase or an in-memory fake.
//!
//! ## Public API
//!
//! - `ValuationEngine`: The per-coin pipeline and wallet-wide refresh.
//! - `WalletSession`: The lock-guarded, lazily discovered wallet.
//! - `StepOutcome` / `CoinUpdate`: What happened during a coin update.
//! - `ValuationError`: The specific error types that can be returned from this crate.

pub mod engine;
pub mod error;
pub mod session;

pub use engine::{CoinUpdate, StepOutcome, ValuationEngine};
pub use error::ValuationError;
pub use session::{SessionState, WalletSession};
