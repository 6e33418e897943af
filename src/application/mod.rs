//! Application layer containing the balance mutation protocol.
//!
//! This module defines the `BalanceGuard`, the single entry point through
//! which wallet balances change, and the `RetryPolicy` that bounds how long it
//! fights over a contended wallet.

pub mod guard;
pub mod retry;
