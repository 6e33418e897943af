//! Wallet value types, the operation validator and the storage port.
//!
//! Nothing in here performs I/O; the `LedgerStore` trait is the only seam to
//! the outside world.

pub mod account;
pub mod operation;
pub mod ports;
pub mod validator;
