//! Gateways that decode requests into guard calls and render the outcomes.

pub mod csv;
