//! End-to-end tests at the HTTP request/response level.
//!
//! Each test file covers one scenario, driving a gated axum router with
//! deterministic tokens and checking the status and body that come back.

#![cfg(test)]

mod helpers;

mod test_gate_pass;
mod test_gate_reject;
mod test_rejection_responders;
mod test_schema_file;
