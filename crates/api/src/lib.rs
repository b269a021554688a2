//! `ers-api`: HTTP surface of the auth, directory and reimbursement services.
//!
//! One binary, one service per process (selected on the command line). All
//! three share the bearer-token middleware and error mapping.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
