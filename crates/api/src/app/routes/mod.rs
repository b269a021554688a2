pub mod auth;
pub mod employees;
pub mod reimbursements;
pub mod system;
