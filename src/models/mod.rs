//! Data models representing database entities and API bodies.

/// Accounts (ONGs) and sessions
pub mod account;
/// Appointment scheduling
pub mod appointment;
/// Visitor entries and exits
pub mod history;
/// Helpdesk tickets
pub mod ticket;
/// Request validation helpers
pub mod validation;
/// Registered visitors
pub mod visitor;
