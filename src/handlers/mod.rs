//! HTTP request handlers.
//!
//! Handlers parse the request, apply ownership and role checks, and delegate
//! multi-step workflows to `crate::services`.

/// Accounts and sessions
pub mod accounts;
/// Appointment scheduling and presence
pub mod appointments;
/// Dashboard counters
pub mod dashboard;
/// Service health
pub mod health;
/// Visitor entries and exits
pub mod history;
/// Helpdesk tickets
pub mod tickets;
/// Visitor registration
pub mod visitors;
