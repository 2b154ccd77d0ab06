//! Business logic services.
//!
//! Services hold the workflow rules and the multi-statement database work;
//! handlers stay thin.

pub mod appointment_service;
pub mod history_service;
pub mod ticket_service;
