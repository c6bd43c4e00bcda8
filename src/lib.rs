//! Workforce attendance engine
//!
//! This crate records clock-in, clock-out and break punches from mobile and
//! kiosk devices, checks them against a per-employee state machine and the
//! shop geofences, reconstructs worked time from the punch stream and turns
//! it into gross-to-net payroll. An offline replay queue lets devices keep
//! punching through connectivity loss.

#![warn(missing_docs)]

pub mod api;
pub mod attendance;
pub mod calculation;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod offline;
pub mod reports;
pub mod security;
pub mod store;
