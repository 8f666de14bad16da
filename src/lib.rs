//! Estágio audit daemon library
//!
//! Audit event pipeline for the internship management application: a
//! bounded in-memory log with sensitive-field masking, filtered queries,
//! retention sweeps, and a Unix socket front end for the web tier.

pub mod audit;
pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod protocol;
pub mod socket;
