//! Email dispatch service: accepts send requests over HTTP, stores them and
//! delivers them through SMTP from a single background worker with bounded
//! retries.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;
