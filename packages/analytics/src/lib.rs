#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Descriptive accessibility statistics over the cleaned tables.
//!
//! Two families of analysis: administrative aggregation (facilities per
//! district and per department, via the UBIGEO equality join) and
//! metric proximity (facilities within 10 km of each population
//! center). Everything here is pure computation over in-memory tables;
//! all I/O happens upstream.

pub mod counts;
pub mod proximity;
