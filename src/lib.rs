//! The Meridian - a multi-source news backend
//!
//! This crate serves stories assembled from several news sources, each
//! story carrying a neutral summary, key facts and per-source framing.
//! Data lives in SQLite and is exposed through a small JSON API.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
