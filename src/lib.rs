//! Single-chair barbershop booking: a REST API over SQLite, server-rendered
//! booking and admin pages, and the client components both sides share.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod schedule;
pub mod state;
pub mod store;
pub mod templates;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;
