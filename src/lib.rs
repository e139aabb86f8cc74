//! Booknest: booking wizard sessions and provider search behind a small
//! actix-web API. The booking backend itself is reached over HTTP.

pub mod api;
pub mod auth;
pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod search;
pub mod state;
pub mod templates;

#[cfg(test)]
mod testing;
