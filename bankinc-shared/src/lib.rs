#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(clippy::pedantic)]

//! Client-side building blocks for the BankInc card and transaction API.
//!
//! The external service owns every piece of banking logic. This crate only
//! keeps a small session (username, bearer token, active card), maps user
//! actions onto HTTP requests and records every outcome in an activity log.

pub mod action;
pub mod activity;
pub mod client;
pub mod config;
pub mod models;
pub mod session;
pub mod transport;
