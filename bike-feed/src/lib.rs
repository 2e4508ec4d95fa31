//! Bike-share station feed normalizer.
//!
//! Fetches the public bike-share availability feed, turns whatever shape
//! it arrives in into a uniform station table, and serves that table with
//! a few dashboard metrics over a small JSON API.

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod feed;
pub mod web;
