//! Fitlog - A personal fitness-tracking backend
//!
//! Users log workouts made of per-exercise entries against a shared
//! exercise catalog and read back aggregate statistics, all over a JSON
//! REST API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
