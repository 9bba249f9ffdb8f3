//! # publish-gatekeeper
//!
//! Decides which saved content items go to the publish queue.
//!
//! Lock/unlock saves are dropped, workflow-state moves are queued without
//! cascading to clones, and every other save takes the standard path. The
//! host is reached through the traits in [`host`]; Postgres and in-memory
//! implementations ship in [`db`] and [`storage`].

pub mod classify;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod host;
pub mod model;
pub mod storage;
pub mod telemetry;
