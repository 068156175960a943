pub mod auth;
pub mod calendar;
pub mod config;
pub mod dom;
pub mod error;
pub mod fetch;
pub mod harness;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod reconcile;
pub mod resolve;
