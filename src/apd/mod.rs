// src/apd/mod.rs
pub mod client;
pub mod form;
pub mod models;

pub use client::{ApdClient, ClientConfig};
