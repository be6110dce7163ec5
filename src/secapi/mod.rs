// src/secapi/mod.rs
pub mod client;
pub mod models;

pub use client::{QueryApi, RenderApi};
