// src/lib.rs
pub mod config;
pub mod constituents;
pub mod download;
pub mod metadata;
pub mod secapi;
pub mod storage;
pub mod utils;

pub use utils::AppError;
