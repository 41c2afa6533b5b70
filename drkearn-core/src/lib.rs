// src/lib.rs

pub mod db;
pub mod repositories;
pub mod platforms;
pub mod services;
pub mod tasks;
pub mod utils;

pub use db::Database;
pub use drkearn_common::error::Error;
