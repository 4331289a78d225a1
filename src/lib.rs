//! Synchronizes webtoon episode images with their database records.
//!
//! Lists the files under a folder in a Supabase Storage bucket, sorts them
//! by name, creates or reuses the matching episode row, and replaces the
//! episode's image rows with freshly computed public URLs.

pub mod app;
pub mod db;
pub mod error;
pub mod models;
pub mod storage;

pub use error::{Error, Result};
