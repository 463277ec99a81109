//! Booru backend over a local Hydrus client database.
//!
//! A Hydrus database is split across four SQLite files in one directory:
//! the file index (`client.db`), tag mappings, master hash/tag/namespace
//! tables, and a tag text cache. All four are attached to every connection
//! so one statement can join across them, and each query runs in a single
//! read transaction so those joins see one consistent state.
//!
//! Media lives next to the databases in `client_files`, sharded by the first
//! two hex characters of each file's hash.

mod booru;
mod db;
pub mod error;
mod file;
mod mime;
mod tags;

pub use crate::booru::HydrusBooru;
