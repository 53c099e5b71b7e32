//! Content-addressed file metadata and storage service.
//!
//! Uploaded files are fingerprinted (SHA-1 and MD5), classified by content
//! signature, recorded in a SQLite-backed metadata store, and mirrored into
//! an on-disk object store laid out as one directory per record id. The
//! digests are the identity mechanism: a second upload with bytes already
//! registered is rejected as a conflict.
//!
//! [`FileService`] is the entry point; a transport layer hands it a display
//! name plus a byte stream, a digest string, or a partial-field payload and
//! maps the resulting [`AppError`] to its own status codes.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use config::Config;
pub use db::Database;
pub use error::{AppError, Result};
pub use services::FileService;
