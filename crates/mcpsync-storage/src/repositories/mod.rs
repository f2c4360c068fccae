//! SQLite repository implementations.

mod server_record_repository;

pub use server_record_repository::SqliteServerRecordRepository;
