pub mod record_store;
pub mod library;
