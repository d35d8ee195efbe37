pub mod database;

pub use database::DatabaseArgs;
