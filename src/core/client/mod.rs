pub mod database;
pub mod dispatch;

pub use database::{MongoDbClient, RecordRepository};
pub use dispatch::{DispatchOutcome, RetryDispatcher};
