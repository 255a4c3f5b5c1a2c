pub mod database;
pub mod metrics;
pub mod storage;

pub use database::{FileRepository, MongoDb};
pub use self::metrics::{get_metrics, init_metrics};
pub use storage::{LocalStorage, Storage, StoredFile};
