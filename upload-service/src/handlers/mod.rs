pub mod health;
pub mod uploads;

pub use health::{health_check, metrics, readiness_check};
pub use uploads::upload_file;
