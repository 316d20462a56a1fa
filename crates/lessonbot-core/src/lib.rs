pub mod config;
pub mod error;
pub mod models;

pub use config::{Overrides, Settings};
pub use error::AppError;
pub use models::{Browser, LoginMethod};
