// Library root - exports for the binaries and tests

pub mod background;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{PaymentError, Result, StoreError};
pub use services::{ExecutionReport, ScheduleEngine};
