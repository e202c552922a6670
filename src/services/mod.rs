pub mod bills;
pub mod bpay;
pub mod engine;
pub mod ledger;
pub mod notify;
pub mod schedule;
pub mod seed;

pub use engine::{ExecutionReport, ScheduleEngine};
pub use schedule::{NewScheduleEntry, ScheduleConfig};
