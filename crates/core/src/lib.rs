#![forbid(unsafe_code)]

pub mod duration;
pub mod history;
pub mod model;
pub mod progress;
pub mod time;
pub mod timer;

pub use time::{Clock, DayKey};
