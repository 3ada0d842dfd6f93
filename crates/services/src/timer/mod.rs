mod service;
mod ticker;

pub use service::TimerService;
pub use ticker::Ticker;
