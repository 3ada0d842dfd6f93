#![forbid(unsafe_code)]

pub mod app_services;
pub mod dashboard;
pub mod error;
pub mod essay_service;
pub mod goal_service;
pub mod plan_service;
pub mod session_log;
pub mod timer;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use dashboard::DashboardService;
pub use error::{
    AppServicesError, DashboardError, EssayServiceError, GoalServiceError, PlanServiceError,
    SessionLogError, TimerServiceError,
};
pub use essay_service::EssayService;
pub use goal_service::GoalService;
pub use plan_service::PlanService;
pub use session_log::SessionLogService;
pub use timer::{Ticker, TimerService};
