#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    EssayRepository, GoalRepository, InMemoryRepository, PlanRepository, SessionRepository,
    Storage, StorageError,
};
