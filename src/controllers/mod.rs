pub mod attendance;
pub mod auth;
pub mod classes;
pub mod dashboard;
pub mod fee_types;
pub mod fees;
pub mod health;
pub mod leaves;
pub mod notifications;
pub mod periods;
pub mod reports;
pub mod students;
pub mod tasks;
pub mod teachers;
pub mod timetable;
