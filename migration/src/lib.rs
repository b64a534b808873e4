pub use sea_orm_migration::prelude::*;

mod m20250401_000001_create_user_table;
mod m20250401_000002_create_user_profile_table;
mod m20250402_000001_create_school_tables;
mod m20250403_000001_create_period_timetable_tables;
mod m20250404_000001_create_attendance_table;
mod m20250405_000001_create_finance_tables;
mod m20250406_000001_create_academic_tables;
mod m20250407_000001_create_leave_notification_tables;
mod m20250408_000001_create_task_table;
mod m20250501_000001_create_token_blacklist_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250401_000001_create_user_table::Migration),
            Box::new(m20250401_000002_create_user_profile_table::Migration),
            Box::new(m20250402_000001_create_school_tables::Migration),
            Box::new(m20250403_000001_create_period_timetable_tables::Migration),
            Box::new(m20250404_000001_create_attendance_table::Migration),
            Box::new(m20250405_000001_create_finance_tables::Migration),
            Box::new(m20250406_000001_create_academic_tables::Migration),
            Box::new(m20250407_000001_create_leave_notification_tables::Migration),
            Box::new(m20250408_000001_create_task_table::Migration),
            Box::new(m20250501_000001_create_token_blacklist_table::Migration),
        ]
    }
}
