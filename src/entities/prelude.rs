//! エンティティの `Entity` 型をDjangoのモデル名風に再エクスポートする。

pub use super::assignment::Entity as Assignment;
pub use super::attendance::Entity as Attendance;
pub use super::fee::Entity as Fee;
pub use super::fee_type::Entity as FeeType;
pub use super::grade::Entity as Grade;
pub use super::leave_request::Entity as LeaveRequest;
pub use super::notification::Entity as Notification;
pub use super::period::Entity as Period;
pub use super::school::Entity as School;
pub use super::school_class::Entity as SchoolClass;
pub use super::student::Entity as Student;
pub use super::task::Entity as Task;
pub use super::teacher::Entity as Teacher;
pub use super::timetable::Entity as Timetable;
pub use super::token_blacklist::Entity as TokenBlacklist;
pub use super::user::Entity as User;
pub use super::user_profile::Entity as UserProfile;
