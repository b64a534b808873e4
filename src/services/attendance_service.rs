use sea_orm::*;
use crate::entities::{attendance, prelude::*};
use crate::errors::AppError;

/// 出席率 (%) を計算する。present または late を出席とみなす。
/// 記録が一件もない場合は100を返す (データが揃うまでは皆勤とみなす方針。
/// 0ではないことに注意)。
pub fn rate(present_or_late: u64, total: u64) -> f64 {
    if total == 0 {
        100.0
    } else {
        present_or_late as f64 * 100.0 / total as f64
    }
}

/// 出欠関連の集計サービス。
pub struct AttendanceService;

impl AttendanceService {
    /// 生徒一人の出席率を計算する。
    pub async fn attendance_rate(db: &DatabaseConnection, student_id: i32) -> Result<f64, AppError> {
        let total = Attendance::find()
            .filter(attendance::Column::StudentId.eq(student_id))
            .count(db)
            .await?;

        let present_or_late = Attendance::find()
            .filter(attendance::Column::StudentId.eq(student_id))
            .filter(attendance::Column::Status.is_in([
                attendance::Status::Present,
                attendance::Status::Late,
            ]))
            .count(db)
            .await?;

        Ok(rate(present_or_late, total))
    }
}
