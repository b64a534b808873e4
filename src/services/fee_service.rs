use chrono::{NaiveDate, Utc};
use log::info;
use rust_decimal::Decimal;
use sea_orm::*;
use serde::Serialize;
use std::collections::HashMap;

use crate::entities::{fee, notification, prelude::*, student};
use crate::errors::AppError;

/// 料金関連のビジネスロジック。
/// Djangoの Manager / カスタムアクションに相当します。
pub struct FeeService;

/// `send_reminders` の実行結果。
#[derive(Debug, Serialize)]
pub struct ReminderOutcome {
    pub created: usize,
    pub skipped: usize,
}

/// クラス別の未回収額。
#[derive(Debug, Serialize)]
pub struct ClassOutstanding {
    /// 所属クラス名。クラス未所属の生徒の請求は null にまとまる。
    pub school_class: Option<String>,
    pub outstanding: Decimal,
    pub fee_count: u64,
}

/// `summary` の集計結果。partial は未回収側に含める。
#[derive(Debug, Serialize)]
pub struct FeesSummary {
    pub paid_count: u64,
    pub paid_total: Decimal,
    pub unpaid_count: u64,
    pub unpaid_total: Decimal,
    pub per_class: Vec<ClassOutstanding>,
}

impl FeeService {
    /// クラスの現在の全メンバーに一括で請求を作成する。
    /// 全件が単一トランザクション内で作成され、一件でも失敗すれば
    /// 何も残らない (途中まで請求された状態を作らない)。
    pub async fn create_class_fee(
        db: &DatabaseConnection,
        class_id: i32,
        amount: Decimal,
        due_date: NaiveDate,
    ) -> Result<Vec<fee::Model>, AppError> {
        // クラスの存在確認
        SchoolClass::find_by_id(class_id)
            .one(db)
            .await?
            .ok_or(AppError::NotFound)?;

        let students = Student::find()
            .filter(student::Column::SchoolClassId.eq(class_id))
            .all(db)
            .await?;

        // トランザクション開始。エラーで抜けた場合はドロップ時にロールバックされる。
        let txn = db.begin().await?;
        let mut created = Vec::with_capacity(students.len());
        for s in &students {
            let new_fee = fee::ActiveModel {
                student_id: Set(s.user_id),
                amount: Set(amount),
                due_date: Set(due_date),
                status: Set(fee::Status::Unpaid),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            created.push(new_fee);
        }
        txn.commit().await?;

        info!("created {} fees for class {}", created.len(), class_id);
        Ok(created)
    }

    /// 未払い (unpaid/partial) の請求ごとにリマインダー通知を作成する。
    /// 同じ請求に対する同日内の再送はスキップする (重複送信の抑止)。
    pub async fn send_reminders(db: &DatabaseConnection) -> Result<ReminderOutcome, AppError> {
        let now = Utc::now();
        let today_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc()
            .fixed_offset();

        let open_fees = Fee::find()
            .filter(fee::Column::Status.ne(fee::Status::Paid))
            .all(db)
            .await?;

        let mut created = 0;
        let mut skipped = 0;
        for f in &open_fees {
            // 本日分のリマインダーが既にあればスキップ
            let already_sent = Notification::find()
                .filter(notification::Column::FeeId.eq(f.id))
                .filter(notification::Column::CreatedAt.gte(today_start))
                .count(db)
                .await?
                > 0;
            if already_sent {
                skipped += 1;
                continue;
            }

            // Student の主キーはユーザーIDなので、通知の宛先にそのまま使える
            notification::ActiveModel {
                user_id: Set(f.student_id),
                title: Set("学費支払いのリマインダー".to_string()),
                message: Set(format!(
                    "{} 円の支払い期限は {} です。お支払いをお願いします。",
                    f.amount, f.due_date
                )),
                is_read: Set(false),
                fee_id: Set(Some(f.id)),
                created_at: Set(now.fixed_offset()),
                ..Default::default()
            }
            .insert(db)
            .await?;
            created += 1;
        }

        info!("fee reminders: {} created, {} skipped", created, skipped);
        Ok(ReminderOutcome { created, skipped })
    }

    /// 支払い済み/未回収の件数と合計、およびクラス別の未回収額内訳を集計する。
    pub async fn summary(db: &DatabaseConnection) -> Result<FeesSummary, AppError> {
        let fees = Fee::find().find_also_related(Student).all(db).await?;
        let class_names: HashMap<i32, String> = SchoolClass::find()
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        Ok(summarize(&fees, &class_names))
    }
}

/// 取得済みの請求一覧から集計を組み立てる純粋関数。
fn summarize(
    fees: &[(fee::Model, Option<student::Model>)],
    class_names: &HashMap<i32, String>,
) -> FeesSummary {
    let mut paid_count = 0;
    let mut paid_total = Decimal::ZERO;
    let mut unpaid_count = 0;
    let mut unpaid_total = Decimal::ZERO;
    // クラスID (未所属は None) → (未回収額, 件数)
    let mut per_class: HashMap<Option<i32>, (Decimal, u64)> = HashMap::new();

    for (f, student) in fees {
        if f.status == fee::Status::Paid {
            paid_count += 1;
            paid_total += f.amount;
        } else {
            unpaid_count += 1;
            unpaid_total += f.amount;

            let class_id = student.as_ref().and_then(|s| s.school_class_id);
            let entry = per_class.entry(class_id).or_insert((Decimal::ZERO, 0));
            entry.0 += f.amount;
            entry.1 += 1;
        }
    }

    let mut per_class: Vec<ClassOutstanding> = per_class
        .into_iter()
        .map(|(class_id, (outstanding, fee_count))| ClassOutstanding {
            school_class: class_id.and_then(|id| class_names.get(&id).cloned()),
            outstanding,
            fee_count,
        })
        .collect();
    // 未回収額の降順
    per_class.sort_by(|a, b| b.outstanding.cmp(&a.outstanding));

    FeesSummary {
        paid_count,
        paid_total,
        unpaid_count,
        unpaid_total,
        per_class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_fee(id: i32, student_id: i32, amount: i64, status: fee::Status) -> fee::Model {
        fee::Model {
            id,
            student_id,
            amount: Decimal::from(amount),
            due_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            status,
        }
    }

    fn make_student(user_id: i32, class_id: Option<i32>) -> student::Model {
        student::Model {
            user_id,
            school_class_id: class_id,
        }
    }

    #[test]
    fn test_summary_counts_partial_as_unpaid() {
        let fees = vec![
            (make_fee(1, 1, 3000, fee::Status::Unpaid), Some(make_student(1, Some(10)))),
            (make_fee(2, 2, 1500, fee::Status::Partial), Some(make_student(2, Some(10)))),
        ];
        let mut names = HashMap::new();
        names.insert(10, "Grade 5".to_string());

        let summary = summarize(&fees, &names);
        assert_eq!(summary.paid_count, 0);
        assert_eq!(summary.paid_total, Decimal::ZERO);
        assert_eq!(summary.unpaid_count, 2);
        assert_eq!(summary.unpaid_total, Decimal::from(4500));
    }

    #[test]
    fn test_summary_per_class_sorted_descending() {
        let fees = vec![
            (make_fee(1, 1, 1000, fee::Status::Unpaid), Some(make_student(1, Some(10)))),
            (make_fee(2, 2, 5000, fee::Status::Unpaid), Some(make_student(2, Some(20)))),
            (make_fee(3, 3, 2000, fee::Status::Paid), Some(make_student(3, Some(10)))),
        ];
        let mut names = HashMap::new();
        names.insert(10, "Grade 1".to_string());
        names.insert(20, "Grade 2".to_string());

        let summary = summarize(&fees, &names);
        assert_eq!(summary.paid_count, 1);
        assert_eq!(summary.paid_total, Decimal::from(2000));
        assert_eq!(summary.per_class.len(), 2);
        // 未回収額の大きいクラスが先頭に来る
        assert_eq!(summary.per_class[0].school_class.as_deref(), Some("Grade 2"));
        assert_eq!(summary.per_class[0].outstanding, Decimal::from(5000));
        assert_eq!(summary.per_class[1].outstanding, Decimal::from(1000));
    }

    #[test]
    fn test_summary_unassigned_students_grouped_under_null() {
        let fees = vec![
            (make_fee(1, 1, 700, fee::Status::Unpaid), Some(make_student(1, None))),
        ];
        let summary = summarize(&fees, &HashMap::new());
        assert_eq!(summary.per_class.len(), 1);
        assert!(summary.per_class[0].school_class.is_none());
        assert_eq!(summary.per_class[0].fee_count, 1);
    }
}
