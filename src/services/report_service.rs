use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use log::info;
use rust_decimal::Decimal;
use sea_orm::*;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::entities::{
    assignment, attendance, fee, grade, leave_request, prelude::*, student, task, user,
};
use crate::errors::AppError;
use crate::services::attendance_service;

/// 生成できるレポートのカテゴリ。summary は常に含まれる。
pub const CATEGORIES: [&str; 4] = ["academic", "financial", "attendance", "performance"];

/// レポートの出力フォーマット。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
    Html,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "html" => Some(Self::Html),
            _ => None,
        }
    }
}

/// ある時点のレポート全体。
/// ファイルシステムのレイアウトから切り離された純粋なデータで、
/// ディレクトリツリーはシリアライズ先のひとつに過ぎない。
#[derive(Debug, Serialize)]
pub struct ReportDocument {
    pub report_type: String,
    pub generated_at: DateTime<Utc>,
    pub categories: Vec<ReportCategory>,
}

#[derive(Debug, Serialize)]
pub struct ReportCategory {
    pub name: String,
    pub sections: Vec<ReportSection>,
}

#[derive(Debug, Serialize)]
pub struct ReportSection {
    pub name: String,
    pub data: Value,
}

/// レポート生成サービス。
/// Djangoの `generate_reports` 管理コマンドに相当する集計を、
/// 「DBの集計 → ReportDocument → 出力先」の二段構成で行う。
pub struct ReportService;

impl ReportService {
    /// 指定カテゴリ (または all) のレポートを組み立てる。
    /// 毎回ゼロから再計算する。差分更新はない。
    pub async fn build(db: &DatabaseConnection, report_type: &str) -> Result<ReportDocument, AppError> {
        if report_type != "all" && !CATEGORIES.contains(&report_type) {
            return Err(AppError::BadRequest(format!(
                "不明なレポート種別です: {}",
                report_type
            )));
        }

        let mut categories = Vec::new();
        if report_type == "all" || report_type == "academic" {
            categories.push(Self::academic(db).await?);
        }
        if report_type == "all" || report_type == "financial" {
            categories.push(Self::financial(db).await?);
        }
        if report_type == "all" || report_type == "attendance" {
            categories.push(Self::attendance(db).await?);
        }
        if report_type == "all" || report_type == "performance" {
            categories.push(Self::performance(db).await?);
        }
        // summary は常に含める
        categories.push(Self::summary(db).await?);

        Ok(ReportDocument {
            report_type: report_type.to_string(),
            generated_at: Utc::now(),
            categories,
        })
    }

    /// 学籍レポート: 在籍一覧、クラス別人数、教師の担当数、科目の割当数。
    pub async fn academic(db: &DatabaseConnection) -> Result<ReportCategory, AppError> {
        let students = Student::find().find_also_related(User).all(db).await?;
        let teachers = Teacher::find().find_also_related(User).all(db).await?;
        let classes = SchoolClass::find().all(db).await?;
        let entries = Timetable::find().all(db).await?;

        let class_names: HashMap<i32, String> =
            classes.iter().map(|c| (c.id, c.name.clone())).collect();

        let enrollment: Vec<Value> = students
            .iter()
            .map(|(s, u)| {
                json!({
                    "username": u.as_ref().map(|u| u.username.clone()),
                    "first_name": u.as_ref().map(|u| u.first_name.clone()),
                    "last_name": u.as_ref().map(|u| u.last_name.clone()),
                    "school_class": s.school_class_id.and_then(|id| class_names.get(&id).cloned()),
                })
            })
            .collect();

        let class_distribution: Vec<Value> = classes
            .iter()
            .map(|c| {
                let count = students
                    .iter()
                    .filter(|(s, _)| s.school_class_id == Some(c.id))
                    .count();
                json!({ "name": c.name, "student_count": count })
            })
            .collect();

        let teacher_workload: Vec<Value> = teachers
            .iter()
            .map(|(t, u)| {
                let class_count = classes
                    .iter()
                    .filter(|c| c.teacher_id == Some(t.user_id))
                    .count();
                json!({
                    "username": u.as_ref().map(|u| u.username.clone()),
                    "first_name": u.as_ref().map(|u| u.first_name.clone()),
                    "last_name": u.as_ref().map(|u| u.last_name.clone()),
                    "class_count": class_count,
                })
            })
            .collect();

        let mut subject_counts: HashMap<String, u64> = HashMap::new();
        for e in &entries {
            *subject_counts.entry(e.subject.clone()).or_insert(0) += 1;
        }
        let mut subject_distribution: Vec<(String, u64)> = subject_counts.into_iter().collect();
        subject_distribution.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let subject_distribution: Vec<Value> = subject_distribution
            .into_iter()
            .map(|(subject, count)| json!({ "subject": subject, "count": count }))
            .collect();

        Ok(ReportCategory {
            name: "academic".to_string(),
            sections: vec![
                section("student_enrollment", Value::Array(enrollment)),
                section("class_distribution", Value::Array(class_distribution)),
                section("teacher_workload", Value::Array(teacher_workload)),
                section("subject_distribution", Value::Array(subject_distribution)),
            ],
        })
    }

    /// 財務レポート: 徴収サマリー、ステータス内訳、月次推移、クラス別分析。
    pub async fn financial(db: &DatabaseConnection) -> Result<ReportCategory, AppError> {
        let fees = Fee::find().find_also_related(Student).all(db).await?;
        let classes = SchoolClass::find().all(db).await?;
        let class_names: HashMap<i32, String> =
            classes.iter().map(|c| (c.id, c.name.clone())).collect();

        let total_amount: Decimal = fees.iter().map(|(f, _)| f.amount).sum();
        let paid_amount: Decimal = fees
            .iter()
            .filter(|(f, _)| f.status == fee::Status::Paid)
            .map(|(f, _)| f.amount)
            .sum();
        let pending_amount = total_amount - paid_amount;

        let fee_summary = json!({
            "total_amount": total_amount,
            "paid_amount": paid_amount,
            "pending_amount": pending_amount,
        });

        let status_breakdown: Vec<Value> = [
            fee::Status::Paid,
            fee::Status::Unpaid,
            fee::Status::Partial,
        ]
        .iter()
        .map(|status| {
            let matching: Vec<&fee::Model> = fees
                .iter()
                .filter(|(f, _)| f.status == *status)
                .map(|(f, _)| f)
                .collect();
            let total: Decimal = matching.iter().map(|f| f.amount).sum();
            json!({
                "status": status,
                "count": matching.len(),
                "total_amount": total,
            })
        })
        .collect();

        // 月次推移 (過去12ヶ月、期日基準)
        let today = Utc::now().date_naive();
        let mut monthly_trend = Vec::new();
        for i in 0..12 {
            let (month_start, month_end) = month_window(today - Duration::days(30 * i));
            let collected: Decimal = fees
                .iter()
                .filter(|(f, _)| {
                    f.status == fee::Status::Paid
                        && f.due_date >= month_start
                        && f.due_date <= month_end
                })
                .map(|(f, _)| f.amount)
                .sum();
            let pending: Decimal = fees
                .iter()
                .filter(|(f, _)| {
                    f.status != fee::Status::Paid
                        && f.due_date >= month_start
                        && f.due_date <= month_end
                })
                .map(|(f, _)| f.amount)
                .sum();
            monthly_trend.push(json!({
                "month": month_start.format("%Y-%m").to_string(),
                "collected": collected,
                "pending": pending,
            }));
        }

        // クラス別の請求分析
        let mut per_class: HashMap<Option<i32>, (Decimal, Decimal, Decimal)> = HashMap::new();
        for (f, s) in &fees {
            let class_id = s.as_ref().and_then(|s| s.school_class_id);
            let entry = per_class
                .entry(class_id)
                .or_insert((Decimal::ZERO, Decimal::ZERO, Decimal::ZERO));
            entry.0 += f.amount;
            if f.status == fee::Status::Paid {
                entry.1 += f.amount;
            } else {
                entry.2 += f.amount;
            }
        }
        let mut class_fee_analysis: Vec<Value> = per_class
            .into_iter()
            .map(|(class_id, (total, paid, pending))| {
                json!({
                    "school_class": class_id.and_then(|id| class_names.get(&id).cloned()),
                    "total_fees": total,
                    "paid_fees": paid,
                    "pending_fees": pending,
                })
            })
            .collect();
        class_fee_analysis.sort_by(|a, b| {
            a["school_class"].to_string().cmp(&b["school_class"].to_string())
        });

        Ok(ReportCategory {
            name: "financial".to_string(),
            sections: vec![
                section("fee_summary", fee_summary),
                section("fee_status_breakdown", Value::Array(status_breakdown)),
                section("monthly_collection_trend", Value::Array(monthly_trend)),
                section("class_fee_analysis", Value::Array(class_fee_analysis)),
            ],
        })
    }

    /// 出欠レポート: 全体統計、生徒別、クラス別平均出席率、月次推移。
    pub async fn attendance(db: &DatabaseConnection) -> Result<ReportCategory, AppError> {
        let records = Attendance::find().all(db).await?;
        let students = Student::find().find_also_related(User).all(db).await?;
        let classes = SchoolClass::find().all(db).await?;
        let class_names: HashMap<i32, String> =
            classes.iter().map(|c| (c.id, c.name.clone())).collect();

        let count_by = |status: attendance::Status| -> usize {
            records.iter().filter(|r| r.status == status).count()
        };
        let statistics = json!({
            "total_records": records.len(),
            "present_count": count_by(attendance::Status::Present),
            "absent_count": count_by(attendance::Status::Absent),
            "late_count": count_by(attendance::Status::Late),
        });

        let student_attendance: Vec<Value> = students
            .iter()
            .map(|(s, u)| {
                let own: Vec<&attendance::Model> =
                    records.iter().filter(|r| r.student_id == s.user_id).collect();
                let present = own.iter().filter(|r| r.status == attendance::Status::Present).count();
                let absent = own.iter().filter(|r| r.status == attendance::Status::Absent).count();
                let late = own.iter().filter(|r| r.status == attendance::Status::Late).count();
                json!({
                    "username": u.as_ref().map(|u| u.username.clone()),
                    "school_class": s.school_class_id.and_then(|id| class_names.get(&id).cloned()),
                    "total_classes": own.len(),
                    "present_count": present,
                    "absent_count": absent,
                    "late_count": late,
                })
            })
            .collect();

        // クラス別の平均出席率 (生徒単位の出席率の平均)
        let class_attendance: Vec<Value> = classes
            .iter()
            .map(|c| {
                let members: Vec<&student::Model> = students
                    .iter()
                    .filter(|(s, _)| s.school_class_id == Some(c.id))
                    .map(|(s, _)| s)
                    .collect();
                let rates: Vec<f64> = members
                    .iter()
                    .map(|s| {
                        let own: Vec<&attendance::Model> =
                            records.iter().filter(|r| r.student_id == s.user_id).collect();
                        let present_or_late = own
                            .iter()
                            .filter(|r| r.status != attendance::Status::Absent)
                            .count();
                        attendance_service::rate(present_or_late as u64, own.len() as u64)
                    })
                    .collect();
                let avg = if rates.is_empty() {
                    None
                } else {
                    Some(rates.iter().sum::<f64>() / rates.len() as f64)
                };
                json!({
                    "name": c.name,
                    "total_students": members.len(),
                    "avg_attendance": avg,
                })
            })
            .collect();

        // 月次推移 (過去6ヶ月)
        let today = Utc::now().date_naive();
        let mut monthly_trend = Vec::new();
        for i in 0..6 {
            let (month_start, month_end) = month_window(today - Duration::days(30 * i));
            let in_month: Vec<&attendance::Model> = records
                .iter()
                .filter(|r| r.date >= month_start && r.date <= month_end)
                .collect();
            monthly_trend.push(json!({
                "month": month_start.format("%Y-%m").to_string(),
                "present": in_month.iter().filter(|r| r.status == attendance::Status::Present).count(),
                "absent": in_month.iter().filter(|r| r.status == attendance::Status::Absent).count(),
                "late": in_month.iter().filter(|r| r.status == attendance::Status::Late).count(),
            }));
        }

        Ok(ReportCategory {
            name: "attendance".to_string(),
            sections: vec![
                section("attendance_statistics", statistics),
                section("student_attendance", Value::Array(student_attendance)),
                section("class_attendance", Value::Array(class_attendance)),
                section("monthly_attendance_trend", Value::Array(monthly_trend)),
            ],
        })
    }

    /// 成績レポート: 分布、生徒別平均、課題別平均、上位10名。
    pub async fn performance(db: &DatabaseConnection) -> Result<ReportCategory, AppError> {
        let grades = Grade::find().all(db).await?;
        let assignments = Assignment::find().all(db).await?;
        let students = Student::find().find_also_related(User).all(db).await?;
        let classes = SchoolClass::find().all(db).await?;
        let class_names: HashMap<i32, String> =
            classes.iter().map(|c| (c.id, c.name.clone())).collect();

        let mut score_counts: HashMap<i32, u64> = HashMap::new();
        for g in &grades {
            *score_counts.entry(g.score).or_insert(0) += 1;
        }
        let mut grade_distribution: Vec<(i32, u64)> = score_counts.into_iter().collect();
        grade_distribution.sort_by_key(|(score, _)| *score);
        let grade_distribution: Vec<Value> = grade_distribution
            .into_iter()
            .map(|(score, count)| json!({ "score": score, "count": count }))
            .collect();

        let avg_for = |student_id: i32| -> Option<f64> {
            let own: Vec<&grade::Model> =
                grades.iter().filter(|g| g.student_id == student_id).collect();
            if own.is_empty() {
                None
            } else {
                Some(own.iter().map(|g| g.score as f64).sum::<f64>() / own.len() as f64)
            }
        };

        let student_performance: Vec<Value> = students
            .iter()
            .map(|(s, u)| {
                let total = grades.iter().filter(|g| g.student_id == s.user_id).count();
                json!({
                    "username": u.as_ref().map(|u| u.username.clone()),
                    "school_class": s.school_class_id.and_then(|id| class_names.get(&id).cloned()),
                    "avg_score": avg_for(s.user_id),
                    "total_assignments": total,
                })
            })
            .collect();

        let assignment_performance: Vec<Value> = assignments
            .iter()
            .map(|a| {
                let own: Vec<&grade::Model> =
                    grades.iter().filter(|g| g.assignment_id == a.id).collect();
                let avg = if own.is_empty() {
                    None
                } else {
                    Some(own.iter().map(|g| g.score as f64).sum::<f64>() / own.len() as f64)
                };
                json!({
                    "title": a.title,
                    "avg_score": avg,
                    "total_submissions": own.len(),
                })
            })
            .collect();

        let mut ranked: Vec<(&student::Model, &Option<user::Model>, f64)> = students
            .iter()
            .filter_map(|(s, u)| avg_for(s.user_id).map(|avg| (s, u, avg)))
            .collect();
        ranked.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal));
        let top_performers: Vec<Value> = ranked
            .into_iter()
            .take(10)
            .map(|(s, u, avg)| {
                json!({
                    "username": u.as_ref().map(|u| u.username.clone()),
                    "school_class": s.school_class_id.and_then(|id| class_names.get(&id).cloned()),
                    "avg_score": avg,
                })
            })
            .collect();

        Ok(ReportCategory {
            name: "performance".to_string(),
            sections: vec![
                section("grade_distribution", Value::Array(grade_distribution)),
                section("student_performance", Value::Array(student_performance)),
                section("assignment_performance", Value::Array(assignment_performance)),
                section("top_performers", Value::Array(top_performers)),
            ],
        })
    }

    /// 全体サマリー: エンティティ数、直近30日の活動、システムヘルス。
    pub async fn summary(db: &DatabaseConnection) -> Result<ReportCategory, AppError> {
        let overall = json!({
            "total_students": Student::find().count(db).await?,
            "total_teachers": Teacher::find().count(db).await?,
            "total_classes": SchoolClass::find().count(db).await?,
            "total_fees": Fee::find().count(db).await?,
            "total_paid_fees": Fee::find()
                .filter(fee::Column::Status.eq(fee::Status::Paid))
                .count(db)
                .await?,
            "total_pending_fees": Fee::find()
                .filter(fee::Column::Status.ne(fee::Status::Paid))
                .count(db)
                .await?,
            "total_attendance_records": Attendance::find().count(db).await?,
            "total_assignments": Assignment::find().count(db).await?,
            "total_grades": Grade::find().count(db).await?,
            "total_tasks": Task::find().count(db).await?,
            "pending_leaves": LeaveRequest::find()
                .filter(leave_request::Column::Status.eq(leave_request::Status::Pending))
                .count(db)
                .await?,
        });

        let cutoff_date = Utc::now().date_naive() - Duration::days(30);
        let cutoff_at = Utc::now().fixed_offset() - Duration::days(30);
        let recent_activity = json!({
            "new_fees": Fee::find()
                .filter(fee::Column::DueDate.gte(cutoff_date))
                .count(db)
                .await?,
            "new_assignments": Assignment::find()
                .filter(assignment::Column::DueDate.gte(cutoff_date))
                .count(db)
                .await?,
            "completed_tasks": Task::find()
                .filter(task::Column::Status.eq(task::Status::Completed))
                .filter(task::Column::CompletedAt.gte(cutoff_at))
                .count(db)
                .await?,
        });

        let system_health = json!({
            "database_status": "healthy",
            "active_users": User::find()
                .filter(user::Column::IsActive.eq(true))
                .count(db)
                .await?,
        });

        Ok(ReportCategory {
            name: "summary".to_string(),
            sections: vec![
                section("overall_statistics", overall),
                section("recent_activity", recent_activity),
                section("system_health", system_health),
            ],
        })
    }

    /// ReportDocument をタイムスタンプ付きディレクトリへ書き出す。
    /// 一時ディレクトリに書いてから成功時のみ最終名へリネームするので、
    /// 失敗した実行が不完全なレポートディレクトリを残すことはない。
    /// 書き上がったディレクトリは以後不変として扱う。
    pub fn write_to_dir(
        doc: &ReportDocument,
        base_dir: &Path,
        format: ReportFormat,
    ) -> Result<PathBuf, AppError> {
        let stamp = doc.generated_at.format("%Y%m%d_%H%M%S");
        let final_dir = base_dir.join(format!("report_{}", stamp));
        let tmp_dir = base_dir.join(format!("report_{}.tmp", stamp));

        match Self::write_tree(doc, &tmp_dir, format) {
            Ok(()) => {
                fs::rename(&tmp_dir, &final_dir)?;
                info!("report written to {}", final_dir.display());
                Ok(final_dir)
            }
            Err(e) => {
                let _ = fs::remove_dir_all(&tmp_dir);
                Err(e)
            }
        }
    }

    fn write_tree(doc: &ReportDocument, dir: &Path, format: ReportFormat) -> Result<(), AppError> {
        fs::create_dir_all(dir)?;

        for cat in &doc.categories {
            let sub = dir.join(&cat.name);
            fs::create_dir_all(&sub)?;
            let base = if cat.name == "summary" {
                "summary_report".to_string()
            } else {
                format!("{}_reports", cat.name)
            };

            match format {
                ReportFormat::Json => {
                    let mut map = Map::new();
                    for sec in &cat.sections {
                        map.insert(sec.name.clone(), sec.data.clone());
                    }
                    let body = serde_json::to_string_pretty(&Value::Object(map))
                        .map_err(|e| AppError::Internal(e.to_string()))?;
                    fs::write(sub.join(format!("{}.json", base)), body)?;
                }
                ReportFormat::Csv => {
                    // 表形式にできるセクション (オブジェクトの配列) のみCSV化する
                    for sec in &cat.sections {
                        if let Some(csv) = render_csv(&sec.data) {
                            fs::write(sub.join(format!("{}_{}.csv", base, sec.name)), csv)?;
                        }
                    }
                }
                ReportFormat::Html => {
                    let body = render_html(&cat.name, &cat.sections);
                    fs::write(sub.join(format!("{}.html", base)), body)?;
                }
            }
        }

        Self::write_metadata(doc, dir)?;
        Ok(())
    }

    fn write_metadata(doc: &ReportDocument, dir: &Path) -> Result<(), AppError> {
        let stamp = doc.generated_at.format("%Y%m%d_%H%M%S");
        let has = |name: &str| doc.categories.iter().any(|c| c.name == name);
        let metadata = json!({
            "report_id": format!("report_{}", stamp),
            "generated_at": doc.generated_at.to_rfc3339(),
            "report_type": doc.report_type,
            "version": "1.0",
            "generator": "School Management System",
            "includes": {
                "academic": has("academic"),
                "financial": has("financial"),
                "attendance": has("attendance"),
                "performance": has("performance"),
                "summary": true,
            },
        });
        let body = serde_json::to_string_pretty(&metadata)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        fs::write(dir.join("metadata.json"), body)?;

        let readme = format!(
            "School Management Report - {stamp}\n\n\
             Report Type: {rtype}\n\
             Generated: {generated}\n\n\
             Contents:\n\
             - metadata.json: Report metadata and information\n\
             - academic/: Academic reports (enrollment, classes, teachers, subjects)\n\
             - financial/: Financial reports (fees, payments, trends)\n\
             - attendance/: Attendance reports (statistics, trends, analysis)\n\
             - performance/: Performance reports (grades, rankings, analysis)\n\
             - summary/: Overall summary and system health\n\n\
             For detailed information, see metadata.json\n",
            stamp = stamp,
            rtype = doc.report_type,
            generated = doc.generated_at.format("%Y-%m-%d %H:%M:%S"),
        );
        fs::write(dir.join("README.txt"), readme)?;
        Ok(())
    }
}

fn section(name: &str, data: Value) -> ReportSection {
    ReportSection {
        name: name.to_string(),
        data,
    }
}

/// 基準日の属する月の (初日, 末日) を返す。
fn month_window(base: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = base.with_day(1).expect("day 1 is always valid");
    let end = (start + Duration::days(32))
        .with_day(1)
        .expect("day 1 is always valid")
        - Duration::days(1);
    (start, end)
}

/// オブジェクトの配列をCSVへ変換する。表形式でなければ None。
/// ヘッダは先頭行のキー順。
fn render_csv(data: &Value) -> Option<String> {
    let rows = data.as_array()?;
    let first = rows.first()?.as_object()?;
    let headers: Vec<String> = first.keys().cloned().collect();

    let mut out = headers.join(",");
    out.push('\n');
    for row in rows {
        let obj = row.as_object()?;
        let cells: Vec<String> = headers.iter().map(|h| csv_cell(obj.get(h))).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    Some(out)
}

fn csv_cell(value: Option<&Value>) -> String {
    let s = match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s
    }
}

/// カテゴリをHTMLレポートへ変換する。
fn render_html(category: &str, sections: &[ReportSection]) -> String {
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>School Management Report - {category}</title>\n\
         <style>\n\
         body {{ font-family: Arial, sans-serif; margin: 20px; }}\n\
         .section {{ margin-bottom: 30px; }}\n\
         .section h2 {{ color: #333; border-bottom: 2px solid #007bff; padding-bottom: 5px; }}\n\
         table {{ border-collapse: collapse; width: 100%; margin-top: 10px; }}\n\
         th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}\n\
         th {{ background-color: #f2f2f2; }}\n\
         </style>\n</head>\n<body>\n<h1>School Management Report</h1>\n",
        category = category
    );

    for sec in sections {
        html.push_str(&format!(
            "<div class='section'><h2>{}</h2>",
            sec.name.replace('_', " ")
        ));
        match &sec.data {
            Value::Array(rows) if !rows.is_empty() => {
                if let Some(first) = rows[0].as_object() {
                    let headers: Vec<&String> = first.keys().collect();
                    html.push_str("<table><thead><tr>");
                    for h in &headers {
                        html.push_str(&format!("<th>{}</th>", h.replace('_', " ")));
                    }
                    html.push_str("</tr></thead><tbody>");
                    for row in rows {
                        html.push_str("<tr>");
                        for h in &headers {
                            let cell = row.get(h.as_str()).cloned().unwrap_or(Value::Null);
                            html.push_str(&format!("<td>{}</td>", html_cell(&cell)));
                        }
                        html.push_str("</tr>");
                    }
                    html.push_str("</tbody></table>");
                }
            }
            Value::Object(map) => {
                html.push_str("<table><tbody>");
                for (key, value) in map {
                    html.push_str(&format!(
                        "<tr><td><strong>{}</strong></td><td>{}</td></tr>",
                        key.replace('_', " "),
                        html_cell(value)
                    ));
                }
                html.push_str("</tbody></table>");
            }
            other => {
                html.push_str(&format!("<p>{}</p>", html_cell(other)));
            }
        }
        html.push_str("</div>");
    }

    html.push_str("</body></html>");
    html
}

fn html_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format_from_str() {
        assert_eq!(ReportFormat::from_str("json"), Some(ReportFormat::Json));
        assert_eq!(ReportFormat::from_str("csv"), Some(ReportFormat::Csv));
        assert_eq!(ReportFormat::from_str("html"), Some(ReportFormat::Html));
        assert_eq!(ReportFormat::from_str("pdf"), None);
    }

    #[test]
    fn test_month_window() {
        let (start, end) = month_window(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());

        // 2月も正しく末日に丸まる
        let (start, end) = month_window(NaiveDate::from_ymd_opt(2023, 2, 3).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2023, 2, 28).unwrap());
    }

    #[test]
    fn test_render_csv_basic() {
        let data = json!([
            { "name": "Grade 1", "student_count": 3 },
            { "name": "Grade 2", "student_count": 5 },
        ]);
        let csv = render_csv(&data).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("name,student_count"));
        assert_eq!(lines.next(), Some("Grade 1,3"));
        assert_eq!(lines.next(), Some("Grade 2,5"));
    }

    #[test]
    fn test_render_csv_escapes_commas_and_quotes() {
        let data = json!([
            { "title": "Math, advanced", "note": "said \"ok\"" },
        ]);
        let csv = render_csv(&data).unwrap();
        assert!(csv.contains("\"Math, advanced\""));
        assert!(csv.contains("\"said \"\"ok\"\"\""));
    }

    #[test]
    fn test_render_csv_rejects_non_tabular() {
        assert!(render_csv(&json!({ "a": 1 })).is_none());
        assert!(render_csv(&json!([])).is_none());
    }

    #[test]
    fn test_render_html_contains_table() {
        let sections = vec![section(
            "class_distribution",
            json!([{ "name": "Grade 1", "student_count": 2 }]),
        )];
        let html = render_html("academic", &sections);
        assert!(html.contains("<h2>class distribution</h2>"));
        assert!(html.contains("<td>Grade 1</td>"));
        assert!(html.contains("<td>2</td>"));
    }
}
