use chrono::NaiveTime;
use serde::Deserialize;

use crate::entities::{period, prelude::Period};
use crate::impl_crud_api;

/// 時限のリクエスト
#[derive(Deserialize)]
pub struct PeriodForm {
    pub period_number: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl From<PeriodForm> for period::ActiveModel {
    fn from(form: PeriodForm) -> Self {
        period::ActiveModel {
            period_number: Set(form.period_number),
            start_time: Set(form.start_time),
            end_time: Set(form.end_time),
            ..Default::default()
        }
    }
}

// 時限は素直なCRUDだけなのでマクロで生成する。
// 時限番号の重複は一意制約違反として409になる。
impl_crud_api! {
    entity: Period,
    model: period::Model,
    active_model: period::ActiveModel,
    form: PeriodForm,
    order_by: period::Column::PeriodNumber
}
