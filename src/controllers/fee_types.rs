use rust_decimal::Decimal;
use serde::Deserialize;

use crate::entities::{fee_type, prelude::FeeType};
use crate::impl_crud_api;

/// 料金区分のリクエスト
#[derive(Deserialize)]
pub struct FeeTypeForm {
    pub name: String,
    pub category: String,
    pub amount: Decimal,
}

impl From<FeeTypeForm> for fee_type::ActiveModel {
    fn from(form: FeeTypeForm) -> Self {
        fee_type::ActiveModel {
            name: Set(form.name),
            category: Set(form.category),
            amount: Set(form.amount),
            ..Default::default()
        }
    }
}

// 料金区分も素直なCRUDのみ。名前の重複は409になる。
impl_crud_api! {
    entity: FeeType,
    model: fee_type::Model,
    active_model: fee_type::ActiveModel,
    form: FeeTypeForm,
    order_by: fee_type::Column::Name
}
