use validator::{Validate, ValidationError};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Djangoのusernameバリデーション正規表現
    /// 半角英数字、@/./+/-/_ のみ許可
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();
}

/// ユーザー作成/編集リクエストのバリデーション。
/// Djangoの `forms.ModelForm` + `clean_*` メソッドに相当。
#[derive(Debug, Validate)]
pub struct UserFormValidation {
    #[validate(
        length(min = 1, max = 150, message = "ユーザー名は1〜150文字の間で入力してください"),
        custom(function = "validate_username_chars", message = "ユーザー名には半角英数字、@/./+/-/_ のみ使用できます")
    )]
    pub username: String,

    #[validate(length(min = 8, message = "パスワードは8文字以上で入力してください"))]
    pub password: Option<String>,

    #[validate(email(message = "メールアドレスの形式が正しくありません"))]
    pub email: Option<String>,
}

/// ユーザー名の文字種バリデーション
fn validate_username_chars(username: &str) -> Result<(), ValidationError> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_username_chars"))
    }
}

impl UserFormValidation {
    /// リクエストデータからバリデーション用構造体を作成
    pub fn new(username: &str, password: Option<&str>, email: Option<&str>) -> Self {
        Self {
            username: username.to_string(),
            password: password.map(|p| p.to_string()),
            email: email.map(|e| e.to_string()),
        }
    }

    /// バリデーションを実行し、エラーメッセージを返す
    pub fn validate_form(&self) -> Result<(), Vec<String>> {
        match self.validate() {
            Ok(_) => Ok(()),
            Err(errors) => {
                let mut messages = Vec::new();
                for (field, field_errors) in errors.field_errors() {
                    for error in field_errors {
                        let msg = error.message.as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("{} が不正です", field));
                        messages.push(msg);
                    }
                }
                Err(messages)
            }
        }
    }
}

/// メールアドレス単体のバリデーション (プロフィール部分更新用)
pub fn validate_email_field(email: &str) -> Result<(), Vec<String>> {
    if validator::validate_email(email) {
        Ok(())
    } else {
        Err(vec!["メールアドレスの形式が正しくありません".to_string()])
    }
}
