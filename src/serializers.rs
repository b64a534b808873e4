//! レスポンス用シリアライザ。
//! DRFの `serializers.py` に相当し、エンティティごとの公開フィールドの
//! ホワイトリストとネスト構造をここで定義します。

use sea_orm::*;
use serde::{Deserialize, Serialize};

use crate::entities::{prelude::*, student, teacher, user, user_profile};
use crate::errors::AppError;

/// プロフィールの公開フィールド。
/// DRFの `UserProfileSerializer` に相当します。
#[derive(Debug, Serialize)]
pub struct ProfileOut {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub class_name: Option<String>,
    pub subject: Option<String>,
}

impl From<user_profile::Model> for ProfileOut {
    fn from(p: user_profile::Model) -> Self {
        Self {
            phone: p.phone,
            address: p.address,
            class_name: p.class_name,
            subject: p.subject,
        }
    }
}

/// ユーザーの公開フィールド。パスワードハッシュは含めない。
/// DRFの `UserSerializer` (fields ホワイトリスト) に相当します。
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: user::Role,
    pub profile: Option<ProfileOut>,
}

impl UserOut {
    pub fn new(user: user::Model, profile: Option<user_profile::Model>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            profile: profile.map(ProfileOut::from),
        }
    }

    /// プロフィールを読み込んでシリアライズする。
    /// プロフィール行は遅延作成なので、存在しなければ `profile: null`。
    pub async fn load(db: &DatabaseConnection, user: user::Model) -> Result<Self, AppError> {
        let profile = user.find_related(UserProfile).one(db).await?;
        Ok(Self::new(user, profile))
    }
}

/// プロフィールの部分更新。リクエストに含まれるフィールドだけを適用し、
/// 含まれないフィールドには触れない。
#[derive(Debug, Default, Deserialize)]
pub struct ProfilePatch {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub class_name: Option<String>,
    pub subject: Option<String>,
}

/// ネストしたユーザーの部分更新 (プロフィールのサブオブジェクトを含む)。
/// `role` は受け取らない。役割は作成時に確定する不変属性。
#[derive(Debug, Default, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile: Option<ProfilePatch>,
}

/// 生徒のシリアライズ。ユーザーをネストして返す。
#[derive(Debug, Serialize)]
pub struct StudentOut {
    pub user: UserOut,
    pub school_class_id: Option<i32>,
}

impl StudentOut {
    pub async fn load(db: &DatabaseConnection, student: student::Model) -> Result<Self, AppError> {
        let user = student
            .find_related(User)
            .one(db)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(Self {
            user: UserOut::load(db, user).await?,
            school_class_id: student.school_class_id,
        })
    }
}

/// 教師のシリアライズ。ユーザーをネストして返す。
#[derive(Debug, Serialize)]
pub struct TeacherOut {
    pub user: UserOut,
    pub hire_date: Option<chrono::NaiveDate>,
    pub qualification: Option<String>,
    pub experience_years: Option<i32>,
    pub specialization: Option<String>,
}

impl TeacherOut {
    pub async fn load(db: &DatabaseConnection, teacher: teacher::Model) -> Result<Self, AppError> {
        let user = teacher
            .find_related(User)
            .one(db)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(Self {
            user: UserOut::load(db, user).await?,
            hire_date: teacher.hire_date,
            qualification: teacher.qualification,
            experience_years: teacher.experience_years,
            specialization: teacher.specialization,
        })
    }
}
