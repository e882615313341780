//! Course entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub is_published: bool,

    #[sea_orm(column_type = "Text")]
    pub currency: String,

    /// Price in cents; 0 means the course is not purchasable
    pub price_cents: i64,

    /// Nulled when the instructor is deleted
    pub instructor_id: Option<i64>,

    /// Owning organization; equals the creating user's tenant
    pub tenant_id: i64,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether checkout is allowed for this course
    pub fn is_purchasable(&self) -> bool {
        self.price_cents > 0
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::TenantId",
        to = "super::organization::Column::Id"
    )]
    Organization,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::InstructorId",
        to = "super::user::Column::Id"
    )]
    Instructor,

    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn course(price_cents: i64) -> Model {
        let now = Utc::now();
        Model {
            id: 1,
            title: "X101".to_string(),
            description: String::new(),
            is_published: false,
            currency: "usd".to_string(),
            price_cents,
            instructor_id: None,
            tenant_id: 1,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn test_zero_price_not_purchasable() {
        assert!(!course(0).is_purchasable());
        assert!(course(1).is_purchasable());
        assert!(course(2000).is_purchasable());
    }
}
