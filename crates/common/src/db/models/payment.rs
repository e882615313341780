//! Payment entity and lifecycle state machine

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment status enum.
///
/// Legal transitions: pending -> paid, pending -> failed, paid -> refunded.
/// Everything else is illegal and must be ignored, not applied; webhook
/// delivery is at-least-once, so redelivered events land on states that
/// already moved on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Parse a stored status string; unknown values yield `None`
    pub fn parse(s: &str) -> Option<PaymentStatus> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }

    /// Whether the transition to `next` is legal
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Paid)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
                | (PaymentStatus::Paid, PaymentStatus::Refunded)
        )
    }

    /// A terminal state admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Refunded)
    }
}

impl From<PaymentStatus> for String {
    fn from(status: PaymentStatus) -> Self {
        status.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub tenant_id: i64,

    /// Nulled when the purchasing user is deleted
    pub user_id: Option<i64>,

    /// Nulled when the course is deleted
    pub course_id: Option<i64>,

    #[sea_orm(column_type = "Text")]
    pub provider: String,

    /// Correlates to the external checkout session; exactly one row per id
    #[sea_orm(column_type = "Text", unique)]
    pub provider_payment_id: String,

    pub amount_cents: i64,

    #[sea_orm(column_type = "Text")]
    pub currency: String,

    #[sea_orm(column_type = "Text")]
    pub status: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the payment status as an enum; `None` for an unknown stored
    /// value, which callers must treat as non-transitionable.
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        PaymentStatus::parse(&self.status)
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
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id"
    )]
    Course,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[PaymentStatus] = &[
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    #[test]
    fn test_legal_transitions() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Paid));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
        assert!(PaymentStatus::Paid.can_transition_to(PaymentStatus::Refunded));
    }

    #[test]
    fn test_no_transition_back_to_pending() {
        for status in ALL {
            assert!(!status.can_transition_to(PaymentStatus::Pending));
        }
    }

    #[test]
    fn test_terminal_states_admit_nothing() {
        for from in [PaymentStatus::Failed, PaymentStatus::Refunded] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition_to(*to));
            }
        }
    }

    #[test]
    fn test_self_transitions_illegal() {
        for status in ALL {
            assert!(!status.can_transition_to(*status));
        }
    }

    #[test]
    fn test_status_string_roundtrip() {
        for status in ALL {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(*status));
        }
        assert_eq!(PaymentStatus::parse("chargeback"), None);
    }
}
