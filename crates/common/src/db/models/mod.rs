//! SeaORM entity models
//!
//! Database entities for CourseHub

mod course;
mod organization;
mod payment;
mod user;

pub use organization::{
    ActiveModel as OrganizationActiveModel, Column as OrganizationColumn,
    Entity as OrganizationEntity, Model as Organization,
};

pub use user::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as UserEntity, Model as User,
};

pub use course::{
    ActiveModel as CourseActiveModel, Column as CourseColumn, Entity as CourseEntity,
    Model as Course,
};

pub use payment::{
    ActiveModel as PaymentActiveModel, Column as PaymentColumn, Entity as PaymentEntity,
    Model as Payment, PaymentStatus,
};
