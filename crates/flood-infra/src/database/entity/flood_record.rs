//! Flood record entity for SeaORM.

use sea_orm::entity::prelude::*;

use flood_core::StoreError;
use flood_core::domain::{Event, SubjectId};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "flood_record")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub occurred_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Event.
impl TryFrom<Model> for Event {
    type Error = StoreError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let subject_id = SubjectId::new(model.user_id)
            .map_err(|e| StoreError::Query(format!("flood_record {}: {e}", model.id)))?;

        Ok(Self {
            subject_id,
            occurred_at: model.occurred_at.into(),
        })
    }
}
