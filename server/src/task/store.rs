use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder,
};

use crate::entities::task;
use crate::store::StorageError;

use super::{TaskFilter, TaskStatus};

/// Narrow persistence seam for task records. Every operation is scoped to an
/// owner; rows belonging to other users are invisible through this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(
        &self,
        title: String,
        description: String,
        owner_id: i32,
    ) -> Result<task::Model, StorageError>;

    async fn find_by_filter(
        &self,
        filter: &TaskFilter,
        owner_id: i32,
    ) -> Result<Vec<task::Model>, StorageError>;

    async fn find_by_id(&self, id: i32, owner_id: i32)
    -> Result<Option<task::Model>, StorageError>;

    async fn save_status(
        &self,
        model: task::Model,
        status: TaskStatus,
    ) -> Result<task::Model, StorageError>;

    async fn delete(&self, model: task::Model) -> Result<(), StorageError>;
}

/// [`TaskStore`] backed by a SeaORM connection.
pub struct SeaOrmTaskStore<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SeaOrmTaskStore<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl TaskStore for SeaOrmTaskStore<'_> {
    async fn insert(
        &self,
        title: String,
        description: String,
        owner_id: i32,
    ) -> Result<task::Model, StorageError> {
        let active_model = task::ActiveModel {
            title: ActiveValue::Set(title),
            description: ActiveValue::Set(description),
            status: ActiveValue::Set(TaskStatus::Open),
            user_id: ActiveValue::Set(owner_id),
            ..Default::default()
        };
        Ok(active_model.insert(self.db).await?)
    }

    async fn find_by_filter(
        &self,
        filter: &TaskFilter,
        owner_id: i32,
    ) -> Result<Vec<task::Model>, StorageError> {
        let mut query = task::Entity::find().filter(task::Column::UserId.eq(owner_id));

        if let Some(status) = filter.status {
            query = query.filter(task::Column::Status.eq(status));
        }

        if let Some(search) = &filter.search {
            query = query.filter(
                Condition::any()
                    .add(task::Column::Title.contains(search.as_str()))
                    .add(task::Column::Description.contains(search.as_str())),
            );
        }

        Ok(query.order_by_asc(task::Column::Id).all(self.db).await?)
    }

    async fn find_by_id(
        &self,
        id: i32,
        owner_id: i32,
    ) -> Result<Option<task::Model>, StorageError> {
        Ok(task::Entity::find_by_id(id)
            .filter(task::Column::UserId.eq(owner_id))
            .one(self.db)
            .await?)
    }

    async fn save_status(
        &self,
        model: task::Model,
        status: TaskStatus,
    ) -> Result<task::Model, StorageError> {
        let mut active_model: task::ActiveModel = model.into();
        active_model.status = ActiveValue::Set(status);
        Ok(active_model.update(self.db).await?)
    }

    async fn delete(&self, model: task::Model) -> Result<(), StorageError> {
        model.delete(self.db).await?;
        Ok(())
    }
}
