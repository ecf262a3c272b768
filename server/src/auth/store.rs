use sea_orm::{ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::user;
use crate::store::StorageError;

/// Narrow persistence seam for user credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(
        &self,
        username: String,
        password_hash: String,
    ) -> Result<user::Model, StorageError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, StorageError>;
}

/// [`UserStore`] backed by a SeaORM connection.
pub struct SeaOrmUserStore<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SeaOrmUserStore<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl UserStore for SeaOrmUserStore<'_> {
    async fn insert_user(
        &self,
        username: String,
        password_hash: String,
    ) -> Result<user::Model, StorageError> {
        let active_model = user::ActiveModel {
            username: ActiveValue::Set(username),
            password_hash: ActiveValue::Set(password_hash),
            ..Default::default()
        };
        Ok(active_model.insert(self.db).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>, StorageError> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db)
            .await?)
    }
}
