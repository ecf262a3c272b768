use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;
use sea_orm_migration::sea_orm::{EnumIter, Iterable};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
    Title,
    Description,
    Status,
    UserId,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
struct TaskStatus;

#[derive(DeriveIden, EnumIter)]
pub enum TaskStatusVariants {
    Open,
    InProgress,
    Done,
}

const FK_TASKS_TO_USERS: &str = "fk-tasks-user_id";
const IDX_TASKS_USER_ID: &str = "idx-tasks-user_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(TaskStatus)
                    .values(TaskStatusVariants::iter())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(pk_auto(Tasks::Id))
                    .col(string(Tasks::Title))
                    .col(string(Tasks::Description))
                    .col(enumeration(
                        Tasks::Status,
                        Alias::new("task_status"),
                        TaskStatusVariants::iter(),
                    ))
                    .col(integer(Tasks::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_TASKS_TO_USERS)
                            .from(Tasks::Table, Tasks::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // Every task lookup is owner-scoped, so user_id carries an index.
        manager
            .create_index(
                Index::create()
                    .name(IDX_TASKS_USER_ID)
                    .table(Tasks::Table)
                    .col(Tasks::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("task_status")).to_owned())
            .await
    }
}
