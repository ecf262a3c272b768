pub use sea_orm_migration::prelude::*;

mod m20250912_083015_create_users_table;
mod m20250912_091427_create_tasks_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250912_083015_create_users_table::Migration),
            Box::new(m20250912_091427_create_tasks_table::Migration),
        ]
    }
}
