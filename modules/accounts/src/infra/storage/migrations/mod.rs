use sea_orm_migration::prelude::*;

mod m20250801_000001_create_accounts;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250801_000001_create_accounts::Migration)]
    }

    // Each module keeps its own history table so migrators do not see each other's rows.
    fn migration_table_name() -> DynIden {
        Alias::new("accounts_seaql_migrations").into_iden()
    }
}
