use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLogs::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuditLogs::OrderId).uuid().not_null())
                    .col(ColumnDef::new(AuditLogs::Actor).string().not_null())
                    .col(ColumnDef::new(AuditLogs::Action).string().not_null())
                    .col(ColumnDef::new(AuditLogs::BeforeStatus).string().not_null())
                    .col(ColumnDef::new(AuditLogs::AfterStatus).string().not_null())
                    .col(ColumnDef::new(AuditLogs::Detail).text().null())
                    .col(ColumnDef::new(AuditLogs::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_audit_logs_order_id")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::OrderId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum AuditLogs {
    Table,
    Id,
    OrderId,
    Actor,
    Action,
    BeforeStatus,
    AfterStatus,
    Detail,
    CreatedAt,
}
