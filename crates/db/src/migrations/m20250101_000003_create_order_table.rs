//! Create order table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Order::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Order::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Order::OrderCode).string_len(32).not_null())
                    .col(ColumnDef::new(Order::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Order::TemplateId).string_len(32))
                    .col(ColumnDef::new(Order::WebsiteType).string_len(256).not_null())
                    .col(ColumnDef::new(Order::Answers).json_binary())
                    .col(ColumnDef::new(Order::Budget).string_len(256).not_null())
                    .col(ColumnDef::new(Order::Stage).string_len(256).not_null())
                    .col(ColumnDef::new(Order::Status).string_len(32).not_null())
                    .col(ColumnDef::new(Order::OrderType).string_len(16).not_null())
                    .col(ColumnDef::new(Order::WebsiteName).string_len(256).not_null())
                    .col(ColumnDef::new(Order::Requirements).text().not_null())
                    .col(
                        ColumnDef::new(Order::FolderSubmitted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Order::FolderSubmittedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Order::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Order::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_user")
                            .from(Order::Table, Order::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: order_code
        manager
            .create_index(
                Index::create()
                    .name("idx_order_code")
                    .table(Order::Table)
                    .col(Order::OrderCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for a user's order list)
        manager
            .create_index(
                Index::create()
                    .name("idx_order_user_id")
                    .table(Order::Table)
                    .col(Order::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: status (dashboard counts)
        manager
            .create_index(
                Index::create()
                    .name("idx_order_status")
                    .table(Order::Table)
                    .col(Order::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Order::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Order {
    #[iden = "orders"]
    Table,
    Id,
    OrderCode,
    UserId,
    TemplateId,
    WebsiteType,
    Answers,
    Budget,
    Stage,
    Status,
    OrderType,
    WebsiteName,
    Requirements,
    FolderSubmitted,
    FolderSubmittedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
