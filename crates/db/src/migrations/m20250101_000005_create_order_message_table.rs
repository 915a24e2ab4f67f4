//! Create order message table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrderMessage::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderMessage::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderMessage::OrderId).string_len(32).not_null())
                    .col(ColumnDef::new(OrderMessage::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(OrderMessage::Text).text().not_null())
                    .col(ColumnDef::new(OrderMessage::Sender).string_len(16).not_null())
                    .col(
                        ColumnDef::new(OrderMessage::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_message_order")
                            .from(OrderMessage::Table, OrderMessage::OrderId)
                            .to(Order::Table, Order::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_message_user")
                            .from(OrderMessage::Table, OrderMessage::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (order_id, id) (conversation in creation order)
        manager
            .create_index(
                Index::create()
                    .name("idx_order_message_order_id")
                    .table(OrderMessage::Table)
                    .col(OrderMessage::OrderId)
                    .col(OrderMessage::Id)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderMessage::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OrderMessage {
    Table,
    Id,
    OrderId,
    UserId,
    Text,
    Sender,
    CreatedAt,
}

#[derive(Iden)]
enum Order {
    #[iden = "orders"]
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
