//! Receipt store shared by the relational backends.
//!
//! The SQL is identical on Postgres and SQLite; only the DDL and the way a
//! pool is opened differ, and those live in the backend modules.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Database, Pool, Postgres, Row, Sqlite, Transaction};
use tracing::warn;

use receipt_domain::{ReceiptExtraction, ReceiptRepository, StoredReceipt, StoredReceiptItem};

use super::postgres_receipts::POSTGRES_SCHEMA;
use super::sqlite_receipts::SQLITE_SCHEMA;

const INSERT_HEADER: &str = "INSERT INTO receipt_headers (business_name, date, total, tax) \
     VALUES ($1, $2, $3, $4) RETURNING id";
const INSERT_ITEM: &str = "INSERT INTO receipt_items (header_id, name, price) VALUES ($1, $2, $3)";
const SELECT_HEADER: &str =
    "SELECT id, business_name, date, total, tax FROM receipt_headers WHERE id = $1";
const SELECT_ITEMS: &str =
    "SELECT id, name, price FROM receipt_items WHERE header_id = $1 ORDER BY id";

pub struct SqlReceiptStore<DB: Database> {
    pool: Pool<DB>,
}

impl<DB: Database> SqlReceiptStore<DB> {
    pub fn new(pool: Pool<DB>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<DB> {
        &self.pool
    }
}

impl<DB: Database> Clone for SqlReceiptStore<DB> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

macro_rules! impl_receipt_store {
    ($db:ty, $schema:expr) => {
        impl SqlReceiptStore<$db> {
            async fn insert_receipt(
                tx: &mut Transaction<'_, $db>,
                receipt: &ReceiptExtraction,
            ) -> Result<i64> {
                let header_id: i64 = sqlx::query_scalar(INSERT_HEADER)
                    .bind(receipt.business_name.as_deref())
                    .bind(receipt.date.as_deref())
                    .bind(receipt.total)
                    .bind(receipt.tax)
                    .fetch_one(&mut **tx)
                    .await
                    .context("insert receipt header")?;

                for item in receipt.line_items() {
                    sqlx::query(INSERT_ITEM)
                        .bind(header_id)
                        .bind(item.name.as_deref())
                        .bind(item.price)
                        .execute(&mut **tx)
                        .await
                        .context("insert receipt item")?;
                }
                Ok(header_id)
            }
        }

        #[async_trait]
        impl ReceiptRepository for SqlReceiptStore<$db> {
            async fn ensure_schema(&self) -> Result<()> {
                for statement in $schema {
                    sqlx::query(*statement).execute(&self.pool).await?;
                }
                Ok(())
            }

            async fn save_receipt(&self, receipt: &ReceiptExtraction) -> Result<i64> {
                let mut tx = self.pool.begin().await?;
                match Self::insert_receipt(&mut tx, receipt).await {
                    Ok(header_id) => {
                        tx.commit().await.context("commit receipt")?;
                        Ok(header_id)
                    }
                    Err(err) => {
                        if let Err(rollback_err) = tx.rollback().await {
                            warn!("rollback after failed receipt insert failed: {}", rollback_err);
                        }
                        Err(err)
                    }
                }
            }

            async fn fetch_receipt(&self, id: i64) -> Result<Option<StoredReceipt>> {
                let Some(header) = sqlx::query(SELECT_HEADER)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
                else {
                    return Ok(None);
                };

                let items = sqlx::query(SELECT_ITEMS)
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?
                    .into_iter()
                    .map(|row| -> Result<StoredReceiptItem> {
                        Ok(StoredReceiptItem {
                            id: row.try_get("id")?,
                            name: row.try_get("name")?,
                            price: row.try_get("price")?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(Some(StoredReceipt {
                    id: header.try_get("id")?,
                    business_name: header.try_get("business_name")?,
                    date: header.try_get("date")?,
                    total: header.try_get("total")?,
                    tax: header.try_get("tax")?,
                    items,
                }))
            }

            async fn ping(&self) -> Result<()> {
                sqlx::query("SELECT 1").execute(&self.pool).await?;
                Ok(())
            }
        }
    };
}

impl_receipt_store!(Postgres, POSTGRES_SCHEMA);
impl_receipt_store!(Sqlite, SQLITE_SCHEMA);
