//! Database Module
//!
//! 嵌入式 SurrealDB (RocksDB 引擎)。唯一索引承担幂等职责：条码全局
//! 唯一，支付订单映射按 order_id 唯一。

pub mod repository;

use shared::error::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (creating if missing) the database under `db_path` and apply
    /// the schema definitions.
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns("till")
            .use_db("till")
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        define_schema(&db).await?;

        tracing::info!(path = %db_path, "Database connection established (SurrealDB/RocksDB)");

        Ok(Self { db })
    }
}

/// Table and index definitions
///
/// `IF NOT EXISTS` keeps startup idempotent across restarts.
async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    db.query(
        r#"
        DEFINE TABLE IF NOT EXISTS product_type SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS product_unit SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS product_unit_barcode ON TABLE product_unit COLUMNS barcode UNIQUE;
        DEFINE TABLE IF NOT EXISTS bill SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS bill_bill_id ON TABLE bill COLUMNS bill_id UNIQUE;
        DEFINE TABLE IF NOT EXISTS pending_order SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS pending_order_order_id ON TABLE pending_order COLUMNS order_id UNIQUE;
        "#,
    )
    .await
    .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?
    .check()
    .map_err(|e| AppError::database(format!("Failed to define schema: {e}")))?;
    Ok(())
}
