//! Product Repository
//!
//! 商品主数据 (`product_type`) 与实物件 (`product_unit`) 的存取。
//! 条码唯一索引保证一码一件；`set_sold` 是按条码的独立幂等写入，
//! 定稿与对账共用。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{ProductInfo, ProductType, ProductUnit};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};

/// SurrealDB product_type 记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductTypeRow {
    pub type_id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub unit: String,
    pub image_url: String,
    pub price: Decimal,
    pub discount: String,
    pub created_at: i64,
}

/// SurrealDB product_unit 记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUnitRow {
    pub barcode: String,
    pub type_id: String,
    pub sold: bool,
    pub created_at: i64,
}

impl From<ProductUnitRow> for ProductUnit {
    fn from(row: ProductUnitRow) -> Self {
        ProductUnit {
            barcode: row.barcode,
            type_id: row.type_id,
            sold: row.sold,
        }
    }
}

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// 新建商品主数据，返回生成的 type_id
    pub async fn create_type(&self, product: &ProductType) -> RepoResult<String> {
        let type_id = shared::util::snowflake_id().to_string();
        let _rows: Vec<ProductTypeRow> = self
            .base
            .db()
            .query(
                r#"
                CREATE product_type SET
                    type_id    = $type_id,
                    name       = $name,
                    brand      = $brand,
                    category   = $category,
                    unit       = $unit,
                    image_url  = $image_url,
                    price      = $price,
                    discount   = $discount,
                    created_at = $created_at
                "#,
            )
            .bind(("type_id", type_id.clone()))
            .bind(("name", product.name.clone()))
            .bind(("brand", product.brand.clone()))
            .bind(("category", product.category.clone()))
            .bind(("unit", product.unit.clone()))
            .bind(("image_url", product.image_url.clone()))
            .bind(("price", product.price))
            .bind(("discount", product.discount.clone()))
            .bind(("created_at", shared::util::now_millis()))
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;
        Ok(type_id)
    }

    /// 为已有商品登记一件新实物
    ///
    /// 条码唯一索引拒绝重复登记。
    pub async fn create_unit(&self, type_id: &str, barcode: &str) -> RepoResult<ProductUnit> {
        let rows: Vec<ProductUnitRow> = self
            .base
            .db()
            .query(
                r#"
                CREATE product_unit SET
                    barcode    = $barcode,
                    type_id    = $type_id,
                    sold       = false,
                    created_at = $created_at
                "#,
            )
            .bind(("barcode", barcode.to_string()))
            .bind(("type_id", type_id.to_string()))
            .bind(("created_at", shared::util::now_millis()))
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;

        rows.into_iter()
            .next()
            .map(ProductUnit::from)
            .ok_or_else(|| RepoError::Database("CREATE product_unit returned no row".into()))
    }

    /// 分配一个未占用的 5 位条码
    pub async fn generate_barcode(&self) -> RepoResult<String> {
        loop {
            let candidate = shared::util::random_barcode();
            if self.find_unit(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }
    }

    /// 按条码查一件实物（不限库存状态）
    pub async fn find_unit(&self, barcode: &str) -> RepoResult<Option<ProductUnit>> {
        let rows: Vec<ProductUnitRow> = self
            .base
            .db()
            .query("SELECT * FROM product_unit WHERE barcode = $barcode")
            .bind(("barcode", barcode.to_string()))
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;
        Ok(rows.into_iter().next().map(ProductUnit::from))
    }

    /// 商品查询：条码 + 动作要求的库存状态
    ///
    /// sell 需要未售出的件，return 需要已售出的件；状态不符时按
    /// 未找到处理（调用方据此产生面向用户的错误消息）。
    pub async fn lookup(&self, barcode: &str, require_sold: bool) -> RepoResult<Option<ProductInfo>> {
        let units: Vec<ProductUnitRow> = self
            .base
            .db()
            .query("SELECT * FROM product_unit WHERE barcode = $barcode AND sold = $sold")
            .bind(("barcode", barcode.to_string()))
            .bind(("sold", require_sold))
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;

        let Some(unit) = units.into_iter().next() else {
            return Ok(None);
        };

        let types: Vec<ProductTypeRow> = self
            .base
            .db()
            .query("SELECT * FROM product_type WHERE type_id = $type_id")
            .bind(("type_id", unit.type_id.clone()))
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;

        let Some(master) = types.into_iter().next() else {
            // A unit without master data is a dangling reference; log and
            // report as not found so the scan surfaces a user-facing error.
            tracing::error!(
                barcode = %barcode,
                type_id = %unit.type_id,
                "Product unit references missing product_type"
            );
            return Ok(None);
        };

        Ok(Some(ProductInfo {
            name: master.name,
            brand: master.brand,
            category: master.category,
            unit: master.unit,
            image_url: master.image_url,
            price: master.price,
            discount: master.discount,
            sold: unit.sold,
        }))
    }

    /// 设置一件实物的 sold 标记
    ///
    /// 幂等：目标状态已满足时再次执行无副作用。返回是否存在该条码。
    pub async fn set_sold(&self, barcode: &str, sold: bool) -> RepoResult<bool> {
        let rows: Vec<ProductUnitRow> = self
            .base
            .db()
            .query("UPDATE product_unit SET sold = $sold WHERE barcode = $barcode")
            .bind(("sold", sold))
            .bind(("barcode", barcode.to_string()))
            .await
            .map_err(RepoError::from)?
            .take(0)
            .map_err(RepoError::from)?;
        Ok(!rows.is_empty())
    }
}
