use async_trait::async_trait;
use sqlx::PgPool;

use crate::catalog::repo_types::{Category, Item};

/// Read-only access to the food catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, sqlx::Error>;

    /// All items, or only those linked to `kategori_id` through `makanan_kategori`.
    async fn list_items(&self, kategori_id: Option<i32>) -> Result<Vec<Item>, sqlx::Error>;
}

#[derive(Clone)]
pub struct PgCatalogStore {
    db: PgPool,
}

impl PgCatalogStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_categories(&self) -> Result<Vec<Category>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, nama_kategori, deskripsi
            FROM kategori_makanan
            "#,
        )
        .fetch_all(&self.db)
        .await
    }

    async fn list_items(&self, kategori_id: Option<i32>) -> Result<Vec<Item>, sqlx::Error> {
        match kategori_id {
            Some(kategori_id) => {
                sqlx::query_as::<_, Item>(
                    r#"
                    SELECT m.nama_makanan, m.deskripsi, m.gambar
                    FROM makanan m
                    JOIN makanan_kategori mk ON m.id = mk.makanan_id
                    WHERE mk.kategori_id = $1
                    "#,
                )
                .bind(kategori_id)
                .fetch_all(&self.db)
                .await
            }
            None => {
                sqlx::query_as::<_, Item>(
                    r#"
                    SELECT nama_makanan, deskripsi, gambar
                    FROM makanan
                    "#,
                )
                .fetch_all(&self.db)
                .await
            }
        }
    }
}
