use serde::Serialize;
use sqlx::FromRow;

/// Row of `kategori_makanan`.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Category {
    pub id: i32,
    pub nama_kategori: String,
    pub deskripsi: Option<String>,
}

/// Public projection of a `makanan` row.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Item {
    pub nama_makanan: String,
    pub deskripsi: Option<String>,
    pub gambar: Option<String>,
}
