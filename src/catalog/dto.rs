use serde::{de, Deserialize, Deserializer};

/// Query string of `GET /makanan`.
#[derive(Debug, Default, Deserialize)]
pub struct ItemFilter {
    /// `?kategori_id=` (empty) means no filter, same as leaving it out.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub kategori_id: Option<i32>,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse::<i32>().map(Some).map_err(de::Error::custom),
    }
}
