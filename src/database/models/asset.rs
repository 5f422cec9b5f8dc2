use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Asset entity - a tradable instrument from the asset catalog
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = crate::database::schema::assets)]
pub struct Asset {
    pub id: Uuid,

    /// Uppercase ticker (e.g., "AAPL", "MSFT")
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Only active assets take part in a full price sync
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

/// New asset for insertion
#[derive(Debug, Clone, Insertable, Serialize, Deserialize, ToSchema)]
#[diesel(table_name = crate::database::schema::assets)]
pub struct NewAsset {
    pub id: Uuid,
    pub symbol: String,
    pub name: String,
    pub is_active: bool,
}

impl NewAsset {
    /// Create an active asset; the symbol is normalised to uppercase
    pub fn new(symbol: &str, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.trim().to_uppercase(),
            name: name.to_string(),
            is_active: true,
        }
    }

    /// Mark the asset inactive
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn into_asset(self, created_at: DateTime<Utc>) -> Asset {
        Asset {
            id: self.id,
            symbol: self.symbol,
            name: self.name,
            is_active: self.is_active,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_asset_builder() {
        let asset = NewAsset::new(" aapl ", "Apple Inc.").inactive();

        assert_eq!(asset.symbol, "AAPL");
        assert_eq!(asset.name, "Apple Inc.");
        assert!(!asset.is_active);
    }
}
