pub mod asset;
pub mod price;

pub use asset::{Asset, NewAsset};
pub use price::{PriceRecord, SaveOutcome};
