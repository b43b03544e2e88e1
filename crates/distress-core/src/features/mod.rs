pub mod catalog;
pub mod extract;
pub mod snapshot;
pub mod technicals;

pub use catalog::{feature_label, FeatureCatalog, FeatureCategory, FEATURE_COUNT, FEATURE_NAMES};
pub use extract::{extract, FeatureVector};
pub use snapshot::{Candle, CompanyInfo, RawSnapshot, StatementFrame};
