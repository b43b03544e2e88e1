pub mod attribution;
pub mod narrative;

pub use attribution::{attribute, Attribution, CategoryContribution, FeatureContribution};
pub use narrative::{compose, ChipTone, Narrative, SignalChip, Subject};
