pub mod hrv;
pub mod morphology;
pub mod rhythm;
pub mod sqi;
