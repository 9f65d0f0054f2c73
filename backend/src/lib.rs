pub mod config;
pub mod error;
pub mod imaging;
pub mod prediction_log;
pub mod tabular;
#[cfg(feature = "torch")]
pub mod torch;
