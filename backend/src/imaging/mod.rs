//! Chest X-ray classifier: multipart upload in, JSON out, one log row per
//! successful prediction.

pub mod model;
pub mod page;
pub mod routes;
pub mod transform;
pub mod upload;
