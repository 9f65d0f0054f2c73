//! Titanic survival predictor: urlencoded form in, rendered page out.

pub mod form;
pub mod model;
pub mod page;
pub mod routes;
