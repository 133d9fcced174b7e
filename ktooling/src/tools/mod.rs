//! Integrated tools advertised to the model.

pub mod url_reader;
pub mod weather;
