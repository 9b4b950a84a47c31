pub mod dto;
pub mod validation;

pub use validation::{Validate, ValidatedJson, ValidatedQuery};
