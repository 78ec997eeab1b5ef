pub mod place_index;
pub mod validate;
