pub mod text;
pub mod value;
pub mod field_indexes;
