pub mod csv;
pub mod keys;
