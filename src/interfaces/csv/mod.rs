pub mod history_writer;
pub mod row_writer;
