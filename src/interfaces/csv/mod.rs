pub mod row_writer;
pub mod table_reader;
