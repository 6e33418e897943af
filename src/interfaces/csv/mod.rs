pub mod balance_writer;
pub mod record_reader;
