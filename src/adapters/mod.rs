// Adapters layer: concrete implementations for files on disk and spreadsheet formats.

pub mod sheet_reader;
pub mod sheet_writer;
pub mod storage;
