// Utility modules

pub mod encode;
pub mod png_writer;
pub mod storage;
