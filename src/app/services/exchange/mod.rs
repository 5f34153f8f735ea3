//! WHP Exchange codec
//!
//! Reads and writes the comma-separated bottle Exchange format:
//!
//! ```text
//! BOTTLE,20200101ABCDEF
//! # optional comment lines
//! EXPOCODE,STNNBR,CASTNO,SAMPNO,CTDOXY,CTDOXY_FLAG_W
//! ,,,,UMOL/KG,
//! 49MX20100101,1,1,1,200.5,2
//! END_DATA
//! ```

pub mod datetime;
pub mod format;
pub mod reader;
pub mod stamp;
pub mod stats;
pub mod writer;

#[cfg(test)]
pub mod tests;

pub use format::PrintFormat;
pub use reader::ExchangeReader;
pub use stats::{ReadResult, ReadStats};
pub use writer::ExchangeWriter;
