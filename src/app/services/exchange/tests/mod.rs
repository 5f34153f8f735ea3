//! Test utilities for the Exchange codec

use crate::app::models::{DataFile, Value};
use crate::app::services::exchange::{ExchangeReader, ExchangeWriter, ReadResult};
use crate::app::services::parameter_catalog::ParameterCatalog;
use crate::config::{CatalogConfig, ExchangeConfig};
use crate::{Error, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

mod round_trip_tests;

/// The smallest valid bottle file
pub const MINIMAL: &str = "BOTTLE,20200101ABCDEF
EXPOCODE,STNNBR,CASTNO,SAMPNO,CTDOXY
,,,,UMOL/KG
49MX20100101,1,1,1,200.5
END_DATA
";

/// Two casts with flags, dates and a comment block
pub const TWO_CASTS: &str = "BOTTLE,19971021WHPOSIOSA
# Cruise P16S
# Chief scientist: someone
EXPOCODE,SECT_ID,STNNBR,CASTNO,SAMPNO,BTLNBR,BTLNBR_FLAG_W,DATE,TIME,LATITUDE,LONGITUDE,CTDPRS,CTDTMP,CTDSAL,CTDSAL_FLAG_W,OXYGEN,OXYGEN_FLAG_W
,,,,,,,,,,,DBAR,ITS-90,PSS-78,,UMOL/KG,
31WTTUNES_3,P16S,1,1,2,2,2,19920710,0930,-17.0000,-150.5000,10.0,25.1234,35.1000,2,200.1,2
31WTTUNES_3,P16S,1,1,1,1,2,19920710,0930,-17.0000,-150.5000,500.5,10.0000,34.6000,2,-999,9
31WTTUNES_3,P16S,2,1,1,1,2,19920711,1015,-17.5000,-150.5000,20.0,24.0000,35.0000,3,210.0,2
END_DATA
";

pub fn catalog() -> ParameterCatalog {
    ParameterCatalog::builtin(CatalogConfig::default().with_allow_contrived(true))
}

pub fn read_str(text: &str) -> Result<DataFile> {
    let catalog = catalog();
    let config = ExchangeConfig::default();
    ExchangeReader::new(&catalog, &config).read(text.as_bytes())
}

pub fn read_stats(text: &str) -> Result<ReadResult> {
    let catalog = catalog();
    let config = ExchangeConfig::default();
    ExchangeReader::new(&catalog, &config).read_with_stats(text.as_bytes())
}

pub fn write_str(file: &DataFile) -> String {
    let catalog = catalog();
    let config = ExchangeConfig::default();
    ExchangeWriter::new(&catalog, &config).to_string(file).unwrap()
}

pub fn dec(text: &str) -> Value {
    Value::Number(Decimal::from_str(text).unwrap())
}

pub fn assert_structural(result: Result<DataFile>) -> Error {
    match result {
        Ok(_) => panic!("expected a structural error"),
        Err(e) => {
            assert!(e.is_structural(), "{} is not structural", e);
            e
        }
    }
}
