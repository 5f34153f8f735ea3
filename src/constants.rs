//! Application constants for the hydro processor
//!
//! This module contains the reserved mnemonics, sentinels, physical constants
//! and default values used throughout the hydro processor.

use rust_decimal::Decimal;

// =============================================================================
// Exchange Format
// =============================================================================

/// File type identifier on the stamp line of bottle Exchange files
pub const BOTTLE_IDENTIFIER: &str = "BOTTLE";

/// Sentinel line terminating the data section
pub const END_DATA: &str = "END_DATA";

/// Suffix of WOCE flag columns
pub const FLAG_WOCE_SUFFIX: &str = "_FLAG_W";

/// Suffix of IGOSS flag columns
pub const FLAG_IGOSS_SUFFIX: &str = "_FLAG_I";

/// Print template used for flag columns
pub const FLAG_FORMAT: &str = "%1d";

/// Numeric out-of-band sentinel meaning "no data"
pub const OUT_OF_BAND_SENTINEL: i64 = -999;

/// Tolerance used when comparing against the out-of-band sentinel, as (mantissa, scale)
pub const OUT_OF_BAND_TOLERANCE: (i64, u32) = (1, 1);

/// Value written in place of a null cell
pub const FILL_VALUE: i64 = -999;

/// Global metadata keys
pub mod globals {
    /// Stamp from the identifier line
    pub const STAMP: &str = "stamp";

    /// Concatenated `#` comment lines
    pub const HEADER: &str = "header";
}

// =============================================================================
// Reserved Mnemonics
// =============================================================================

/// Well-known column mnemonics
pub mod mnemonics {
    pub const EXPOCODE: &str = "EXPOCODE";
    pub const SECT_ID: &str = "SECT_ID";
    pub const STNNBR: &str = "STNNBR";
    pub const CASTNO: &str = "CASTNO";
    pub const SAMPNO: &str = "SAMPNO";
    pub const BTLNBR: &str = "BTLNBR";
    pub const DATE: &str = "DATE";
    pub const TIME: &str = "TIME";
    pub const DATETIME: &str = "_DATETIME";
    pub const LATITUDE: &str = "LATITUDE";
    pub const LONGITUDE: &str = "LONGITUDE";
    pub const CTDPRS: &str = "CTDPRS";
    pub const CTDOXY: &str = "CTDOXY";
    pub const CTDSIGTH: &str = "CTDSIGTH";
}

/// Columns written as integers even when stored as decimals
pub const INTEGER_IDENTIFIER_COLUMNS: &[&str] = &[
    mnemonics::STNNBR,
    mnemonics::CASTNO,
    mnemonics::SAMPNO,
    mnemonics::BTLNBR,
];

/// Default cast key used to split files
pub const CAST_KEY_COLUMNS: &[&str] = &[mnemonics::STNNBR, mnemonics::CASTNO];

/// Prefix marking a contrived (intentionally uncatalogued) parameter
pub const CONTRIVED_PREFIX: &str = "_";

/// Print template of contrived parameters
pub const CONTRIVED_FORMAT: &str = "%11s";

/// Display order of parameters with no known position
pub const DISPLAY_ORDER_UNORDERED: i64 = i64::MAX;

// =============================================================================
// Unit Conversion
// =============================================================================

/// Marker identifying dissolved oxygen mnemonics
pub const OXYGEN_MARKER: &str = "OXY";

/// Salinity used when no measured salinity is available
pub const APPROXIMATION_SALINITY: f64 = 34.8;

/// Temperature used when no measured temperature is available
pub const APPROXIMATION_TEMPERATURE: f64 = 25.0;

/// Reference temperature for non-oxygen per-litre conversions
pub const REFERENCE_TEMPERATURE: f64 = 25.0;

/// Values below this threshold are treated as missing by per-litre converters
pub const MISSING_DATA_THRESHOLD: f64 = -3.0;

/// Salinities outside this range are suspicious
pub const SANE_SALINITY_RANGE: (f64, f64) = (20.0, 60.0);

/// Preferred salinity columns, best first
pub const SALINITY_COLUMNS: &[&str] = &["CTDSAL", "SALNTY"];

/// Preferred temperature columns, best first
pub const TEMPERATURE_COLUMNS: &[&str] = &["CTDTMP", "THETA", "REVTMP"];

/// Molar mass of O2 in g/mol (31.9988)
pub const O2_ATOMIC_WEIGHT: Decimal = Decimal::from_parts(319_988, 0, 0, false, 4);

/// Density of O2 in g/l at 273.15 K (1.42905481)
pub const O2_DENSITY: Decimal = Decimal::from_parts(142_905_481, 0, 0, false, 8);

/// Helium/neon factor from CC/KG * 1e-5 to NMOL/KG (2.2415)
pub const NOBLE_GAS_MOLAR_VOLUME: Decimal = Decimal::from_parts(22_415, 0, 0, false, 4);

/// Sigma-theta column used by the CTD oxygen converter
pub const SIGMA_THETA_COLUMN: &str = "CTDSIGTH";

// =============================================================================
// Quality Control Constants
// =============================================================================

/// WOCE water sample quality flags
pub mod water_flags {
    /// Sample for this measurement was drawn but analysis not received
    pub const NOT_RECEIVED: i16 = 1;

    /// Acceptable measurement
    pub const ACCEPTABLE: i16 = 2;

    /// Questionable measurement
    pub const QUESTIONABLE: i16 = 3;

    /// Bad measurement
    pub const BAD: i16 = 4;

    /// Value not reported
    pub const NOT_REPORTED: i16 = 5;

    /// Mean of replicate measurements
    pub const REPLICATE_MEAN: i16 = 6;

    /// Manual chromatographic peak measurement
    pub const MANUAL_PEAK: i16 = 7;

    /// Irregular digital chromatographic peak integration
    pub const IRREGULAR_PEAK: i16 = 8;

    /// Sample not drawn for this measurement from this bottle
    pub const NOT_DRAWN: i16 = 9;

    /// Flags that require a fill value in the data column
    pub const REQUIRE_FILL: &[i16] = &[NOT_RECEIVED, NOT_REPORTED, NOT_DRAWN];

    /// Human-readable description of a flag
    pub fn describe(flag: i16) -> &'static str {
        match flag {
            NOT_RECEIVED => "Sample for this measurement was drawn from water bottle but analysis not received.",
            ACCEPTABLE => "Acceptable measurement.",
            QUESTIONABLE => "Questionable measurement.",
            BAD => "Bad measurement.",
            NOT_REPORTED => "Not reported.",
            REPLICATE_MEAN => "Mean of replicate measurements.",
            MANUAL_PEAK => "Manual chromatographic peak measurement.",
            IRREGULAR_PEAK => "Irregular digital chromatographic peak integration.",
            NOT_DRAWN => "Sample not drawn for this measurement from this bottle.",
            _ => "Unknown flag",
        }
    }
}

/// Columns exempt from the water-sample flag/fill consistency check
pub const NOT_WATER_PARAMETERS: &[&str] = &[mnemonics::BTLNBR];

// =============================================================================
// Stamp and Configuration Defaults
// =============================================================================

/// Default institution code used when a stamp has to be generated
pub const DEFAULT_STAMP_INSTITUTION: &str = "CCHSIO";

/// Default person code used when a stamp has to be generated
pub const DEFAULT_STAMP_PERSON: &str = "HYD";

/// Directory name used under the user config dir
pub const CONFIG_DIR_NAME: &str = "hydro-processor";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default number of files processed concurrently by batch commands
pub const DEFAULT_PARALLEL_WORKERS: usize = 4;

/// Upper bound on concurrent workers accepted from the command line
pub const MAX_PARALLEL_WORKERS: usize = 100;

/// File extension picked up when a directory is given as input
pub const EXCHANGE_EXTENSION: &str = "csv";
