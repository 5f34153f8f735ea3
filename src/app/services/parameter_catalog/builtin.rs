//! Built-in table of standard WHP parameters

use super::lookup::ParameterTable;
use crate::app::models::{Parameter, Unit};
use rust_decimal::Decimal;

/// (name, full name, format, (unit, unit name), lower bound, upper bound, aliases)
type Row = (
    &'static str,
    &'static str,
    &'static str,
    Option<(&'static str, &'static str)>,
    Option<(i64, u32)>,
    Option<(i64, u32)>,
    &'static [&'static str],
);

/// Standard parameters in canonical display order
const STANDARD_PARAMETERS: &[Row] = &[
    ("EXPOCODE", "ExpoCode", "%11s", None, None, None, &[]),
    ("SECT_ID", "Section ID", "%8s", None, None, None, &["SECTION"]),
    ("STNNBR", "Station Number", "%6s", None, None, None, &["STATION"]),
    ("CASTNO", "Cast Number", "%3d", None, None, None, &["CAST"]),
    ("SAMPNO", "Sample Number", "%7s", None, None, None, &[]),
    ("BTLNBR", "Bottle Number", "%7s", None, None, None, &[]),
    ("DATE", "Date", "%8s", None, None, None, &[]),
    ("TIME", "Time", "%4s", None, None, None, &[]),
    ("LATITUDE", "Latitude", "%9.4f", None, Some((-90, 0)), Some((90, 0)), &["LAT"]),
    ("LONGITUDE", "Longitude", "%9.4f", None, Some((-180, 0)), Some((180, 0)), &["LON"]),
    ("DEPTH", "Bottom Depth", "%6d", Some(("METERS", "meters")), Some((0, 0)), Some((11000, 0)), &[]),
    ("CTDPRS", "CTD Pressure", "%9.1f", Some(("DBAR", "decibar")), Some((0, 0)), Some((12000, 0)), &["PRESSURE"]),
    ("CTDTMP", "CTD Temperature", "%9.4f", Some(("ITS-90", "degrees C ITS-90")), Some((-2, 0)), Some((40, 0)), &["CTDTEMP"]),
    ("CTDSAL", "CTD Salinity", "%9.4f", Some(("PSS-78", "practical salinity")), Some((0, 0)), Some((42, 0)), &[]),
    ("CTDOXY", "CTD Oxygen", "%9.1f", Some(("UMOL/KG", "micromole/kilogram")), Some((0, 0)), Some((500, 0)), &["CTDO2"]),
    ("CTDSIGTH", "CTD Sigma-theta", "%9.4f", Some(("KG/M^3", "kilogram/meter^3")), Some((0, 0)), Some((40, 0)), &[]),
    ("THETA", "Potential Temperature", "%9.4f", Some(("DEG C", "degrees C")), Some((-2, 0)), Some((40, 0)), &[]),
    ("SALNTY", "Bottle Salinity", "%9.4f", Some(("PSS-78", "practical salinity")), Some((0, 0)), Some((42, 0)), &["BTLSAL"]),
    ("OXYGEN", "Bottle Oxygen", "%9.1f", Some(("UMOL/KG", "micromole/kilogram")), Some((0, 0)), Some((500, 0)), &["O2"]),
    ("SILCAT", "Silicate", "%9.2f", Some(("UMOL/KG", "micromole/kilogram")), Some((0, 0)), Some((300, 0)), &["SILICATE"]),
    ("NITRAT", "Nitrate", "%9.2f", Some(("UMOL/KG", "micromole/kilogram")), Some((0, 0)), Some((60, 0)), &["NO3"]),
    ("NITRIT", "Nitrite", "%9.2f", Some(("UMOL/KG", "micromole/kilogram")), Some((0, 0)), Some((10, 0)), &["NO2"]),
    ("PHSPHT", "Phosphate", "%9.2f", Some(("UMOL/KG", "micromole/kilogram")), Some((0, 0)), Some((5, 0)), &["PO4"]),
    ("REVTMP", "Reversing Thermometer Temperature", "%9.3f", Some(("DEG C", "degrees C")), Some((-2, 0)), Some((40, 0)), &[]),
    ("CFC-11", "Freon-11", "%9.3f", Some(("PMOL/KG", "picomole/kilogram")), Some((0, 0)), Some((15, 0)), &["CFC11"]),
    ("CFC-12", "Freon-12", "%9.3f", Some(("PMOL/KG", "picomole/kilogram")), Some((0, 0)), Some((10, 0)), &["CFC12"]),
    ("TCARBN", "Total Carbon", "%9.1f", Some(("UMOL/KG", "micromole/kilogram")), Some((1500, 0)), Some((2600, 0)), &["DIC"]),
    ("ALKALI", "Total Alkalinity", "%9.1f", Some(("UMOL/KG", "micromole/kilogram")), Some((1800, 0)), Some((2800, 0)), &["TALK"]),
    ("PH", "pH", "%9.4f", None, Some((7, 0)), Some((9, 0)), &[]),
    ("CTDRAW", "CTD Raw", "%9.1f", None, None, None, &[]),
    ("XMISS", "Transmissometer", "%9.4f", Some(("%TRANS", "percent transmission")), Some((0, 0)), Some((100, 0)), &[]),
    ("HELIUM", "Helium", "%9.4f", Some(("NMOL/KG", "nanomole/kilogram")), Some((0, 0)), Some((5, 0)), &[]),
    ("NEON", "Neon", "%9.4f", Some(("NMOL/KG", "nanomole/kilogram")), Some((0, 0)), Some((20, 0)), &[]),
];

impl ParameterTable {
    /// Table of the standard WHP parameters
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for (index, (name, full_name, format, unit, lower, upper, aliases)) in
            STANDARD_PARAMETERS.iter().enumerate()
        {
            let unit = unit.map(|(mnemonic, unit_name)| Unit::with_name(mnemonic, unit_name));
            let bound = |b: &Option<(i64, u32)>| b.map(|(m, s)| Decimal::new(m, s));
            let parameter = Parameter::new(*name, *full_name, *format, unit, index as i64 + 1)
                .with_bounds(bound(lower), bound(upper))
                .with_aliases(aliases);
            table.insert(parameter);
        }
        table
    }
}
