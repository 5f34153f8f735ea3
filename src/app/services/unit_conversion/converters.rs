//! Converter implementations
//!
//! Every converter computes all new values before touching the column, so a
//! failing conversion leaves the column as it was.

use super::ConversionContext;
use super::precision::{integral_digits, round_significant, significant_digits};
use super::seawater;
use crate::app::models::{Column, DataFile, Value};
use crate::constants::{
    NOBLE_GAS_MOLAR_VOLUME, O2_ATOMIC_WEIGHT, O2_DENSITY, OXYGEN_MARKER, SANE_SALINITY_RANGE,
    mnemonics,
};
use crate::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use tracing::{debug, warn};

/// Units differ only in name (e.g. DEG C and ITS-90)
pub fn equivalent(_file: &DataFile, column: &mut Column, context: &ConversionContext) -> Result<()> {
    column.parameter.unit = Some(context.target.clone());
    Ok(())
}

/// Dissolved oxygen ML/L to UMOL/KG using the density at the sample's
/// salinity and temperature
pub fn milliliter_per_liter_to_umol_per_kg(
    file: &DataFile,
    column: &mut Column,
    context: &ConversionContext,
) -> Result<()> {
    let mnemonic = column.mnemonic().to_string();
    if !mnemonic.contains(OXYGEN_MARKER) {
        return Err(Error::invalid_conversion(
            mnemonic,
            "cannot apply the oxygen conversion to a non-oxygen parameter",
        ));
    }

    let options = &context.options;
    let aliquot_ctd = options.oxygen_method == super::OxygenMethod::Aliquot
        && mnemonic.contains(mnemonics::CTDOXY);
    let constant = O2_ATOMIC_WEIGHT / O2_DENSITY * Decimal::new(1, 3);

    let mut converted = Vec::with_capacity(column.len());
    for row in 0..column.len() {
        let Some(value) = numeric_cell(column, row)? else {
            converted.push(None);
            continue;
        };
        if is_missing(value, context) {
            converted.push(None);
            continue;
        }

        let salinity = salinity_at(file, context, row);
        let temperature = if aliquot_ctd {
            options.approximation_temperature
        } else {
            temperature_at(file, context, row)
        };

        let sigma = decimal_from(seawater::sigma(salinity, temperature), &mnemonic)?;
        let denominator = constant * (sigma / Decimal::ONE_THOUSAND + Decimal::ONE);
        let Some(quotient) = divide(value, denominator, &mnemonic, row) else {
            converted.push(None);
            continue;
        };
        let result = round_significant(quotient, significant_digits(value));
        debug!(
            "{}[{}]: {} ML/L at S={} T={} -> {}",
            mnemonic, row, value, salinity, temperature, result
        );
        converted.push(Some(Value::Number(result)));
    }

    column.values = converted;
    column.parameter.unit = Some(context.target.clone());
    Ok(())
}

/// Non-oxygen dissolved species per litre to per kilogram using the density
/// at the sample's salinity and the reference temperature
pub fn mol_per_liter_to_mol_per_kg(
    file: &DataFile,
    column: &mut Column,
    context: &ConversionContext,
) -> Result<()> {
    let mnemonic = column.mnemonic().to_string();
    if mnemonic.contains(OXYGEN_MARKER) {
        return Err(Error::invalid_conversion(
            mnemonic,
            "cannot apply the mol/liter to mol/kg conversion to oxygen",
        ));
    }

    let reference = context.options.reference_temperature;
    let mut converted = Vec::with_capacity(column.len());
    for row in 0..column.len() {
        let Some(value) = numeric_cell(column, row)? else {
            converted.push(None);
            continue;
        };
        if is_missing(value, context) {
            converted.push(None);
            continue;
        }

        let salinity = salinity_at(file, context, row);
        let sigma = decimal_from(seawater::sigma(salinity, reference), &mnemonic)?;
        let denominator = sigma / Decimal::ONE_THOUSAND + Decimal::ONE;
        let cell = divide(value, denominator, &mnemonic, row)
            .map(|quotient| Value::Number(round_significant(quotient, significant_digits(value))));
        converted.push(cell);
    }

    column.values = converted;
    column.parameter.unit = Some(context.target.clone());
    Ok(())
}

/// CTD oxygen UMOL/L to UMOL/KG using the file's sigma-theta column
pub fn ctdoxy_micromole_per_liter_to_micromole_per_kilogram(
    file: &DataFile,
    column: &mut Column,
    context: &ConversionContext,
) -> Result<()> {
    let mnemonic = column.mnemonic().to_string();
    let sigma_theta_name = &context.options.sigma_theta_column;
    let Some(sigma_theta) = file.column(sigma_theta_name) else {
        return Err(Error::invalid_conversion(
            mnemonic,
            format!("sigma theta column '{}' not found", sigma_theta_name),
        ));
    };

    let factor = Decimal::new(1, 3);
    let mut converted = Vec::with_capacity(column.len());
    for row in 0..column.len() {
        let Some(value) = numeric_cell(column, row)? else {
            converted.push(None);
            continue;
        };
        let Some(sigma) = sigma_theta.get(row).and_then(Value::as_decimal) else {
            warn!(
                "No {} at row {}, setting {} to missing",
                sigma_theta_name, row, mnemonic
            );
            converted.push(None);
            continue;
        };

        let digits = integral_digits(value) + sigma.scale().min(value.scale());
        let cell = sigma
            .checked_mul(factor)
            .and_then(|scaled| scaled.checked_add(Decimal::ONE))
            .and_then(|denominator| divide(value, denominator, &mnemonic, row))
            .map(|result| Value::Number(round_significant(result, digits)));
        converted.push(cell);
    }

    column.values = converted;
    column.parameter.unit = Some(context.target.clone());
    Ok(())
}

/// Helium and neon 10^-5 CC/KG to NMOL/KG (divide by 2.2415)
pub fn cc_per_kilogram_e_neg_5_to_nanomole_per_kilogram(
    _file: &DataFile,
    column: &mut Column,
    context: &ConversionContext,
) -> Result<()> {
    let mut converted = Vec::with_capacity(column.len());
    for row in 0..column.len() {
        let cell = numeric_cell(column, row)?.map(|value| {
            let digits = integral_digits(value) + value.scale();
            Value::Number(round_significant(value / NOBLE_GAS_MOLAR_VOLUME, digits))
        });
        converted.push(cell);
    }

    column.values = converted;
    column.parameter.unit = Some(context.target.clone());
    Ok(())
}

/// Numeric value of a cell; text cannot be converted
fn numeric_cell(column: &Column, row: usize) -> Result<Option<Decimal>> {
    match column.get(row) {
        None => Ok(None),
        Some(Value::Number(value)) => Ok(Some(*value)),
        Some(other) => Err(Error::invalid_conversion(
            column.mnemonic(),
            format!("non-numeric value '{}' at row {}", other, row),
        )),
    }
}

/// `value / denominator`, or `None` with a warning when the quotient does
/// not exist (zero density) or does not fit a decimal
fn divide(value: Decimal, denominator: Decimal, mnemonic: &str, row: usize) -> Option<Decimal> {
    let quotient = value.checked_div(denominator);
    if quotient.is_none() {
        warn!(
            "Cannot divide {} by {} at row {}, setting {} to missing",
            value, denominator, row, mnemonic
        );
    }
    quotient
}

fn is_missing(value: Decimal, context: &ConversionContext) -> bool {
    value.to_f64().is_some_and(|v| v < context.options.missing_threshold)
}

fn decimal_from(value: f64, mnemonic: &str) -> Result<Decimal> {
    Decimal::from_f64(value).ok_or_else(|| {
        Error::invalid_conversion(mnemonic, format!("density {} is not representable", value))
    })
}

/// First listed column holding a number at `row`
fn first_number(file: &DataFile, columns: &[String], row: usize) -> Option<f64> {
    columns
        .iter()
        .filter_map(|name| file.column(name))
        .find_map(|column| column.get(row).and_then(Value::as_f64))
}

fn salinity_at(file: &DataFile, context: &ConversionContext, row: usize) -> f64 {
    let options = &context.options;
    match first_number(file, &options.salinity_columns, row) {
        None => options.approximation_salinity,
        Some(salinity) if salinity <= 0.0 => options.approximation_salinity,
        Some(salinity) => {
            let (low, high) = SANE_SALINITY_RANGE;
            if !(low..=high).contains(&salinity) {
                warn!("Salinity ({}) is ridiculous at row {}", salinity, row);
            }
            salinity
        }
    }
}

fn temperature_at(file: &DataFile, context: &ConversionContext, row: usize) -> f64 {
    let options = &context.options;
    match first_number(file, &options.temperature_columns, row) {
        Some(temperature) if temperature > options.missing_threshold => temperature,
        _ => {
            warn!(
                "Temperature is missing. Using {} at row {}",
                options.approximation_temperature, row
            );
            options.approximation_temperature
        }
    }
}
