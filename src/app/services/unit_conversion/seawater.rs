//! UNESCO (1981) equation of state of seawater at one atmosphere
//!
//! Millero & Poisson (1981). Salinity in PSS-78, temperature in degrees C.

/// Density of pure water in kg/m^3
fn pure_water_density(t: f64) -> f64 {
    999.842594 + 6.793952e-2 * t - 9.095290e-3 * t.powi(2) + 1.001685e-4 * t.powi(3)
        - 1.120083e-6 * t.powi(4)
        + 6.536336e-9 * t.powi(5)
}

/// Density of seawater at zero gauge pressure in kg/m^3
pub fn density(salinity: f64, temperature: f64) -> f64 {
    let s = salinity;
    let t = temperature;

    let a = 8.24493e-1 - 4.0899e-3 * t + 7.6438e-5 * t.powi(2) - 8.2467e-7 * t.powi(3)
        + 5.3875e-9 * t.powi(4);
    let b = -5.72466e-3 + 1.0227e-4 * t - 1.6546e-6 * t.powi(2);
    let c = 4.8314e-4;

    pure_water_density(t) + a * s + b * s.powf(1.5) + c * s.powi(2)
}

/// Density anomaly `rho(S, T, 0) - 1000` in kg/m^3
pub fn sigma(salinity: f64, temperature: f64) -> f64 {
    density(salinity, temperature) - 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    // UNESCO Technical Papers in Marine Science 44, check values at p = 0
    #[test]
    fn test_check_values() {
        assert!((density(0.0, 5.0) - 999.96675).abs() < 1e-4);
        assert!((density(35.0, 5.0) - 1027.67547).abs() < 1e-4);
        assert!((density(35.0, 25.0) - 1023.34306).abs() < 1e-4);
    }

    #[test]
    fn test_sigma_increases_with_salinity() {
        assert!(sigma(35.0, 10.0) > sigma(34.0, 10.0));
        assert!(sigma(35.0, 10.0) > sigma(35.0, 20.0));
        assert!((sigma(35.0, 10.0) - 26.9520).abs() < 1e-3);
    }
}
