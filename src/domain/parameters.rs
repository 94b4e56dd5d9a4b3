// Hydraulic parameters - Validated pumping configuration for one calculation run
use crate::domain::error::ProfileError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// m³/h to barrels per minute.
pub const M3H_TO_BPM: f64 = 0.1048;

const MAX_FLOW_RATE_M3H: f64 = 1000.0;
const MIN_PUMPING_PRESSURE_KGCM2: f64 = 1.0;
const MAX_PUMPING_PRESSURE_KGCM2: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiameterClass {
    TenInch,
    TwelveInch,
}

impl DiameterClass {
    pub fn inches(&self) -> u32 {
        match self {
            DiameterClass::TenInch => 10,
            DiameterClass::TwelveInch => 12,
        }
    }
}

impl fmt::Display for DiameterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\"", self.inches())
    }
}

impl FromStr for DiameterClass {
    type Err = ProfileError;

    /// Accepts "10", "12", with an optional inch mark, or the enum names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().trim_end_matches('"').trim_end_matches("in").trim();
        match normalized.to_ascii_lowercase().as_str() {
            "10" | "ten_inch" => Ok(DiameterClass::TenInch),
            "12" | "twelve_inch" => Ok(DiameterClass::TwelveInch),
            _ => Err(ProfileError::InvalidParameters(format!(
                "unsupported diameter '{}', expected 10 or 12 inches",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HydraulicParameters {
    flow_rate_m3h: f64,
    diameter: DiameterClass,
    pumping_pressure_kgcm2: f64,
    number_of_lines: u32,
    calculation_interval_m: f64,
}

impl HydraulicParameters {
    pub fn new(
        flow_rate_m3h: f64,
        diameter: DiameterClass,
        pumping_pressure_kgcm2: f64,
        number_of_lines: u32,
        calculation_interval_m: f64,
    ) -> Result<Self, ProfileError> {
        if !flow_rate_m3h.is_finite() || flow_rate_m3h <= 0.0 || flow_rate_m3h > MAX_FLOW_RATE_M3H {
            return Err(ProfileError::InvalidParameters(format!(
                "flow rate {} m³/h must be in (0, {}]",
                flow_rate_m3h, MAX_FLOW_RATE_M3H
            )));
        }
        let pressure_range = MIN_PUMPING_PRESSURE_KGCM2..=MAX_PUMPING_PRESSURE_KGCM2;
        if !pressure_range.contains(&pumping_pressure_kgcm2) {
            return Err(ProfileError::InvalidParameters(format!(
                "pumping pressure {} kg/cm² must be in [{}, {}]",
                pumping_pressure_kgcm2, MIN_PUMPING_PRESSURE_KGCM2, MAX_PUMPING_PRESSURE_KGCM2
            )));
        }
        if number_of_lines < 1 {
            return Err(ProfileError::InvalidParameters(
                "number of lines must be at least 1".to_string(),
            ));
        }
        if !calculation_interval_m.is_finite() || calculation_interval_m <= 0.0 {
            return Err(ProfileError::InvalidParameters(format!(
                "calculation interval {} m must be positive",
                calculation_interval_m
            )));
        }

        Ok(Self {
            flow_rate_m3h,
            diameter,
            pumping_pressure_kgcm2,
            number_of_lines,
            calculation_interval_m,
        })
    }

    pub fn diameter(&self) -> DiameterClass {
        self.diameter
    }

    pub fn pumping_pressure_kgcm2(&self) -> f64 {
        self.pumping_pressure_kgcm2
    }

    pub fn number_of_lines(&self) -> u32 {
        self.number_of_lines
    }

    pub fn calculation_interval_m(&self) -> f64 {
        self.calculation_interval_m
    }

    /// Per-line flow in the unit the friction tables are indexed by.
    pub fn line_normalized_flow(&self) -> f64 {
        self.flow_rate_m3h * M3H_TO_BPM / self.number_of_lines as f64
    }
}

/// Unvalidated parameters as they arrive from JSON bodies or query strings.
#[derive(Debug, Clone, Deserialize)]
pub struct HydraulicParametersInput {
    pub flow_rate_m3h: f64,
    pub diameter: String,
    pub pumping_pressure_kgcm2: f64,
    #[serde(default = "default_number_of_lines")]
    pub number_of_lines: u32,
    pub calculation_interval_m: f64,
}

fn default_number_of_lines() -> u32 {
    1
}

impl TryFrom<HydraulicParametersInput> for HydraulicParameters {
    type Error = ProfileError;

    fn try_from(input: HydraulicParametersInput) -> Result<Self, Self::Error> {
        HydraulicParameters::new(
            input.flow_rate_m3h,
            input.diameter.parse()?,
            input.pumping_pressure_kgcm2,
            input.number_of_lines,
            input.calculation_interval_m,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_diameter_labels() {
        assert_eq!("12".parse::<DiameterClass>().unwrap(), DiameterClass::TwelveInch);
        assert_eq!("10\"".parse::<DiameterClass>().unwrap(), DiameterClass::TenInch);
        assert_eq!("12in".parse::<DiameterClass>().unwrap(), DiameterClass::TwelveInch);
        assert_eq!("TEN_INCH".parse::<DiameterClass>().unwrap(), DiameterClass::TenInch);
        assert!(matches!(
            "8".parse::<DiameterClass>(),
            Err(ProfileError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let build = |flow, pressure, lines, interval| {
            HydraulicParameters::new(flow, DiameterClass::TwelveInch, pressure, lines, interval)
        };

        assert!(build(120.0, 8.0, 1, 50.0).is_ok());
        assert!(build(1000.0, 20.0, 3, 1.0).is_ok());
        assert!(build(0.0, 8.0, 1, 50.0).is_err());
        assert!(build(1000.5, 8.0, 1, 50.0).is_err());
        assert!(build(f64::NAN, 8.0, 1, 50.0).is_err());
        assert!(build(120.0, 0.5, 1, 50.0).is_err());
        assert!(build(120.0, 20.5, 1, 50.0).is_err());
        assert!(build(120.0, 8.0, 0, 50.0).is_err());
        assert!(build(120.0, 8.0, 1, 0.0).is_err());
    }

    #[test]
    fn test_line_normalized_flow() {
        let params = HydraulicParameters::new(500.0, DiameterClass::TenInch, 2.0, 2, 50.0).unwrap();
        assert!((params.line_normalized_flow() - 26.2).abs() < 1e-9);
    }

    #[test]
    fn test_input_conversion() {
        let input: HydraulicParametersInput = serde_json::from_value(serde_json::json!({
            "flow_rate_m3h": 120.0,
            "diameter": "12",
            "pumping_pressure_kgcm2": 8.0,
            "calculation_interval_m": 50.0
        }))
        .unwrap();

        let params = HydraulicParameters::try_from(input).unwrap();
        assert_eq!(params.number_of_lines(), 1);
        assert_eq!(params.diameter(), DiameterClass::TwelveInch);
    }
}
