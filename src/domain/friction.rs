// Friction coefficient reference tables and interpolation policy
use crate::domain::parameters::DiameterClass;
use std::sync::LazyLock;

/// One tabulated operating point: per-line flow (bpm) and friction loss
/// coefficient (kg/cm² per km of line).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionTableRow {
    pub bpm: f64,
    pub coefficient: f64,
}

const fn row(bpm: f64, coefficient: f64) -> FrictionTableRow {
    FrictionTableRow { bpm, coefficient }
}

const TEN_INCH_ROWS: [FrictionTableRow; 16] = [
    row(5.0, 0.027),
    row(10.0, 0.099),
    row(15.0, 0.209),
    row(20.0, 0.356),
    row(25.0, 0.538),
    row(30.0, 0.754),
    row(35.0, 1.004),
    row(40.0, 1.284),
    row(45.0, 1.597),
    row(50.0, 1.940),
    row(55.0, 2.313),
    row(60.0, 2.719),
    row(65.0, 3.153),
    row(70.0, 3.616),
    row(75.0, 4.109),
    row(80.0, 4.629),
];

const TWELVE_INCH_ROWS: [FrictionTableRow; 10] = [
    row(10.0, 0.041),
    row(20.0, 0.147),
    row(30.0, 0.310),
    row(40.0, 0.528),
    row(50.0, 0.798),
    row(60.0, 1.119),
    row(70.0, 1.488),
    row(80.0, 1.905),
    row(90.0, 2.369),
    row(100.0, 2.878),
];

/// Per-diameter tables, each sorted ascending by flow.
#[derive(Debug)]
pub struct FrictionTables {
    ten_inch: Vec<FrictionTableRow>,
    twelve_inch: Vec<FrictionTableRow>,
}

impl FrictionTables {
    fn load() -> Self {
        let sorted = |rows: &[FrictionTableRow]| {
            let mut rows = rows.to_vec();
            rows.sort_by(|a, b| a.bpm.total_cmp(&b.bpm));
            rows
        };
        Self {
            ten_inch: sorted(&TEN_INCH_ROWS),
            twelve_inch: sorted(&TWELVE_INCH_ROWS),
        }
    }

    pub fn rows(&self, diameter: DiameterClass) -> &[FrictionTableRow] {
        match diameter {
            DiameterClass::TenInch => &self.ten_inch,
            DiameterClass::TwelveInch => &self.twelve_inch,
        }
    }
}

static FRICTION_TABLES: LazyLock<FrictionTables> = LazyLock::new(FrictionTables::load);

pub fn friction_tables() -> &'static FrictionTables {
    &FRICTION_TABLES
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interpolation {
    pub coefficient: Option<f64>,
    pub message: Option<String>,
}

/// Look up the friction coefficient for a per-line flow.
///
/// Exact table hits are returned as tabulated; flows between rows are linearly
/// interpolated and rounded to 3 decimals. Flows outside the table yield no
/// coefficient and a message describing the valid range.
pub fn interpolate(diameter: DiameterClass, bpm: f64) -> Interpolation {
    let rows = friction_tables().rows(diameter);
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Interpolation {
            coefficient: None,
            message: Some(format!("no friction table for {} lines", diameter)),
        };
    };

    if bpm < first.bpm {
        return Interpolation {
            coefficient: None,
            message: Some(format!(
                "flow of {:.2} bpm per line is below the {} table range ({}-{} bpm)",
                bpm, diameter, first.bpm, last.bpm
            )),
        };
    }
    if bpm > last.bpm {
        return Interpolation {
            coefficient: None,
            message: Some(format!(
                "flow of {:.2} bpm per line exceeds the {} table range ({}-{} bpm); \
                 add parallel lines or reduce the flow rate",
                bpm, diameter, first.bpm, last.bpm
            )),
        };
    }

    if let Some(exact) = rows.iter().find(|r| r.bpm == bpm) {
        return Interpolation {
            coefficient: Some(exact.coefficient),
            message: None,
        };
    }

    let upper_idx = rows.partition_point(|r| r.bpm < bpm);
    let lo = rows[upper_idx - 1];
    let hi = rows[upper_idx];
    let coefficient =
        lo.coefficient + (bpm - lo.bpm) / (hi.bpm - lo.bpm) * (hi.coefficient - lo.coefficient);

    Interpolation {
        coefficient: Some(round_to(coefficient, 3)),
        message: None,
    }
}

/// Coefficient of the table row nearest to an out-of-range flow.
pub fn boundary_coefficient(diameter: DiameterClass, bpm: f64) -> Option<f64> {
    let rows = friction_tables().rows(diameter);
    let first = rows.first()?;
    let last = rows.last()?;
    if bpm <= first.bpm {
        Some(first.coefficient)
    } else {
        Some(last.coefficient)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
