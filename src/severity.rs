use crate::stats::CountryStat;
use chrono::{DateTime, TimeZone};
use glam::DVec3;
use serde::Deserialize;
use std::fmt;

/// Which per-country value is normalized into a severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeverityBasis {
    /// Raw cumulative cases
    #[default]
    Cases,
    /// Cases per one million inhabitants
    CasesPerMillion,
}

impl SeverityBasis {
    pub fn value(self, stat: &CountryStat) -> f64 {
        match self {
            SeverityBasis::Cases => stat.cases as f64,
            SeverityBasis::CasesPerMillion => stat.cases_per_one_million,
        }
    }
}

/// Observed minimum and maximum across one fetched data set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizationRange {
    pub min: f64,
    pub max: f64,
}

impl NormalizationRange {
    /// Single linear scan; `None` for an empty set
    pub fn scan(stats: &[CountryStat], basis: SeverityBasis) -> Option<Self> {
        let mut values = stats.iter().map(|s| basis.value(s));
        let first = values.next()?;
        Some(values.fold(Self { min: first, max: first }, |range, v| Self {
            min: range.min.min(v),
            max: range.max.max(v),
        }))
    }

    /// Position of `value` in [0, 1]. A flat range (max == min) maps
    /// everything to 0, the low-severity end.
    pub fn position(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

/// An sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn to_dvec3(self) -> DVec3 {
        DVec3::new(self.0 as f64, self.1 as f64, self.2 as f64)
    }

    fn from_dvec3(v: DVec3) -> Self {
        let v = v.round().clamp(DVec3::ZERO, DVec3::splat(255.0));
        Self(v.x as u8, v.y as u8, v.z as u8)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.0, self.1, self.2)
    }
}

/// Endpoint colors for the severity gradient
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    /// Color at severity 1 (muted red)
    pub high: Rgb,
    /// Color at severity 0 (pale pink)
    pub low: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            high: Rgb(186, 83, 112),
            low: Rgb(244, 226, 216),
        }
    }
}

impl Palette {
    /// Per-channel `round(high * p + low * (1 - p))`
    pub fn blend(&self, p: f64) -> Rgb {
        let w1 = p.clamp(0.0, 1.0);
        let w2 = 1.0 - w1;
        Rgb::from_dvec3(self.high.to_dvec3() * w1 + self.low.to_dvec3() * w2)
    }
}

/// Marker label: counts above 1000 drop their last three digits and gain
/// a `k+` suffix. Truncates, never rounds (1999 -> "1k+").
pub fn case_label(cases: u64) -> String {
    if cases > 1000 {
        format!("{}k+", cases / 1000)
    } else {
        cases.to_string()
    }
}

/// Format an epoch-millisecond timestamp like `4/12/2020, 3:04:05 PM`
pub fn format_updated<Tz>(updated_ms: i64, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let utc = DateTime::from_timestamp_millis(updated_ms)?;
    Some(
        utc.with_timezone(tz)
            .format("%-m/%-d/%Y, %-I:%M:%S %p")
            .to_string(),
    )
}
