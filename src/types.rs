use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Bumped whenever the column set or order below changes.
pub const SCHEMA_VERSION: u32 = 1;

pub const N_FEATURES: usize = 12;
pub const N_SCALED: usize = 10;

/// Column order the scaler and model were fit with.
pub const FEATURE_COLUMNS: [&str; N_FEATURES] = [
    "X", "Y", "month", "day", "FFMC", "DMC", "DC", "ISI", "temp", "RH", "wind", "rain",
];

/// Columns handed to the scaler, in its fit-time order.
pub const SCALED_COLUMNS: [&str; N_SCALED] = [
    "X", "Y", "FFMC", "DMC", "DC", "ISI", "temp", "RH", "wind", "rain",
];

/// Positions of `SCALED_COLUMNS` inside `FEATURE_COLUMNS`.
pub const SCALED_INDICES: [usize; N_SCALED] = [0, 1, 4, 5, 6, 7, 8, 9, 10, 11];

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeatureSchema {
    pub version: u32,
    pub features: &'static [&'static str],
    pub scaled: &'static [&'static str],
}

impl FeatureSchema {
    pub fn current() -> Self {
        Self {
            version: SCHEMA_VERSION,
            features: &FEATURE_COLUMNS,
            scaled: &SCALED_COLUMNS,
        }
    }

    pub fn check_features(&self, artifact: &'static str, names: &[String]) -> Result<()> {
        check_names(artifact, self.features, names)
    }

    pub fn check_scaled(&self, artifact: &'static str, names: &[String]) -> Result<()> {
        check_names(artifact, self.scaled, names)
    }
}

fn check_names(artifact: &'static str, expected: &[&str], got: &[String]) -> Result<()> {
    if expected.len() != got.len() || expected.iter().zip(got).any(|(e, g)| e != g) {
        return Err(PipelineError::columns(artifact, expected, got));
    }
    Ok(())
}

/// One submitted record. Every field is required; unknown keys are rejected
/// so a misspelt column can never fall back to some other value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawInput {
    #[serde(rename = "X")]
    pub x: i32,
    #[serde(rename = "Y")]
    pub y: i32,
    pub month: String,
    pub day: String,
    #[serde(rename = "FFMC")]
    pub ffmc: f64,
    #[serde(rename = "DMC")]
    pub dmc: f64,
    #[serde(rename = "DC")]
    pub dc: f64,
    #[serde(rename = "ISI")]
    pub isi: f64,
    pub temp: f64,
    #[serde(rename = "RH")]
    pub rh: f64,
    pub wind: f64,
    pub rain: f64,
}

/// Form defaults; used for the startup warmup, never to fill a request.
impl Default for RawInput {
    fn default() -> Self {
        Self {
            x: 5,
            y: 5,
            month: "jan".to_string(),
            day: "mon".to_string(),
            ffmc: 90.0,
            dmc: 100.0,
            dc: 500.0,
            isi: 10.0,
            temp: 20.0,
            rh: 50.0,
            wind: 4.0,
            rain: 0.0,
        }
    }
}

/// `RawInput` with `month`/`day` replaced by their codes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EncodedRecord {
    #[serde(rename = "X")]
    pub x: i32,
    #[serde(rename = "Y")]
    pub y: i32,
    pub month: u8,
    pub day: u8,
    #[serde(rename = "FFMC")]
    pub ffmc: f64,
    #[serde(rename = "DMC")]
    pub dmc: f64,
    #[serde(rename = "DC")]
    pub dc: f64,
    #[serde(rename = "ISI")]
    pub isi: f64,
    pub temp: f64,
    #[serde(rename = "RH")]
    pub rh: f64,
    pub wind: f64,
    pub rain: f64,
}

impl EncodedRecord {
    /// Values in `FEATURE_COLUMNS` order.
    pub fn to_row(&self) -> [f64; N_FEATURES] {
        [
            self.x as f64,
            self.y as f64,
            self.month as f64,
            self.day as f64,
            self.ffmc,
            self.dmc,
            self.dc,
            self.isi,
            self.temp,
            self.rh,
            self.wind,
            self.rain,
        ]
    }

    /// Values in `SCALED_COLUMNS` order.
    pub fn numeric_columns(&self) -> [f64; N_SCALED] {
        let row = self.to_row();
        SCALED_INDICES.map(|i| row[i])
    }
}

/// Full twelve-column row after scaling; `month` and `day` keep their codes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaledRecord {
    row: [f64; N_FEATURES],
}

impl ScaledRecord {
    pub fn from_encoded(encoded: &EncodedRecord, scaled: &[f64]) -> Result<Self> {
        if scaled.len() != N_SCALED {
            return Err(PipelineError::width("scaler output", N_SCALED, scaled.len()));
        }
        let mut row = encoded.to_row();
        for (&idx, &v) in SCALED_INDICES.iter().zip(scaled) {
            row[idx] = v;
        }
        Ok(Self { row })
    }

    pub fn as_row(&self) -> &[f64; N_FEATURES] {
        &self.row
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.row[i])
    }
}

/// Predicted burned area in hectares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub area_ha: f64,
}

impl PredictionResult {
    /// Two decimals plus unit, as shown to the user.
    pub fn display(&self) -> String {
        format!("{:.2} ha", self.area_ha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_indices_match_column_names() {
        for (name, &idx) in SCALED_COLUMNS.iter().zip(SCALED_INDICES.iter()) {
            assert_eq!(FEATURE_COLUMNS[idx], *name);
        }
    }

    const FULL_BODY: &str = r#"{"X": 7, "Y": 4, "month": "aug", "day": "sat",
        "FFMC": 91.5, "DMC": 120.0, "DC": 650.2, "ISI": 8.1, "temp": 25.3,
        "RH": 33.0, "wind": 3.1, "rain": 0.0}"#;

    #[test]
    fn raw_input_uses_wire_names() {
        let raw: RawInput = serde_json::from_str(FULL_BODY).unwrap();
        assert_eq!(raw.x, 7);
        assert_eq!(raw.y, 4);
        assert_eq!(raw.month, "aug");
        assert_eq!(raw.day, "sat");
        assert_eq!(raw.rh, 33.0);
        assert_eq!(raw.temp, 25.3);
    }

    #[test]
    fn raw_input_requires_every_field() {
        assert!(serde_json::from_str::<RawInput>(r#"{"temp": 20.0}"#).is_err());
        let without_month = FULL_BODY.replace(r#""month": "aug", "#, "");
        assert!(serde_json::from_str::<RawInput>(&without_month).is_err());
    }

    #[test]
    fn raw_input_rejects_unknown_keys() {
        let misspelt = FULL_BODY.replace(r#""temp": 25.3"#, r#""temperature": 25.3"#);
        assert!(serde_json::from_str::<RawInput>(&misspelt).is_err());
        let extra = FULL_BODY.replace(r#""rain": 0.0"#, r#""rain": 0.0, "Month": "jan""#);
        assert!(serde_json::from_str::<RawInput>(&extra).is_err());
    }

    #[test]
    fn scaled_record_keeps_category_codes() {
        let enc = EncodedRecord {
            x: 1,
            y: 2,
            month: 3,
            day: 4,
            ffmc: 5.0,
            dmc: 6.0,
            dc: 7.0,
            isi: 8.0,
            temp: 9.0,
            rh: 10.0,
            wind: 11.0,
            rain: 12.0,
        };
        let scaled: Vec<f64> = (0..N_SCALED).map(|i| -(i as f64)).collect();
        let rec = ScaledRecord::from_encoded(&enc, &scaled).unwrap();
        assert_eq!(
            rec.as_row(),
            &[0.0, -1.0, 3.0, 4.0, -2.0, -3.0, -4.0, -5.0, -6.0, -7.0, -8.0, -9.0]
        );
        assert_eq!(rec.get("month"), Some(3.0));
        assert_eq!(rec.get("rain"), Some(-9.0));
        assert_eq!(rec.get("area"), None);
    }

    #[test]
    fn scaled_record_rejects_wrong_width() {
        let enc = EncodedRecord {
            x: 1,
            y: 1,
            month: 0,
            day: 0,
            ffmc: 0.0,
            dmc: 0.0,
            dc: 0.0,
            isi: 0.0,
            temp: 0.0,
            rh: 0.0,
            wind: 0.0,
            rain: 0.0,
        };
        let err = ScaledRecord::from_encoded(&enc, &[0.0; 9]).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
    }

    #[test]
    fn schema_name_check_is_order_sensitive() {
        let schema = FeatureSchema::current();
        let mut names: Vec<String> = SCALED_COLUMNS.iter().map(|s| s.to_string()).collect();
        assert!(schema.check_scaled("scaler", &names).is_ok());
        names.swap(0, 1);
        assert!(schema.check_scaled("scaler", &names).is_err());
        names.pop();
        assert!(schema.check_scaled("scaler", &names).is_err());
    }

    #[test]
    fn display_has_two_decimals_and_unit() {
        assert_eq!(PredictionResult { area_ha: 1.23456 }.display(), "1.23 ha");
        assert_eq!(PredictionResult { area_ha: 0.0 }.display(), "0.00 ha");
    }
}
