use serde::Serialize;

use crate::encoder::{CategoryEncoder, CategoryKind};
use crate::error::Result;
use crate::types::{EncodedRecord, RawInput};

/// Observed span of a numeric input in the training data, plus the form default.
/// Advisory only: values outside the span still reach the model.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct InputDomain {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl InputDomain {
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

pub const INPUT_DOMAINS: [InputDomain; 10] = [
    InputDomain { name: "X", min: 1.0, max: 9.0, default: 5.0 },
    InputDomain { name: "Y", min: 2.0, max: 9.0, default: 5.0 },
    InputDomain { name: "FFMC", min: 18.7, max: 96.2, default: 90.0 },
    InputDomain { name: "DMC", min: 1.1, max: 291.3, default: 100.0 },
    InputDomain { name: "DC", min: 7.9, max: 860.6, default: 500.0 },
    InputDomain { name: "ISI", min: 0.0, max: 56.1, default: 10.0 },
    InputDomain { name: "temp", min: 2.2, max: 33.3, default: 20.0 },
    InputDomain { name: "RH", min: 15.0, max: 100.0, default: 50.0 },
    InputDomain { name: "wind", min: 0.4, max: 9.4, default: 4.0 },
    InputDomain { name: "rain", min: 0.0, max: 6.4, default: 0.0 },
];

pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    /// Encode the categoricals and lay the record out in training column order.
    pub fn build(raw: &RawInput) -> Result<EncodedRecord> {
        let month = CategoryEncoder::encode(CategoryKind::Month, &raw.month)?;
        let day = CategoryEncoder::encode(CategoryKind::Day, &raw.day)?;
        Ok(EncodedRecord {
            x: raw.x,
            y: raw.y,
            month,
            day,
            ffmc: raw.ffmc,
            dmc: raw.dmc,
            dc: raw.dc,
            isi: raw.isi,
            temp: raw.temp,
            rh: raw.rh,
            wind: raw.wind,
            rain: raw.rain,
        })
    }

    /// Numeric fields of `raw` lying outside their advisory domain.
    pub fn out_of_domain(raw: &RawInput) -> Vec<(&'static str, f64)> {
        let values = [
            raw.x as f64,
            raw.y as f64,
            raw.ffmc,
            raw.dmc,
            raw.dc,
            raw.isi,
            raw.temp,
            raw.rh,
            raw.wind,
            raw.rain,
        ];
        INPUT_DOMAINS
            .iter()
            .zip(values)
            .filter(|(d, v)| !d.contains(*v))
            .map(|(d, v)| (d.name, v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::types::SCALED_COLUMNS;

    fn sample() -> RawInput {
        RawInput {
            x: 5,
            y: 4,
            month: "mar".into(),
            day: "fri".into(),
            ffmc: 90.0,
            dmc: 100.0,
            dc: 500.0,
            isi: 10.0,
            temp: 20.0,
            rh: 50.0,
            wind: 4.0,
            rain: 0.5,
        }
    }

    #[test]
    fn row_follows_training_column_order() {
        let enc = FeatureVectorBuilder::build(&sample()).unwrap();
        assert_eq!(
            enc.to_row(),
            [5.0, 4.0, 2.0, 4.0, 90.0, 100.0, 500.0, 10.0, 20.0, 50.0, 4.0, 0.5]
        );
        assert_eq!(
            enc.numeric_columns(),
            [5.0, 4.0, 90.0, 100.0, 500.0, 10.0, 20.0, 50.0, 4.0, 0.5]
        );
    }

    #[test]
    fn serialized_keys_follow_training_column_order() {
        let enc = FeatureVectorBuilder::build(&sample()).unwrap();
        let json = serde_json::to_string(&enc).unwrap();
        let mut last = 0;
        for col in crate::types::FEATURE_COLUMNS {
            let pos = json.find(&format!("\"{col}\":")).unwrap();
            assert!(pos >= last, "{col} out of order in {json}");
            last = pos;
        }
    }

    #[test]
    fn unknown_day_propagates() {
        let mut raw = sample();
        raw.day = "funday".into();
        let err = FeatureVectorBuilder::build(&raw).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownCategory { kind: CategoryKind::Day, .. }));
    }

    #[test]
    fn domains_cover_every_scaled_column() {
        let names: Vec<_> = INPUT_DOMAINS.iter().map(|d| d.name).collect();
        assert_eq!(names, SCALED_COLUMNS);
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let mut raw = sample();
        raw.temp = 45.0;
        raw.x = 0;
        let enc = FeatureVectorBuilder::build(&raw).unwrap();
        assert_eq!(enc.temp, 45.0);
        assert_eq!(
            FeatureVectorBuilder::out_of_domain(&raw),
            vec![("X", 0.0), ("temp", 45.0)]
        );
        assert!(FeatureVectorBuilder::out_of_domain(&sample()).is_empty());
    }

    #[test]
    fn defaults_sit_inside_domains() {
        assert!(FeatureVectorBuilder::out_of_domain(&RawInput::default()).is_empty());
        for d in INPUT_DOMAINS {
            assert!(d.contains(d.default), "{}", d.name);
        }
    }
}
