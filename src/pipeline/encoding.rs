use serde::Deserialize;

use crate::common::Grid;

/// Supported model input shapes, one conversion per variant.
///
/// The variant is picked by configuration, not inferred per call, so the
/// engine encodes every cycle the same way.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEncoding {
    /// Raw cell values, row-major.
    Flat,
    /// Zero-mean, unit-variance cell values.
    Normalized,
    /// Each cell discretized into `classes` buckets, one-hot per cell.
    OneHot { classes: usize },
}

impl Default for InputEncoding {
    fn default() -> Self {
        InputEncoding::Flat
    }
}

impl InputEncoding {
    pub fn encode(&self, grid: &Grid) -> Vec<f32> {
        match self {
            InputEncoding::Flat => encode_flat(grid),
            InputEncoding::Normalized => encode_normalized(grid),
            InputEncoding::OneHot { classes } => encode_one_hot(grid, *classes),
        }
    }
}

fn encode_flat(grid: &Grid) -> Vec<f32> {
    grid.cells().to_vec()
}

fn encode_normalized(grid: &Grid) -> Vec<f32> {
    let cells = grid.cells();
    let n = cells.len() as f32;
    let mean = cells.iter().sum::<f32>() / n;
    let variance = cells.iter().map(|c| (c - mean).powi(2)).sum::<f32>() / n;
    let std_dev = variance.sqrt();
    if std_dev < f32::EPSILON {
        return vec![0.0; cells.len()];
    }
    cells.iter().map(|c| (c - mean) / std_dev).collect()
}

fn encode_one_hot(grid: &Grid, classes: usize) -> Vec<f32> {
    let classes = classes.max(1);
    let mut features = vec![0.0; grid.cells().len() * classes];
    for (i, &cell) in grid.cells().iter().enumerate() {
        let bucket = ((cell.clamp(0.0, 1.0) * classes as f32) as usize).min(classes - 1);
        features[i * classes + bucket] = 1.0;
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Grid {
        Grid::new(2, 2, vec![0.0, 0.25, 0.5, 1.0])
    }

    #[test]
    fn flat_is_a_passthrough() {
        assert_eq!(
            InputEncoding::Flat.encode(&grid()),
            vec![0.0, 0.25, 0.5, 1.0]
        );
    }

    #[test]
    fn normalized_output_is_zero_mean() {
        let features = InputEncoding::Normalized.encode(&grid());
        let mean: f32 = features.iter().sum::<f32>() / features.len() as f32;
        assert!(mean.abs() < 1e-6);
    }

    #[test]
    fn normalized_constant_grid_is_all_zero() {
        let constant = Grid::new(2, 2, vec![0.5; 4]);
        assert_eq!(InputEncoding::Normalized.encode(&constant), vec![0.0; 4]);
    }

    #[test]
    fn one_hot_sets_one_bucket_per_cell() {
        let features = InputEncoding::OneHot { classes: 4 }.encode(&grid());
        assert_eq!(features.len(), 16);
        for cell in features.chunks(4) {
            assert_eq!(cell.iter().filter(|&&f| f == 1.0).count(), 1);
        }
        // 1.0 lands in the top bucket, not out of range.
        assert_eq!(features[12..16], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn encoding_deserializes_from_tagged_config() {
        let encoding: InputEncoding =
            serde_json::from_str(r#"{"kind": "one_hot", "classes": 13}"#).unwrap();
        assert_eq!(encoding, InputEncoding::OneHot { classes: 13 });
    }
}
