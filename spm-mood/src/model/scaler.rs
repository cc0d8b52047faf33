//! Feature standardisation

use super::artifact::ScalerParams;
use super::{ModelError, ModelLoadError};
use crate::features::{FeatureVector, FEATURE_COUNT};

/// Elementwise `(x - mean) / scale`
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    /// Validate artifact parameters
    ///
    /// A zero scale (constant training feature) is replaced by 1 so the
    /// feature passes through centred but unscaled.
    pub fn from_params(params: &ScalerParams) -> Result<Self, ModelLoadError> {
        let mean = to_array("mean", &params.mean)?;
        let mut scale = to_array("scale", &params.scale)?;
        for s in scale.iter_mut() {
            if *s == 0.0 {
                *s = 1.0;
            }
        }
        Ok(Self { mean, scale })
    }

    pub fn transform(&self, features: &FeatureVector) -> Result<[f64; FEATURE_COUNT], ModelError> {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, &x) in features.values().iter().enumerate() {
            if !x.is_finite() {
                return Err(ModelError::NonFiniteInput { index: i });
            }
            out[i] = (x - self.mean[i]) / self.scale[i];
        }
        Ok(out)
    }
}

fn to_array(name: &str, values: &[f64]) -> Result<[f64; FEATURE_COUNT], ModelLoadError> {
    let array: [f64; FEATURE_COUNT] = values.try_into().map_err(|_| {
        ModelLoadError::Scaler(format!(
            "{} has {} entries, expected {}",
            name,
            values.len(),
            FEATURE_COUNT
        ))
    })?;
    if let Some(i) = array.iter().position(|v| !v.is_finite()) {
        return Err(ModelLoadError::Scaler(format!("{}[{}] is not finite", name, i)));
    }
    Ok(array)
}
