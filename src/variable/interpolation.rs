use std::fmt;

use crate::job::artifact::VariableId;
use crate::variable::VariableMeta;

/// Regridding algorithm, named after the CDO `remap*` operator suffix
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Bilinear,
    Conservative,
    Nearest,
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Interpolation::Bilinear => write!(f, "bil"),
            Interpolation::Conservative => write!(f, "con"),
            Interpolation::Nearest => write!(f, "nn"),
        }
    }
}

pub trait InterpolationSelector {
    fn select(&self, meta: &VariableMeta, variable: &VariableId) -> Interpolation;
}

/// Conservative remapping for fluxes and accumulations, bilinear for everything else
#[derive(Debug, Default)]
pub struct UnitInterpolationSelector;

impl InterpolationSelector for UnitInterpolationSelector {
    fn select(&self, meta: &VariableMeta, _variable: &VariableId) -> Interpolation {
        let units = meta.units.as_str();
        let flux = units.contains("m-2 s-1") || units.contains("/day") || units == "mm";
        match flux {
            true => Interpolation::Conservative,
            false => Interpolation::Bilinear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precipitation_is_remapped_conservatively() {
        let selector = UnitInterpolationSelector;
        let meta = VariableMeta::new("pr", "kg m-2 s-1");
        assert_eq!(selector.select(&meta, &"Precipitation".into()), Interpolation::Conservative);
    }

    #[test]
    fn temperature_is_remapped_bilinearly() {
        let selector = UnitInterpolationSelector;
        let meta = VariableMeta::new("tas", "degC");
        assert_eq!(selector.select(&meta, &"Temperature".into()), Interpolation::Bilinear);
        assert_eq!(Interpolation::Bilinear.to_string(), "bil");
    }
}
