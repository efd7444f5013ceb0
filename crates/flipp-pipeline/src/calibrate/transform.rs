//! Reference-catalog magnitudes in the image's passband.
//!
//! Sloan magnitudes are converted with the Lupton (2005) relations; Johnson
//! B and V are used as-is. Clear-filter images are calibrated against R.

use flipp_core::enums::Passband;
use flipp_refcat::{Band, ReferenceStar};

use crate::error::PipelineError;

/// How to obtain a reference magnitude for one passband.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassbandTransform {
    /// `R = r - 0.1837 (g - r) - 0.0971`
    SloanToR,
    /// `I = r - 1.2444 (r - i) - 0.3820`
    SloanToI,
    JohnsonB,
    JohnsonV,
}

impl PassbandTransform {
    /// # Errors
    ///
    /// `PipelineError::ImageFailed` for a passband with no transform.
    pub fn for_passband(passband: &Passband) -> Result<Self, PipelineError> {
        match passband {
            Passband::Clear | Passband::R => Ok(Self::SloanToR),
            Passband::I => Ok(Self::SloanToI),
            Passband::B => Ok(Self::JohnsonB),
            Passband::V => Ok(Self::JohnsonV),
            Passband::Other(name) => Err(PipelineError::ImageFailed(format!(
                "passband not implemented: {name}"
            ))),
        }
    }

    /// Systematic RMS error of the transform, magnitudes.
    #[must_use]
    pub const fn sigma(self) -> f64 {
        match self {
            Self::SloanToR => 0.0106,
            Self::SloanToI => 0.0078,
            Self::JohnsonB | Self::JohnsonV => 0.0,
        }
    }

    /// The star's magnitude in the target passband, if it has the inputs.
    #[must_use]
    pub fn reference_magnitude(self, star: &ReferenceStar) -> Option<f64> {
        match self {
            Self::SloanToR => {
                let g = star.magnitude(Band::SloanG)?;
                let r = star.magnitude(Band::SloanR)?;
                Some(r - 0.1837 * (g - r) - 0.0971)
            }
            Self::SloanToI => {
                let r = star.magnitude(Band::SloanR)?;
                let i = star.magnitude(Band::SloanI)?;
                Some(r - 1.2444 * (r - i) - 0.3820)
            }
            Self::JohnsonB => star.magnitude(Band::JohnsonB),
            Self::JohnsonV => star.magnitude(Band::JohnsonV),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn star() -> ReferenceStar {
        ReferenceStar {
            johnson_b: Some(15.8),
            johnson_v: Some(15.1),
            sloan_g: Some(15.0),
            sloan_r: Some(14.5),
            sloan_i: Some(14.2),
            ..ReferenceStar::at(10.0, 10.0)
        }
    }

    #[rstest]
    #[case(Passband::Clear, 14.311_05, 0.0106)]
    #[case(Passband::R, 14.311_05, 0.0106)]
    #[case(Passband::I, 13.744_68, 0.0078)]
    #[case(Passband::B, 15.8, 0.0)]
    #[case(Passband::V, 15.1, 0.0)]
    fn transforms_are_fixed(#[case] passband: Passband, #[case] mag: f64, #[case] sigma: f64) {
        let transform = PassbandTransform::for_passband(&passband).unwrap();
        let got = transform.reference_magnitude(&star()).unwrap();
        assert!((got - mag).abs() < 1e-9, "{passband}: {got} != {mag}");
        assert!((transform.sigma() - sigma).abs() < f64::EPSILON);
    }

    #[test]
    fn transform_is_deterministic() {
        let t = PassbandTransform::SloanToR;
        assert_eq!(
            t.reference_magnitude(&star()).map(f64::to_bits),
            t.reference_magnitude(&star()).map(f64::to_bits)
        );
    }

    #[test]
    fn missing_inputs_yield_none() {
        let star = ReferenceStar {
            sloan_r: Some(14.5),
            ..ReferenceStar::at(0.0, 0.0)
        };
        assert_eq!(PassbandTransform::SloanToR.reference_magnitude(&star), None);
        assert_eq!(PassbandTransform::JohnsonV.reference_magnitude(&star), None);
    }

    #[test]
    fn unknown_passband_fails_the_image() {
        let err = PassbandTransform::for_passband(&Passband::Other("Halpha".into())).unwrap_err();
        assert!(matches!(err, PipelineError::ImageFailed(msg) if msg.contains("passband not implemented")));
    }
}
