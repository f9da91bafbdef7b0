use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::cpl::NameValueList;
use crate::errors::{RasterError, Result};

/// Key/value pairs of options for passing creation flags to
/// [`Driver::create_with_band_type_with_options`](crate::Driver::create_with_band_type_with_options).
///
/// Recognized keys:
///
/// * `INTERLEAVE`: `BAND` (default) or `PIXEL`, see [`Interleave`].
///
/// Other keys are ignored with a warning.
pub type RasterCreationOptions = NameValueList;

/// Storage layout of the bands created together with a dataset.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Interleave {
    /// Each band owns a separate contiguous buffer.
    #[default]
    Band,
    /// All bands share one buffer, samples of one pixel adjacent.
    Pixel,
}

impl Interleave {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interleave::Band => "BAND",
            Interleave::Pixel => "PIXEL",
        }
    }

    /// Read the `INTERLEAVE` key of `options`.
    pub(crate) fn from_options(options: &RasterCreationOptions) -> Result<Self> {
        for (key, value) in options.iter() {
            if !key.eq_ignore_ascii_case("INTERLEAVE") {
                log::warn!("creation option {key}={value} is not supported and was ignored");
            }
        }
        options
            .fetch_name_value("INTERLEAVE")
            .map_or(Ok(Interleave::Band), str::parse)
    }
}

impl Display for Interleave {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interleave {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("BAND") {
            Ok(Interleave::Band)
        } else if s.eq_ignore_ascii_case("PIXEL") {
            Ok(Interleave::Pixel)
        } else {
            Err(RasterError::BadArgument(format!(
                "INTERLEAVE={s} is not one of BAND or PIXEL"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_options() {
        let opts = RasterCreationOptions::from(&[("INTERLEAVE", "pixel")]);
        assert_eq!(Interleave::from_options(&opts).unwrap(), Interleave::Pixel);

        let opts = RasterCreationOptions::from(&[("COMPRESS", "LZW")]);
        assert_eq!(Interleave::from_options(&opts).unwrap(), Interleave::Band);

        let opts = RasterCreationOptions::from(&[("INTERLEAVE", "LINE")]);
        assert!(matches!(
            Interleave::from_options(&opts),
            Err(RasterError::BadArgument(_))
        ));
    }
}
