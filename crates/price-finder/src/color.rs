/// Highlight classification for price cells.
///
/// Tuned for highlighter-style cell backgrounds: bright, moderately saturated greens
/// and yellows. Text colors are normally too dark to pass the brightness gates.
use pricing_common::model::Highlight;

use crate::error::AppError;

/// Channels below this maximum are too dark to be a highlight.
const MIN_MAX_CHANNEL: f64 = 0.5;
/// HSV value must be strictly above this.
const MIN_VALUE: f64 = 0.75;

/// An RGB color sample with channels in 0–1 or 0–255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Build a sample from raw color components.
    ///
    /// One component is a gray level, three are RGB, four are CMYK (0–1). Any other
    /// arity is rejected. A sample with a non-finite or negative component cannot be
    /// classified and yields `None`.
    pub fn from_components(components: &[f64]) -> Result<Option<Self>, AppError> {
        if !matches!(components.len(), 1 | 3 | 4) {
            return Err(AppError::Document(format!(
                "color sample must have 1, 3 or 4 components, got {}",
                components.len()
            )));
        }
        if components.iter().any(|c| !c.is_finite() || *c < 0.0) {
            return Ok(None);
        }
        let rgb = match *components {
            [gray] => Self::new(gray, gray, gray),
            [r, g, b] => Self::new(r, g, b),
            [c, m, y, k] => {
                let k = k.min(1.0);
                Self::new(
                    (1.0 - c.min(1.0)) * (1.0 - k),
                    (1.0 - m.min(1.0)) * (1.0 - k),
                    (1.0 - y.min(1.0)) * (1.0 - k),
                )
            }
            _ => return Ok(None),
        };
        Ok(Some(rgb))
    }

    /// Scale 0–255 input down to 0–1. Samples already in 0–1 are returned unchanged.
    fn normalized(self) -> Self {
        if self.r > 1.0 || self.g > 1.0 || self.b > 1.0 {
            Self::new(self.r / 255.0, self.g / 255.0, self.b / 255.0)
        } else {
            self
        }
    }

    fn max_channel(&self) -> f64 {
        self.r.max(self.g).max(self.b)
    }

    /// Hue in degrees [0, 360), saturation and value in [0, 1].
    fn to_hsv(self) -> (f64, f64, f64) {
        let max = self.max_channel();
        let min = self.r.min(self.g).min(self.b);
        let delta = max - min;

        let saturation = if max > 0.0 { delta / max } else { 0.0 };
        let hue = if delta == 0.0 {
            0.0
        } else if max == self.r {
            60.0 * ((self.g - self.b) / delta).rem_euclid(6.0)
        } else if max == self.g {
            60.0 * ((self.b - self.r) / delta + 2.0)
        } else {
            60.0 * ((self.r - self.g) / delta + 4.0)
        };

        (hue, saturation, max)
    }
}

/// Classify one color sample.
pub fn classify(sample: Rgb) -> Highlight {
    let rgb = sample.normalized();
    if rgb.max_channel() < MIN_MAX_CHANNEL {
        return Highlight::None;
    }

    let (hue, saturation, value) = rgb.to_hsv();
    if value <= MIN_VALUE {
        return Highlight::None;
    }

    if (80.0..=160.0).contains(&hue) && saturation > 0.15 {
        return Highlight::Green;
    }
    let green_edge = (70.0..80.0).contains(&hue) || (hue > 160.0 && hue <= 180.0);
    if green_edge && saturation > 0.25 && rgb.g > 0.7 {
        return Highlight::Green;
    }
    if (40.0..=70.0).contains(&hue) && saturation > 0.30 {
        return Highlight::Yellow;
    }
    if (45.0..=65.0).contains(&hue) && saturation > 0.20 {
        return Highlight::Yellow;
    }

    Highlight::None
}

/// Majority vote over the glyph samples of one cell.
///
/// A tie with at least one green vote resolves to green; no classified samples means
/// no highlight.
pub fn dominant(samples: &[Rgb]) -> Highlight {
    let (mut green, mut yellow) = (0usize, 0usize);
    for sample in samples {
        match classify(*sample) {
            Highlight::Green => green += 1,
            Highlight::Yellow => yellow += 1,
            Highlight::None => {}
        }
    }

    if green == 0 && yellow == 0 {
        Highlight::None
    } else if green >= yellow {
        Highlight::Green
    } else {
        Highlight::Yellow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bright_green_is_green() {
        assert_eq!(classify(Rgb::new(0.2, 0.9, 0.3)), Highlight::Green);
    }

    #[test]
    fn bright_yellow_is_yellow() {
        assert_eq!(classify(Rgb::new(0.9, 0.85, 0.1)), Highlight::Yellow);
    }

    #[test]
    fn dark_colors_are_rejected() {
        assert_eq!(classify(Rgb::new(0.1, 0.1, 0.1)), Highlight::None);
        // max channel passes, but value 0.7 is not above 0.75
        assert_eq!(classify(Rgb::new(0.1, 0.7, 0.1)), Highlight::None);
    }

    #[test]
    fn white_and_gray_are_not_highlights() {
        assert_eq!(classify(Rgb::new(1.0, 1.0, 1.0)), Highlight::None);
        assert_eq!(classify(Rgb::new(0.8, 0.8, 0.8)), Highlight::None);
    }

    #[test]
    fn byte_range_input_is_normalized() {
        assert_eq!(classify(Rgb::new(51.0, 230.0, 77.0)), Highlight::Green);
        assert_eq!(classify(Rgb::new(255.0, 242.0, 0.0)), Highlight::Yellow);
    }

    #[test]
    fn pale_green_passes_primary_band() {
        // hue 120, saturation 0.2
        assert_eq!(classify(Rgb::new(0.8, 1.0, 0.8)), Highlight::Green);
    }

    #[test]
    fn low_saturation_yellow_needs_narrow_band() {
        // hue 60, saturation 0.25: fails the wide band, passes the narrow one
        assert_eq!(classify(Rgb::new(1.0, 1.0, 0.75)), Highlight::Yellow);
        // hue ~67, saturation 0.25: outside the narrow band
        assert_eq!(classify(Rgb::new(0.97, 1.0, 0.75)), Highlight::None);
    }

    #[test]
    fn green_edge_band_requires_bright_green_channel() {
        // hue 75, saturation 0.4, green 1.0
        assert_eq!(classify(Rgb::new(0.9, 1.0, 0.6)), Highlight::Green);
        // hue 170, saturation 0.3, green 0.9
        assert_eq!(classify(Rgb::new(0.63, 0.9, 0.855)), Highlight::Green);
        // hue 170 but too little saturation for the edge band
        assert_eq!(classify(Rgb::new(0.8, 1.0, 0.97)), Highlight::None);
    }

    #[test]
    fn red_and_blue_are_not_highlights() {
        assert_eq!(classify(Rgb::new(1.0, 0.2, 0.2)), Highlight::None);
        assert_eq!(classify(Rgb::new(0.2, 0.4, 1.0)), Highlight::None);
    }

    #[test]
    fn components_accept_gray_rgb_and_cmyk() {
        assert_eq!(
            Rgb::from_components(&[0.5]).unwrap(),
            Some(Rgb::new(0.5, 0.5, 0.5))
        );
        assert_eq!(
            Rgb::from_components(&[0.2, 0.9, 0.3]).unwrap(),
            Some(Rgb::new(0.2, 0.9, 0.3))
        );
        // pure yellow ink
        let cmyk = Rgb::from_components(&[0.0, 0.0, 1.0, 0.0]).unwrap();
        assert_eq!(cmyk, Some(Rgb::new(1.0, 1.0, 0.0)));
        assert_eq!(cmyk.map(classify), Some(Highlight::Yellow));
    }

    #[test]
    fn components_of_wrong_arity_are_rejected() {
        assert!(matches!(
            Rgb::from_components(&[0.1, 0.2]),
            Err(AppError::Document(_))
        ));
        assert!(Rgb::from_components(&[]).is_err());
        assert!(Rgb::from_components(&[0.1, 0.2, 0.3, 0.4, 0.5]).is_err());
    }

    #[test]
    fn unreadable_components_are_skipped_not_rejected() {
        assert_eq!(Rgb::from_components(&[f64::NAN, 0.2, 0.3]).unwrap(), None);
        assert_eq!(Rgb::from_components(&[-0.01, 0.9, 0.3]).unwrap(), None);
        assert_eq!(Rgb::from_components(&[f64::INFINITY]).unwrap(), None);
        assert_eq!(Rgb::from_components(&[0.0, -1.0, 0.0, 0.0]).unwrap(), None);
    }

    #[test]
    fn dominant_uses_majority_vote() {
        let green = Rgb::new(0.2, 0.9, 0.3);
        let yellow = Rgb::new(0.9, 0.85, 0.1);
        let black = Rgb::new(0.0, 0.0, 0.0);

        assert_eq!(dominant(&[yellow, yellow, green]), Highlight::Yellow);
        assert_eq!(dominant(&[green, green, yellow]), Highlight::Green);
        assert_eq!(dominant(&[green, yellow]), Highlight::Green);
        assert_eq!(dominant(&[black, yellow, black]), Highlight::Yellow);
        assert_eq!(dominant(&[black, black]), Highlight::None);
        assert_eq!(dominant(&[]), Highlight::None);
    }
}
