//! Spectral window coverage
//!
//! ALMA publishes each dataset's spectral setup in the ObsCore
//! `frequency_support` column as a union of windows, e.g.
//! `[84.20..86.07GHz,31250.00kHz,1.6mJy/beam@10km/s,...] U [86.12..88.00GHz,...]`.

use once_cell::sync::Lazy;
use regex::Regex;

static WINDOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\s*([0-9]+(?:\.[0-9]+)?)\s*\.\.\s*([0-9]+(?:\.[0-9]+)?)\s*GHz").expect("valid regex")
});

/// Speed of light in m/s
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// One spectral window in GHz
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralWindow {
    pub low_ghz: f64,
    pub high_ghz: f64,
}

impl SpectralWindow {
    pub fn contains(&self, frequency_ghz: f64) -> bool {
        self.low_ghz <= frequency_ghz && frequency_ghz <= self.high_ghz
    }
}

/// Parse a `frequency_support` string into its windows
pub fn parse_frequency_support(support: &str) -> Vec<SpectralWindow> {
    WINDOW
        .captures_iter(support)
        .filter_map(|caps| {
            let a: f64 = caps.get(1)?.as_str().parse().ok()?;
            let b: f64 = caps.get(2)?.as_str().parse().ok()?;
            Some(SpectralWindow {
                low_ghz: a.min(b),
                high_ghz: a.max(b),
            })
        })
        .collect()
}

/// Whether any window of a `frequency_support` string contains the frequency
pub fn covers(support: &str, frequency_ghz: f64) -> bool {
    parse_frequency_support(support)
        .iter()
        .any(|w| w.contains(frequency_ghz))
}

/// Wavelength in metres of a frequency in GHz
pub fn wavelength_m(frequency_ghz: f64) -> f64 {
    SPEED_OF_LIGHT / (frequency_ghz * 1e9)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPORT: &str = "[84.20..86.07GHz,31250.00kHz,1.6mJy/beam@10km/s,67.5uJy/beam@native, XX YY] U [96.12..98.00GHz,31250.00kHz,1.5mJy/beam@10km/s,64.1uJy/beam@native, XX YY]";

    #[test]
    fn test_parse_windows() {
        let windows = parse_frequency_support(SUPPORT);
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].low_ghz, 84.20);
        assert_eq!(windows[1].high_ghz, 98.00);
    }

    #[test]
    fn test_coverage() {
        assert!(covers(SUPPORT, 85.0));
        assert!(covers(SUPPORT, 97.981));
        assert!(!covers(SUPPORT, 115.271));
        assert!(!covers("", 100.0));
    }

    #[test]
    fn test_wavelength() {
        let lambda = wavelength_m(299.792458);
        assert!((lambda - 0.001).abs() < 1e-12);
    }
}
