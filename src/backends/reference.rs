//! Built-in ALMA reference facts

use super::traits::*;
use crate::intents::{Intent, IntentKind};
use crate::results::ResultSet;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

const INTENTS: &[IntentKind] = &[IntentKind::InfoLookup];

/// Receiver bands: (band, low GHz, high GHz, wavelength range in mm)
pub const BANDS: &[(u8, f64, f64, &str)] = &[
    (1, 35.0, 50.0, "6.0-8.6"),
    (3, 84.0, 116.0, "2.6-3.6"),
    (4, 125.0, 163.0, "1.8-2.4"),
    (5, 163.0, 211.0, "1.4-1.8"),
    (6, 211.0, 275.0, "1.1-1.4"),
    (7, 275.0, 373.0, "0.8-1.1"),
    (8, 385.0, 500.0, "0.6-0.8"),
    (9, 602.0, 720.0, "0.4-0.5"),
    (10, 787.0, 950.0, "0.3-0.4"),
];

/// Rest frequencies in GHz of frequently observed lines
pub const COMMON_LINES: &[(&str, f64)] = &[
    ("CO(1-0)", 115.271),
    ("CO(2-1)", 230.538),
    ("CO(3-2)", 345.796),
    ("13CO(1-0)", 110.201),
    ("13CO(2-1)", 220.399),
    ("HCN(1-0)", 88.632),
    ("HCO+(1-0)", 89.189),
    ("CS(2-1)", 97.981),
    ("SiO(2-1)", 86.847),
    ("N2H+(1-0)", 93.174),
];

pub const SCIENCE_CATEGORIES: &[&str] = &[
    "Cosmology",
    "Galaxy evolution",
    "ISM and star formation",
    "Disks and planet formation",
    "Stars and stellar evolution",
    "Solar system",
    "Sun",
];

/// Static reference backend; always available
#[derive(Debug, Default)]
pub struct Reference;

impl Reference {
    pub fn new() -> Self {
        Self
    }

    fn info() -> ResultSet {
        let mut table = ResultSet::new(["band", "frequency_range_ghz", "wavelength_range_mm"]);
        for (band, low, high, wavelength) in BANDS {
            table.push_values(vec![
                json!(band),
                json!(format!("{}-{}", low, high)),
                json!(wavelength),
            ]);
        }

        let lines: Map<String, Value> = COMMON_LINES
            .iter()
            .map(|(name, ghz)| (name.to_string(), json!(ghz)))
            .collect();

        table
            .with_summary(
                "ALMA, the Atacama Large Millimeter/submillimeter Array, is an \
                 interferometer of 66 antennas (54 x 12m and 12 x 7m) at 5000m in the \
                 Atacama Desert, Chile, operated by ESO, NRAO and NAOJ. It observes \
                 between 35 and 950 GHz in the receiver bands listed.",
            )
            .with_meta("telescope", "Atacama Large Millimeter/submillimeter Array")
            .with_meta("location", "Atacama Desert, Chile (5000m altitude)")
            .with_meta("operator", "NRAO, ESO, NAOJ")
            .with_meta("antennas", "66 high-precision antennas (54 x 12m + 12 x 7m)")
            .with_meta("common_lines_ghz", lines)
            .with_meta("science_categories", SCIENCE_CATEGORIES.to_vec())
    }
}

/// Band whose frequency range contains `frequency_ghz`
pub fn band_for_frequency(frequency_ghz: f64) -> Option<u8> {
    BANDS
        .iter()
        .find(|(_, low, high, _)| *low <= frequency_ghz && frequency_ghz <= *high)
        .map(|(band, ..)| *band)
}

#[async_trait]
impl Backend for Reference {
    fn id(&self) -> BackendId {
        BackendId::Reference
    }

    fn about(&self) -> BackendAbout {
        BackendAbout::new("Built-in ALMA capabilities, bands and common spectral lines")
            .website("https://almascience.org")
    }

    fn intents(&self) -> &[IntentKind] {
        INTENTS
    }

    fn timeout(&self) -> f64 {
        1.0
    }

    async fn execute(&self, intent: &Intent) -> Result<ResultSet, BackendError> {
        match intent {
            Intent::InfoLookup => Ok(Self::info()),
            other => Err(unsupported(BackendId::Reference, other)),
        }
    }
}
