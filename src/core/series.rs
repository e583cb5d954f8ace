//! Pedal series detection and effect type labels

use crate::codec;
use serde::{Deserialize, Serialize};

/// Hardware family of the firmware
///
/// Detected from the product-family label embedded in the host file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PedalSeries {
    /// MS-50G, MS-60B, MS-70CDR (compact single-DSP family)
    Ms,
    /// G1on, G1Xon, B1on, B1Xon
    One,
    /// G3X, G3n, G3Xn, G5n, B3n, G1 Four, B1 Four
    G,
    /// AC-2, AC-3
    Ac,
}

impl PedalSeries {
    /// All series in detection order
    pub const ALL: [PedalSeries; 4] = [
        PedalSeries::Ms,
        PedalSeries::One,
        PedalSeries::G,
        PedalSeries::Ac,
    ];

    /// ASCII label searched for in the host file
    pub fn label(&self) -> &'static str {
        match self {
            PedalSeries::Ms => "ZOOM MS Series",
            PedalSeries::One => "ZOOM 1 Series",
            PedalSeries::G => "ZOOM G Series",
            PedalSeries::Ac => "ZOOM AC Series",
        }
    }

    /// Detect the series from the raw host bytes
    ///
    /// Labels are tried in [`PedalSeries::ALL`] order and the first series
    /// whose label occurs wins. A label at offset 0 is ignored; in updater
    /// files labels only appear inside the executable body.
    pub fn detect(host: &[u8]) -> Option<PedalSeries> {
        Self::ALL
            .into_iter()
            .find(|series| matches!(codec::find(host, series.label().as_bytes(), 0), Some(pos) if pos > 0))
    }

    /// Legacy type bytes rewritten on injection for this series
    ///
    /// The MS family only knows the older bass drive categories.
    pub fn type_remap(&self, type_byte: u8) -> Option<u8> {
        match (self, type_byte) {
            (PedalSeries::Ms, 0x14) => Some(0x0C),
            (PedalSeries::Ms, 0x16) => Some(0x0D),
            _ => None,
        }
    }
}

impl std::fmt::Display for PedalSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Effect category stored in the type byte of a `.ZDL` payload
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectType {
    Dynamics = 0x01,
    Filter = 0x02,
    GuitarDrive = 0x03,
    GuitarAmp = 0x04,
    BassAmp = 0x05,
    Modulation = 0x06,
    Sfx = 0x07,
    Delay = 0x08,
    Reverb = 0x09,
    Pedal = 0x0B,
    /// MS-60B bass drive
    BassDriveMs = 0x0C,
    /// MS-60B bass drive, second bank
    BassDriveMs2 = 0x0D,
    BassDrive = 0x14,
    BassDrive2 = 0x16,
}

impl EffectType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Dynamics),
            0x02 => Some(Self::Filter),
            0x03 => Some(Self::GuitarDrive),
            0x04 => Some(Self::GuitarAmp),
            0x05 => Some(Self::BassAmp),
            0x06 => Some(Self::Modulation),
            0x07 => Some(Self::Sfx),
            0x08 => Some(Self::Delay),
            0x09 => Some(Self::Reverb),
            0x0B => Some(Self::Pedal),
            0x0C => Some(Self::BassDriveMs),
            0x0D => Some(Self::BassDriveMs2),
            0x14 => Some(Self::BassDrive),
            0x16 => Some(Self::BassDrive2),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Dynamics => "DYNAMICS",
            Self::Filter => "FILTER",
            Self::GuitarDrive => "GUITAR DRIVE",
            Self::GuitarAmp => "GUITAR AMP",
            Self::BassAmp => "BASS AMP",
            Self::Modulation => "MODULATION",
            Self::Sfx => "SFX",
            Self::Delay => "DELAY",
            Self::Reverb => "REVERB",
            Self::Pedal => "PEDAL",
            Self::BassDriveMs | Self::BassDriveMs2 | Self::BassDrive | Self::BassDrive2 => {
                "BASS DRIVE"
            }
        }
    }
}

/// Display label for an entry's type, keyed on its file extension
///
/// Effects (`.ZDL`) get their category, drum samples (`.RAW`) are labelled
/// as such, everything else has no label.
pub fn type_label(type_byte: Option<u8>, file_name: &str) -> String {
    let upper = file_name.to_ascii_uppercase();
    if upper.ends_with("ZDL") {
        match type_byte {
            Some(t) => EffectType::from_u8(t)
                .map(|ty| ty.label().to_string())
                .unwrap_or_else(|| format!("TYPE \"{:02x}\"", t)),
            None => String::new(),
        }
    } else if upper.ends_with("RAW") {
        "DRUM SOUND".to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_series() {
        let mut host = vec![0u8; 64];
        host.extend_from_slice(b"ZOOM G Series");
        host.extend_from_slice(&[0u8; 16]);
        assert_eq!(PedalSeries::detect(&host), Some(PedalSeries::G));
    }

    #[test]
    fn test_detect_uses_series_order() {
        let mut host = vec![0u8; 8];
        host.extend_from_slice(b"ZOOM AC Series..ZOOM MS Series");
        assert_eq!(PedalSeries::detect(&host), Some(PedalSeries::Ms));
    }

    #[test]
    fn test_detect_absent() {
        assert_eq!(PedalSeries::detect(&[0u8; 128]), None);
        // Label at the very start is not counted
        assert_eq!(PedalSeries::detect(b"ZOOM 1 Series"), None);
    }

    #[test]
    fn test_type_remap_only_for_ms() {
        assert_eq!(PedalSeries::Ms.type_remap(0x14), Some(0x0C));
        assert_eq!(PedalSeries::Ms.type_remap(0x16), Some(0x0D));
        assert_eq!(PedalSeries::Ms.type_remap(0x03), None);
        assert_eq!(PedalSeries::G.type_remap(0x14), None);
    }

    #[test]
    fn test_type_labels() {
        assert_eq!(type_label(Some(0x09), "HALL.ZDL"), "REVERB");
        assert_eq!(type_label(Some(0x16), "bass.zdl"), "BASS DRIVE");
        assert_eq!(type_label(Some(0x42), "ODD.ZDL"), "TYPE \"42\"");
        assert_eq!(type_label(Some(0x09), "KICK.RAW"), "DRUM SOUND");
        assert_eq!(type_label(Some(0x09), "FLST_SEQ.ZDT"), "");
    }
}
