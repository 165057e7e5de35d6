//! Reader limits.

/// Tunables for [`crate::SndhReader`].
///
/// The defaults match what SNDH files in the wild need; there is rarely a
/// reason to change them outside of tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderConfig {
    /// Bytes read (or kept after depacking) for the tag walk.
    pub header_probe_len: usize,
    /// Bytes looked at by [`SndhReader::detect`](crate::SndhReader::detect).
    pub detect_len: usize,
    /// Allowed difference between the file size and the ICE! packed size.
    pub ice_margin: u64,
    /// Largest accepted ICE! depacked size.
    pub max_depacked_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            header_probe_len: 4096,
            detect_len: 512,
            ice_margin: 16,
            max_depacked_size: 16 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ReaderConfig::default();
        assert_eq!(cfg.header_probe_len, 4096);
        assert_eq!(cfg.detect_len, 512);
        assert_eq!(cfg.ice_margin, 16);
        assert_eq!(cfg.max_depacked_size, 16 << 20);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_json() {
        let cfg: ReaderConfig = serde_json::from_str(r#"{"ice_margin": 0}"#).unwrap();
        assert_eq!(cfg.ice_margin, 0);
        assert_eq!(cfg.header_probe_len, 4096);
    }
}
