//! Collapse multi-sentence VDM streams into synthetic one-line sentences.
//!
//! Downstream tools that want one sentence per message can run a USCG-style
//! feed through [`Normalizer`]: single-sentence lines pass through, and a
//! completed multi-sentence group is re-emitted as one constructed sentence
//! that mirrors the final fragment's sequence id, channel and metadata
//! suffix, with a recomputed checksum over the merged body.
//!
//! Grouping is by station, sequence id and channel. The authoritative key
//! is sufficient on its own; no timestamp-window tolerance is applied
//! between fragments.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::framing;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    #[error("Invalid checksum: {line_num}: {line}")]
    InvalidChecksum { line_num: u64, line: String },
    #[error("Invalid checksum in constructed one-liner: {line_num}: {line}")]
    InvalidChecksumInConstructed { line_num: u64, line: String },
    #[error("No station found: {line_num}: {line}")]
    NoStationFound { line_num: u64, line: String },
    #[error("Too few fields, got {fields} but needed 6: {line_num}: {line}")]
    TooFewFields {
        fields: usize,
        line_num: u64,
        line: String,
    },
}

#[derive(Debug, Clone)]
pub struct NormalizerOptions {
    /// Verify each fragment's checksum before buffering.
    pub validate_checksum: bool,
    /// Keep processing fragments whose checksum failed.
    pub pass_invalid_checksums: bool,
    /// Accept station-less lines under a synthetic "UNKNOWN" station.
    pub allow_unknown: bool,
    /// Group on (station, sequence id) only, merging the A and B channels.
    pub treat_ab_equal: bool,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        NormalizerOptions {
            validate_checksum: true,
            pass_invalid_checksums: false,
            allow_unknown: false,
            treat_ab_equal: false,
        }
    }
}

/// Rebuilds one-line sentences from a multi-sentence VDM stream.
#[derive(Default)]
pub struct Normalizer {
    options: NormalizerOptions,
    buffers: HashMap<String, Vec<String>>,
    line_num: u64,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: NormalizerOptions) -> Self {
        Normalizer {
            options,
            ..Default::default()
        }
    }

    /// Feed one line. Errors go to the caller-supplied sink; the return
    /// value is the pass-through or constructed output line, if any.
    pub fn put<F>(&mut self, line: &str, errors: &mut F) -> Option<String>
    where
        F: FnMut(StreamError),
    {
        self.line_num += 1;
        let line_num = self.line_num;
        let line = line.trim();

        if !matches!(line.get(3..6), Some("VDM") | Some("VDO")) {
            return Some(line.to_string());
        }

        if self.options.validate_checksum && !framing::is_valid(line) {
            errors(StreamError::InvalidChecksum {
                line_num,
                line: line.to_string(),
            });
            if !self.options.pass_invalid_checksums {
                return None;
            }
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 6 {
            errors(StreamError::TooFewFields {
                fields: fields.len(),
                line_num,
                line: line.to_string(),
            });
            return None;
        }

        let Ok(sentence_tot) = fields[1].parse::<u32>() else {
            debug!("bad sentence total on line {}: {}", line_num, line);
            return None;
        };
        if sentence_tot == 1 {
            // A single line needs no work.
            return Some(line.to_string());
        }

        let Ok(sentence_num) = fields[2].parse::<u32>() else {
            debug!("bad sentence number on line {}: {}", line_num, line);
            return None;
        };
        let payload = fields[5];

        let station = fields[6..]
            .iter()
            .rev()
            .find(|f| f.starts_with(['r', 'R', 'b', 'B', 'D']))
            .copied()
            .or(if self.options.allow_unknown {
                Some("UNKNOWN")
            } else {
                None
            });
        let Some(station) = station else {
            errors(StreamError::NoStationFound {
                line_num,
                line: line.to_string(),
            });
            return None;
        };

        // Sequence id and channel scope a stream within one station.
        let slot = if self.options.treat_ab_equal {
            format!("{}{}", station, fields[3])
        } else {
            format!("{}{}{}", station, fields[3], fields[4])
        };

        if sentence_num == 1 {
            // Overwrite any partials.
            self.buffers.insert(slot, vec![payload.to_string()]);
            return None;
        }

        let Some(buffer) = self.buffers.get_mut(&slot) else {
            debug!("no preceding packets for line {}: {}", line_num, line);
            return None;
        };

        if sentence_num != sentence_tot {
            buffer.push(payload.to_string());
            return None;
        }

        buffer.push(payload.to_string());
        let parts = self.buffers.remove(&slot)?;
        let body: String = parts.join("");

        // Mirror the final fragment as much as possible: same sequence id,
        // channel, fill bits and metadata suffix.
        let fill = fields[6].split('*').next()?;
        let unsigned = format!(
            "{},1,1,{},{},{},{}",
            fields[0], fields[3], fields[4], body, fill
        );
        let mut out = format!("{}*{}", unsigned, framing::checksum(&unsigned));
        if fields.len() > 7 {
            out.push(',');
            out.push_str(&fields[7..].join(","));
        }

        if !framing::is_valid(&out) {
            errors(StreamError::InvalidChecksumInConstructed {
                line_num,
                line: line.to_string(),
            });
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_vdm_passes_through() {
        let mut normalizer = Normalizer::new();
        let mut errors = Vec::new();
        let mut sink = |e| errors.push(e);
        assert_eq!(
            normalizer.put("$GPZDA,203003.00,12,07,2009,00,00,*47", &mut sink),
            Some("$GPZDA,203003.00,12,07,2009,00,00,*47".to_string())
        );
        assert_eq!(
            normalizer.put("random text", &mut sink),
            Some("random text".to_string())
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_single_sentence_passes_through() {
        let mut normalizer = Normalizer::new();
        let mut errors = Vec::new();
        let mut sink = |e| errors.push(e);
        let line = "!SAVDM,1,1,,A,15N4OMPP01I<cGrA1v>Id?vF060l,0*22,b003669978,1429287189";
        assert_eq!(normalizer.put(line, &mut sink), Some(line.to_string()));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_two_line_merge() {
        let mut normalizer = Normalizer::new();
        let mut errors = Vec::new();
        let mut sink = |e| errors.push(e);

        let first = "!SAVDM,2,1,3,A,55NPRF400001L@OC;K4pThE>1<PtDl4dE:22220O1@D3740HtEP000000000,0*0D,d-81,S2231,t040459.00,T59.498602,D08MN-MO-ROBBS1,1428796802";
        let last = "!SAVDM,2,2,3,A,00000000000,2*3D,d-81,S2231,t040459.00,T59.498602,D08MN-MO-ROBBS1,1428796802";

        assert_eq!(normalizer.put(first, &mut sink), None);
        let merged = normalizer.put(last, &mut sink).expect("merged line");

        assert!(merged.starts_with(
            "!SAVDM,1,1,3,A,55NPRF400001L@OC;K4pThE>1<PtDl4dE:22220O1@D3740HtEP00000000000000000000,2*"
        ));
        assert!(merged.ends_with(",d-81,S2231,t040459.00,T59.498602,D08MN-MO-ROBBS1,1428796802"));
        assert!(framing::is_valid(&merged));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_invalid_checksum_is_reported_and_dropped() {
        let mut normalizer = Normalizer::new();
        let mut errors = Vec::new();
        let mut sink = |e| errors.push(e);
        let line = "!SAVDM,1,1,,A,15N4OMPP01I<cGrA1v>Id?vF060l,0*FF,b003669978,1429287189";
        assert_eq!(normalizer.put(line, &mut sink), None);
        assert!(matches!(
            errors.as_slice(),
            [StreamError::InvalidChecksum { line_num: 1, .. }]
        ));
    }

    #[test]
    fn test_missing_predecessor_is_dropped() {
        let mut normalizer = Normalizer::new();
        let mut errors = Vec::new();
        let mut sink = |e| errors.push(e);
        let last = "!SAVDM,2,2,3,A,00000000000,2*3D,d-81,S2231,t040459.00,T59.498602,D08MN-MO-ROBBS1,1428796802";
        assert_eq!(normalizer.put(last, &mut sink), None);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_no_station_is_reported() {
        let mut normalizer = Normalizer::new();
        let mut errors = Vec::new();
        let mut sink = |e| errors.push(e);
        let line = "!ANVDM,2,1,1,A,55NH7SP00001L@GOO7QHT=@u8T6222222222220O0000040Ht00000000000,0*06,1428798766";
        assert_eq!(normalizer.put(line, &mut sink), None);
        assert!(matches!(
            errors.as_slice(),
            [StreamError::NoStationFound { .. }]
        ));
    }

    #[test]
    fn test_allow_unknown_station() {
        let mut normalizer = Normalizer::with_options(NormalizerOptions {
            allow_unknown: true,
            ..Default::default()
        });
        let mut errors = Vec::new();
        let mut sink = |e| errors.push(e);
        let first = "!ANVDM,2,1,1,A,55NH7SP00001L@GOO7QHT=@u8T6222222222220O0000040Ht00000000000,0*06,1428798766";
        let last = "!ANVDM,2,2,1,A,00000000000,2*22,1428798766";
        assert_eq!(normalizer.put(first, &mut sink), None);
        let merged = normalizer.put(last, &mut sink).expect("merged line");
        assert!(framing::is_valid(&merged));
        assert!(errors.is_empty());
    }
}
