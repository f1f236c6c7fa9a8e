//! NMEA 0183 framing: XOR checksums and structural line classification.
//!
//! The NMEA TAG BLOCK metadata specification was added in NMEA 0183 4.0.
//! Some providers violate the standard by using lower case letters in
//! checksums, so comparisons here are case-insensitive and computed
//! checksums are always upper case.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static SENTENCE_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\\$!]").expect("valid regex"));
static CHECKSUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*[0-9A-Fa-f]{2}$").expect("valid regex"));

// Generally match line type without parsing the payload.
static ID_BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[!$][A-Z]{4}[^*!$]*\*[0-9A-Fa-f]{2}$").expect("valid regex"));
static ID_USCG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[!$][A-Z]{4}[^*!$]*\*[0-9A-Fa-f]{2},[^*!$]+$").expect("valid regex")
});
static ID_TAGB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\\(?:[a-zA-Z]:[^*,\\]*,?)+\*[0-9A-Fa-f]{2}(?:\\.*)?$").expect("valid regex")
});

// Specific match for an AIS VDM/VDO line.
static ID_BARE_VDM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[!$][A-Z]{2}VD[MO][^*!$]*\*[0-9A-Fa-f]{2}").expect("valid regex")
});

// Trailing checksum token of a sentence that may carry comma-appended
// metadata after it (the USCG style): fill bits, star, two hex digits.
static TAIL_CHECKSUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",[0-9]\*[0-9A-Fa-f]{2}").expect("valid regex"));

/// Structural class of an input line. Assigned once, never revised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LineType {
    #[default]
    Text,
    Bare,
    Tagb,
    Uscg,
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            LineType::Text => "TEXT",
            LineType::Bare => "BARE",
            LineType::Tagb => "TAGB",
            LineType::Uscg => "USCG",
        };
        write!(f, "{}", name)
    }
}

fn xor_checksum(sentence: &str) -> String {
    let mut checksum: u32 = 0;
    for ch in sentence.chars() {
        checksum ^= ch as u32;
    }
    format!("{:02X}", checksum)
}

/// Compute the checksum for a NMEA sentence or TAG BLOCK metadata span.
///
/// A leading backslash, bang or dollar sign and a trailing `*HH` token are
/// stripped before the XOR is taken.
pub fn checksum(sentence: &str) -> String {
    let stripped = SENTENCE_START_RE.replace(sentence, "");
    let stripped = CHECKSUM_RE.replace(&stripped, "");
    xor_checksum(&stripped)
}

/// Validate the trailing checksum of a sentence, tolerating USCG-style
/// comma-appended metadata after the `*HH` token.
///
/// The last `,<fill>*HH` occurrence marks the end of the checksummed span.
/// Returns false when no checksum token is found.
pub fn is_valid(line: &str) -> bool {
    let Some(m) = TAIL_CHECKSUM_RE.find_iter(line).last() else {
        return false;
    };
    let sentence = &line[..m.end()];
    let expected = &sentence[sentence.len() - 2..];
    checksum(sentence).eq_ignore_ascii_case(expected)
}

/// Classify a right-trimmed line by structure alone.
///
/// Checksums and payloads are never validated here, so a malformed but
/// classifiable line still routes to the assembler for its dialect, which
/// then fails at the checksum stage with a dedicated error instead of
/// silently becoming text.
pub fn line_type(line: &str) -> LineType {
    if line.is_empty() {
        return LineType::Text;
    }

    if line.starts_with('!') || line.starts_with('$') {
        if ID_BARE_RE.is_match(line) {
            return LineType::Bare;
        }
        if ID_USCG_RE.is_match(line) {
            return LineType::Uscg;
        }
        return LineType::Text;
    }

    if line.starts_with('\\') && ID_TAGB_RE.is_match(line) {
        return LineType::Tagb;
    }

    LineType::Text
}

/// Does this line look like a bare AIS VDM/VDO sentence?
pub fn is_vdm(line: &str) -> bool {
    ID_BARE_VDM_RE.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_checksum() {
        assert_eq!(xor_checksum("NVXDR,G,142983,,WPTTTG"), "00");
        assert_eq!(xor_checksum("GPHDT,143.59,T"), "0F");
        assert_eq!(xor_checksum("INHDT,89.4,T"), "10");
        assert_eq!(xor_checksum("INROT,0,A"), "3F");
        assert_eq!(xor_checksum("n:121650,s:r17MHOP1,c:1425327399"), "1D");
        assert_eq!(xor_checksum("g:2-2-223509,n:453068"), "26");
    }

    #[test]
    fn test_checksum_strips_framing() {
        assert_eq!(checksum("$NVXDR,G,142983,,WPTTTG*00"), "00");
        assert_eq!(checksum("$GPHDT,143.59,T*0F"), "0F");
        assert_eq!(checksum("$INHDT,89.4,T*10"), "10");
        assert_eq!(checksum("$INROT,0,A*3F"), "3F");
        assert_eq!(
            checksum("!AIVDM,1,1,,B,14Qle<001mDoOKD`v:`Rc2;R1d00,0*00"),
            "00"
        );
        assert_eq!(checksum(r"\n:121650,s:r17MHOP1,c:1425327399*1D"), "1D");
        assert_eq!(checksum(r"\g:2-2-223509,n:453068*26"), "26");
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid(
            "!AIVDM,1,1,,B,35MsUdPOh8JwI:0HUwquiIFH21>i,0*09"
        ));
        // Tail metadata after the checksum is allowed.
        assert!(is_valid(
            "!SAVDM,1,1,,A,15N4OMPP01I<cGrA1v>Id?vF060l,0*22,b003669978,1429287189"
        ));
        // Corrupted sentence.
        assert!(!is_valid(
            "!AIVDM,11,1,,B,35MsUdPOh8JwI:0HUwquiIFH21>i,0*09"
        ));
        // No checksum token at all.
        assert!(!is_valid("random text"));
    }

    #[test]
    fn test_line_type_text() {
        for line in ["", "a", "$", "!", "\\", "$AI*FF", "\\foo:junk*AA"] {
            assert_eq!(line_type(line), LineType::Text, "line: {:?}", line);
        }
    }

    #[test]
    fn test_line_type_bare() {
        assert_eq!(line_type("$ABCD*04"), LineType::Bare);
        assert_eq!(line_type("$PSWDA,24.46,5.61,86.44,3.86*54"), LineType::Bare);
        assert_eq!(line_type("$INROT,-1,A*13"), LineType::Bare);
        assert_eq!(
            line_type("!AIVDM,1,1,,A,14Qle<001fCNvfbR75JRuBGD00Rt,0*35"),
            LineType::Bare
        );
        assert_eq!(line_type("$UPSAQ,BCE*2E"), LineType::Bare);
        assert_eq!(line_type("$AIALR,,,,,*7B"), LineType::Bare);
    }

    #[test]
    fn test_line_type_uscg() {
        assert_eq!(
            line_type("!AIVDM,2,2,9,B,00000000000,2*2E,b003669952,1370785759"),
            LineType::Uscg
        );
        assert_eq!(
            line_type("$ANABK,,B,8,0,3*12,r17MHOP1,1409443341"),
            LineType::Uscg
        );
        assert_eq!(
            line_type("$AIALR,,,,,*7B,D08MN-HG-GCHBS1,1396488078"),
            LineType::Uscg
        );
        assert_eq!(
            line_type("$ANZDA,000258.00,03,04,2014,00,00*71,r17MHOP1,1396483379"),
            LineType::Uscg
        );
    }

    #[test]
    fn test_line_type_tagb() {
        assert_eq!(line_type(r"\s:station1,c:1425344187*78"), LineType::Tagb);
        assert_eq!(line_type(r"\s:station1,c:1425344187*78\a"), LineType::Tagb);
        assert_eq!(
            line_type(r"\n:121650,s:r17MHOP1,c:1425327399*1D\$ANZDA,201638.00,02,03,2015,00,00*77"),
            LineType::Tagb
        );
        assert_eq!(
            line_type(
                r"\g:1-3-42349,n:111458,s:r003669945,c:1425327424*41\!AIVDM,2,1,5,A,ENk`sPa17ab7W@7@1T@6;Q@0h@@=MeR4<7rpH00003v,0*16"
            ),
            LineType::Tagb
        );
    }

    #[test]
    fn test_is_vdm() {
        assert!(is_vdm("!AIVDM,2,2,2,B,00000000000,2*25"));
        assert!(!is_vdm("$ARVSI,r003669945,5,201704.05687473,0152,-085,0*2E"));
        assert!(!is_vdm(r"\g:3-3-42349,n:111460*1E\$"));
    }
}
