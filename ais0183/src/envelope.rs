//! The unit of output: one completed logical message with provenance.

use md5::{Digest, Md5};
use serde::Serialize;

use crate::decoder::AisMessage;
use crate::framing::LineType;
use crate::sentences::NmeaSentence;
use crate::tag_block::{TagBlockMatch, TagBlockTags};
use crate::uscg::{UscgMatch, UscgMetadata};
use crate::vdm::VdmMatch;

/// A decoded AIS payload plus the MD5 fingerprint of its raw six-bit body.
///
/// The fingerprint is a stable content hash used by downstream
/// deduplication; it is independent of how the message was fragmented or
/// which station received it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AisRecord {
    pub md5: String,
    #[serde(flatten)]
    pub message: AisMessage,
}

impl AisRecord {
    pub fn new(body: &str, message: AisMessage) -> Self {
        AisRecord {
            md5: hex::encode(Md5::digest(body.as_bytes())),
            message,
        }
    }
}

/// What a completed envelope decoded to, if anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Decoded {
    /// The payload decoded as an AIS message.
    Ais(AisRecord),
    /// The line decoded as a non-AIS NMEA sentence (fallback path).
    Nmea(NmeaSentence),
}

/// One parsed fragment, per dialect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Fragment {
    Vdm(VdmMatch),
    TagBlock(TagBlockMatch),
    Uscg(UscgMatch),
    /// USCG metadata recovered from a line whose inner sentence failed to
    /// parse.
    UscgMetadata(UscgMetadata),
}

/// One completed logical message with full provenance.
///
/// `lines` and `line_nums` hold exactly the fragments that contributed, in
/// ascending line order. `matches` is present for the three NMEA dialects,
/// `times` for the two metadata-carrying dialects, `tags` only for
/// reassembled TAG BLOCK groups. Envelopes are immutable once emitted; the
/// engine keeps no reference to them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MessageEnvelope {
    pub line_nums: Vec<u64>,
    pub lines: Vec<String>,
    pub line_type: LineType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<Fragment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub times: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<TagBlockTags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded: Option<Decoded>,
}

impl MessageEnvelope {
    /// An envelope holding one raw line and nothing else.
    pub fn raw(line_num: u64, line: &str) -> Self {
        MessageEnvelope {
            line_nums: vec![line_num],
            lines: vec![line.to_string()],
            ..Default::default()
        }
    }

    /// The decoded AIS record, when the payload decode succeeded.
    pub fn ais(&self) -> Option<&AisRecord> {
        match &self.decoded {
            Some(Decoded::Ais(record)) => Some(record),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder;

    #[test]
    fn test_md5_fingerprint() {
        let body = "K8VSqb9LdU28WP8<";
        let message = decoder::decode(body, 0).expect("decode");
        let record = AisRecord::new(body, message);
        assert_eq!(record.md5, "50898a3435865cf76f1b502b2821672b");
    }

    #[test]
    fn test_raw_envelope() {
        let env = MessageEnvelope::raw(7, "random text");
        assert_eq!(env.line_nums, vec![7]);
        assert_eq!(env.lines, vec!["random text".to_string()]);
        assert_eq!(env.line_type, LineType::Text);
        assert!(env.matches.is_empty());
        assert!(env.decoded.is_none());
        assert!(env.ais().is_none());
    }
}
