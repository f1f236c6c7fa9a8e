//! The bare AIS VD[MO] dialect: sentences with no metadata wrapper.
//!
//! An example single line message:
//!
//! ```text
//! !AIVDM,1,1,,A,14VIk0002sMM04vE>V9jGimn08RP,0*0D
//! ```
//!
//! An example two line message:
//!
//! ```text
//! !AIVDM,2,1,2,B,5KNp?6@00000=Phb220u1@Tlv0TV22222222220N0h:22400000000000000,0*2A
//! !AIVDM,2,2,2,B,00000000000,2*25
//! ```
//!
//! [`parse`] matches one line against the VDM grammar and verifies its
//! checksum. [`BareAssembler`] buffers parsed fragments keyed by the small
//! receiver sequence id until a message completes, then concatenates the
//! bodies and decodes. Lines that are not AIS at all fall back to the
//! non-AIS sentence decoders and pass through.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::decoder;
use crate::envelope::{AisRecord, Decoded, Fragment, MessageEnvelope};
use crate::framing;
use crate::sentences;

// Orbcomm sometimes leaves out the channel, so it stays optional.
static VDM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)(?P<vdm>
        !(?P<talker>[A-Z][A-Z])(?P<vdm_type>VD[MO])
        ,(?P<sen_tot>\d)        # Total number of sentences.
        ,(?P<sen_num>\d)        # Current sentence number, from 1.
        ,(?P<seq_id>[0-9])?     # Receiver sequence number.
        ,(?P<chan>[AB])?        # VHF channel.
        ,(?P<body>[;:=@a-zA-Z0-9<>\?'`]*)
        ,(?P<fill_bits>\d)\*(?P<checksum>[0-9A-F][0-9A-F])
        )",
    )
    .expect("valid regex")
});

/// Named captures of one bare VDM sentence, checksum-verified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VdmMatch {
    /// The full matched sentence span.
    pub vdm: String,
    pub talker: String,
    pub vdm_type: String,
    pub sen_tot: u32,
    pub sen_num: u32,
    pub seq_id: Option<u32>,
    pub chan: Option<char>,
    pub body: String,
    pub fill_bits: u32,
    pub checksum: String,
}

/// Unpack a bare VDM sentence, or None when the grammar or checksum fails.
pub fn parse(line: &str) -> Option<VdmMatch> {
    let caps = VDM_RE.captures(line)?;

    let vdm = caps["vdm"].to_string();
    let checksum = caps["checksum"].to_string();
    if !framing::checksum(&vdm).eq_ignore_ascii_case(&checksum) {
        return None;
    }

    Some(VdmMatch {
        vdm,
        talker: caps["talker"].to_string(),
        vdm_type: caps["vdm_type"].to_string(),
        sen_tot: caps["sen_tot"].parse().ok()?,
        sen_num: caps["sen_num"].parse().ok()?,
        seq_id: caps.name("seq_id").and_then(|m| m.as_str().parse().ok()),
        chan: caps.name("chan").and_then(|m| m.as_str().chars().next()),
        body: caps["body"].to_string(),
        fill_bits: caps["fill_bits"].parse().ok()?,
        checksum,
    })
}

/// Decode a body with the payload decoder and attach the MD5 fingerprint.
pub(crate) fn decode_body(body: &str, fill_bits: u32) -> Result<AisRecord, decoder::DecodeError> {
    let message = decoder::decode(body, fill_bits)?;
    Ok(AisRecord::new(body, message))
}

/// Run a set of already-reassembled payload lines through the multi-sentence
/// decode path: parse each, require a complete in-order group, join the
/// bodies and decode with the final fragment's fill bits.
pub(crate) fn decode_group(payloads: &[String]) -> Option<AisRecord> {
    let matches: Vec<VdmMatch> = payloads
        .iter()
        .filter(|line| framing::is_vdm(line))
        .filter_map(|line| parse(line))
        .collect();

    let first = matches.first()?;
    if matches.len() != first.sen_tot as usize {
        info!(
            "expected {} sentences in group, found {}",
            first.sen_tot,
            matches.len()
        );
        return None;
    }
    if matches.iter().enumerate().any(|(i, m)| m.sen_num as usize != i + 1) {
        info!("group sentences are out of order");
        return None;
    }

    let body: String = matches.iter().map(|m| m.body.as_str()).collect();
    let fill_bits = matches.last()?.fill_bits;
    match decode_body(&body, fill_bits) {
        Ok(record) => Some(record),
        Err(err) => {
            error!("unable to decode message: {}", err);
            None
        }
    }
}

struct PendingGroup {
    line_nums: Vec<u64>,
    lines: Vec<String>,
    matches: Vec<VdmMatch>,
}

impl PendingGroup {
    fn start(line_num: u64, line: &str, m: VdmMatch) -> Self {
        PendingGroup {
            line_nums: vec![line_num],
            lines: vec![line.to_string()],
            matches: vec![m],
        }
    }

    fn push(&mut self, line_num: u64, line: &str, m: VdmMatch) {
        self.line_nums.push(line_num);
        self.lines.push(line.to_string());
        self.matches.push(m);
    }
}

/// Reassembles bare multi-sentence VDM messages keyed by sequence id.
///
/// Single line messages decode immediately. Parts of multi-line messages
/// are buffered until the final sentence arrives, then the bodies are
/// joined and decoded with the fill bit count of the final sentence.
#[derive(Default)]
pub struct BareAssembler {
    groups: HashMap<u32, PendingGroup>,
}

impl BareAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line. Returns a completed envelope when this line finishes
    /// a message (or passes through), None while a group is in flight or
    /// the line was dropped.
    pub fn put(&mut self, line: &str, line_num: u64) -> Option<MessageEnvelope> {
        let line = line.trim_end();

        let Some(m) = parse(line) else {
            info!("no VDM match for line {}: {}", line_num, line);
            let mut env = MessageEnvelope::raw(line_num, line);
            match sentences::decode(line) {
                Some(sentence) => env.decoded = Some(Decoded::Nmea(sentence)),
                None => info!("no NMEA match for line {}: {}", line_num, line),
            }
            return Some(env);
        };

        if m.sen_tot == 1 {
            return match decode_body(&m.body, m.fill_bits) {
                Ok(record) => {
                    let mut env = MessageEnvelope::raw(line_num, line);
                    env.decoded = Some(Decoded::Ais(record));
                    env.matches = vec![Fragment::Vdm(m)];
                    Some(env)
                }
                Err(err) => {
                    error!("unable to decode message: {}; line {}: {}", err, line_num, line);
                    None
                }
            };
        }

        let Some(seq_id) = m.seq_id else {
            error!(
                "multi-sentence message without a sequence id, dropping line {}: {}",
                line_num, line
            );
            return None;
        };

        if m.sen_num == 1 {
            if let Some(old) = self
                .groups
                .insert(seq_id, PendingGroup::start(line_num, line, m))
            {
                warn!(
                    "incomplete message overwritten by new start, dropped lines {:?}",
                    old.line_nums
                );
            }
            return None;
        }

        let Some(entry) = self.groups.get_mut(&seq_id) else {
            error!(
                "do not have the prior lines of sequence {}, dropping line {}: {}",
                seq_id, line_num, line
            );
            return None;
        };

        if m.sen_num == 0 || entry.lines.len() != (m.sen_num - 1) as usize {
            error!(
                "out of sequence message ({} buffered, sentence {}), discarding group {}",
                entry.lines.len(),
                m.sen_num,
                seq_id
            );
            self.groups.remove(&seq_id);
            return None;
        }

        let complete = m.sen_num == m.sen_tot;
        entry.push(line_num, line, m);
        if !complete {
            return None;
        }

        let entry = self.groups.remove(&seq_id)?;
        let body: String = entry.matches.iter().map(|m| m.body.as_str()).collect();
        let fill_bits = entry.matches.last()?.fill_bits;
        match decode_body(&body, fill_bits) {
            Ok(record) => Some(MessageEnvelope {
                line_nums: entry.line_nums,
                lines: entry.lines,
                matches: entry.matches.into_iter().map(Fragment::Vdm).collect(),
                decoded: Some(Decoded::Ais(record)),
                ..Default::default()
            }),
            Err(err) => {
                error!("unable to decode message: {}", err);
                None
            }
        }
    }
}
