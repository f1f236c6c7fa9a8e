//! The NMEA 4.0 TAG (Transport, Annotate, and Group) Block dialect.
//!
//! A TAG Block line is `\<metadata>*<checksum>\<payload>` where the
//! metadata is a comma separated set of single-letter `key:value` tags.
//! Lines carrying a `g:` group descriptor are fragments of a multi-sentence
//! message and reassemble keyed by the numeric group id; everything else is
//! a complete unit and passes straight through.
//!
//! Unlike the bare dialect there is no checksum-ignore fallback here: a
//! metadata span that fails its checksum kills the whole line.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::envelope::{AisRecord, Decoded, Fragment, MessageEnvelope};
use crate::framing;
use crate::scalar::{maybe_to_number, Scalar};
use crate::sentences;
use crate::vdm;

// The `c:` tag officially holds integer seconds; allow a decimal part and
// millisecond magnitudes beyond the TAG BLOCK spec.
static TAG_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^\\
        (?P<metadata>
          (?:
            (?:
              c:(?P<time>\d{10,15}(?:\.\d*)?)      # Receiver unix time.
              |d:(?P<dest>[^*,\\]{1,15})           # Destination.
              |g:(?P<group>(?P<sentence_num>\d)-(?P<sentence_tot>\d)-(?P<group_id>\d+))
              |n:(?P<line_num>\d+)                 # Line count.
              |q:(?P<quality>\w)                   # Orbcomm quality code.
              |r:(?P<rel_time>\d+)                 # Relative time.
              |s:(?P<rcvr>[^$*,!\\]{1,15})         # Source / station.
              |t:(?P<text>[^$*,!\\]+)              # Text string.
              |T:(?P<text_date>[^$*,!\\]+)         # Orbcomm readable date.
            ),?
          )+
          \*(?P<tag_checksum>[0-9A-Fa-f]{2})
        )
        \\(?P<payload>.*)",
    )
    .expect("valid regex")
});

// Millisecond times dwarf any plausible second count.
const MILLISECOND_THRESHOLD: f64 = 40_000_000_000.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TagBlockError {
    #[error("line does not match the TAG BLOCK grammar")]
    Grammar,
    #[error("TAG BLOCK checksum mismatch: expected {expected}, computed {computed}")]
    Checksum { expected: String, computed: String },
}

/// The `g:` group descriptor: `sentence-sentence_total-group_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTag {
    pub sentence_num: u32,
    pub sentence_tot: u32,
    pub group_id: u64,
}

/// Named captures of one TAG Block line, checksum-verified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagBlockMatch {
    /// The metadata span between the backslashes, checksum included.
    pub metadata: String,
    pub payload: String,
    pub tag_checksum: String,
    /// Receiver unix time, folded to seconds.
    pub time: Option<f64>,
    pub dest: Option<Scalar>,
    pub group: Option<GroupTag>,
    pub line_num: Option<i64>,
    pub quality: Option<String>,
    pub rel_time: Option<i64>,
    pub rcvr: Option<String>,
    pub text: Option<String>,
    pub text_date: Option<String>,
}

/// Tag metadata of a reassembled group: the earliest fragment's tags are
/// the base and later fragments override on key collision.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TagBlockTags {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_num: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rel_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rcvr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_date: Option<String>,
}

fn merge_tags(matches: &[TagBlockMatch]) -> TagBlockTags {
    let mut tags = TagBlockTags::default();
    for m in matches {
        if m.time.is_some() {
            tags.time = m.time;
        }
        if m.dest.is_some() {
            tags.dest = m.dest.clone();
        }
        if m.line_num.is_some() {
            tags.line_num = m.line_num;
        }
        if m.quality.is_some() {
            tags.quality = m.quality.clone();
        }
        if m.rel_time.is_some() {
            tags.rel_time = m.rel_time;
        }
        if m.rcvr.is_some() {
            tags.rcvr = m.rcvr.clone();
        }
        if m.text.is_some() {
            tags.text = m.text.clone();
        }
        if m.text_date.is_some() {
            tags.text_date = m.text_date.clone();
        }
    }
    tags
}

/// Unpack a TAG Block line.
///
/// The grammar must match and the checksum over the metadata span must
/// verify; there is no pass-through for a corrupt checksum in this dialect.
pub fn parse(line: &str) -> Result<TagBlockMatch, TagBlockError> {
    let caps = TAG_BLOCK_RE.captures(line).ok_or(TagBlockError::Grammar)?;

    let metadata = caps["metadata"].to_string();
    let expected = caps["tag_checksum"].to_ascii_uppercase();
    let computed = framing::checksum(&metadata);
    if computed != expected {
        return Err(TagBlockError::Checksum { expected, computed });
    }

    let time = caps.name("time").and_then(|m| m.as_str().parse::<f64>().ok());
    let time = time.map(|t| {
        if t > MILLISECOND_THRESHOLD {
            t / 1000.0
        } else {
            t
        }
    });

    let group = match (
        caps.name("sentence_num"),
        caps.name("sentence_tot"),
        caps.name("group_id"),
    ) {
        (Some(num), Some(tot), Some(id)) => Some(GroupTag {
            sentence_num: num.as_str().parse().map_err(|_| TagBlockError::Grammar)?,
            sentence_tot: tot.as_str().parse().map_err(|_| TagBlockError::Grammar)?,
            group_id: id.as_str().parse().map_err(|_| TagBlockError::Grammar)?,
        }),
        _ => None,
    };

    Ok(TagBlockMatch {
        metadata,
        payload: caps["payload"].to_string(),
        tag_checksum: expected,
        time,
        dest: caps.name("dest").map(|m| maybe_to_number(m.as_str())),
        group,
        line_num: caps.name("line_num").and_then(|m| m.as_str().parse().ok()),
        quality: caps.name("quality").map(|m| m.as_str().to_string()),
        rel_time: caps.name("rel_time").and_then(|m| m.as_str().parse().ok()),
        rcvr: caps.name("rcvr").map(|m| m.as_str().to_string()),
        text: caps.name("text").map(|m| m.as_str().to_string()),
        text_date: caps.name("text_date").map(|m| m.as_str().to_string()),
    })
}

fn decode_tag_single(payload: &str) -> Option<AisRecord> {
    let m = vdm::parse(payload)?;
    if m.sen_tot != 1 {
        error!("multi-sentence payload in a group-less TAG block: {}", payload);
        return None;
    }
    match vdm::decode_body(&m.body, m.fill_bits) {
        Ok(record) => Some(record),
        Err(err) => {
            error!("unable to decode: {}", err);
            None
        }
    }
}

struct PendingGroup {
    line_nums: Vec<u64>,
    lines: Vec<String>,
    matches: Vec<TagBlockMatch>,
    times: Vec<Option<f64>>,
}

impl PendingGroup {
    fn start(line_num: u64, line: &str, m: TagBlockMatch) -> Self {
        let time = m.time;
        PendingGroup {
            line_nums: vec![line_num],
            lines: vec![line.to_string()],
            matches: vec![m],
            times: vec![time],
        }
    }

    fn push(&mut self, line_num: u64, line: &str, m: TagBlockMatch) {
        self.line_nums.push(line_num);
        self.lines.push(line.to_string());
        self.times.push(m.time);
        self.matches.push(m);
    }
}

/// Reassembles TAG Block group messages keyed by the `g:` tag's group id.
///
/// Group-less lines pass straight through, decoded inline when their
/// payload is a single bare AIS sentence (with the non-AIS sentence
/// decoders as fallback).
#[derive(Default)]
pub struct TagBlockAssembler {
    groups: HashMap<u64, PendingGroup>,
}

impl TagBlockAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, line: &str, line_num: u64) -> Option<MessageEnvelope> {
        let line = line.trim_end();

        let m = match parse(line) {
            Ok(m) => m,
            Err(TagBlockError::Grammar) => {
                info!("no TAG BLOCK match for line {}: {}", line_num, line);
                return Some(MessageEnvelope::raw(line_num, line));
            }
            Err(err) => {
                error!("dropping line {}: {}", line_num, err);
                return None;
            }
        };

        let Some(group) = m.group.clone() else {
            let mut env = MessageEnvelope::raw(line_num, line);
            env.times = vec![m.time];
            match decode_tag_single(&m.payload) {
                Some(record) => env.decoded = Some(Decoded::Ais(record)),
                None => {
                    info!("not a single AIS sentence, trying the NMEA decoders");
                    match sentences::decode(&m.payload) {
                        Some(sentence) => env.decoded = Some(Decoded::Nmea(sentence)),
                        None => info!("no NMEA match for line {}: {}", line_num, line),
                    }
                }
            }
            env.matches = vec![Fragment::TagBlock(m)];
            return Some(env);
        };

        if group.sentence_num == 1 {
            if let Some(old) = self
                .groups
                .insert(group.group_id, PendingGroup::start(line_num, line, m))
            {
                warn!(
                    "group {} restarted before completing, dropped lines {:?}",
                    group.group_id, old.line_nums
                );
            }
            return None;
        }

        let Some(entry) = self.groups.get_mut(&group.group_id) else {
            error!(
                "no open group {} for line {}, dropping: {}",
                group.group_id, line_num, line
            );
            return None;
        };
        entry.push(line_num, line, m);

        if group.sentence_num != group.sentence_tot {
            // The middle of a message.
            return None;
        }

        let entry = self.groups.remove(&group.group_id)?;
        let payloads: Vec<String> = entry.matches.iter().map(|m| m.payload.clone()).collect();
        let decoded = vdm::decode_group(&payloads);
        if decoded.is_none() {
            info!("unable to decode group of lines {:?}", entry.line_nums);
        }
        Some(MessageEnvelope {
            line_nums: entry.line_nums,
            lines: entry.lines,
            times: entry.times,
            tags: Some(merge_tags(&entry.matches)),
            matches: entry.matches.into_iter().map(Fragment::TagBlock).collect(),
            decoded: decoded.map(Decoded::Ais),
            ..Default::default()
        })
    }
}
