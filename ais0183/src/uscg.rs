//! The legacy USCG comma-appended metadata dialect.
//!
//! The US Coast Guard's older format tacks comma separated values onto the
//! end of a traditional NMEA sentence. It was never formalized in a
//! standard; the TAG Block format is now preferred. Each field except the
//! trailing timestamp starts with a letter code. The timestamp is the
//! datalogger's unix time, not the receiver's, and has been observed to be
//! hours off.
//!
//! Station name and timestamp are nominally required, but some stations
//! mangle or omit the name, so `rUnknown` is substituted when none is
//! found.
//!
//! Example single line message:
//!
//! ```text
//! !ANVDM,1,1,,B,15N6CB0000r86SRFAS:<E@SH08Il,0*43,r08ACERDC,1429287223
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::envelope::{Decoded, Fragment, MessageEnvelope};
use crate::scalar::{maybe_to_number, Scalar};
use crate::sentences;
use crate::vdm::{self, VdmMatch};

static USCG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?P<payload>[^*]*\*[A-F0-9][A-F0-9])
        (?P<uscg_metadata>
          (?:
            (?:,S(?P<slot>\d*))
            |(?:,s(?P<rssi>\d*))                       # Signal strength indicator.
            |(?:,d(?P<signal_strength>[-0-9]*))        # dB.
            |(?:,t(?P<receiver_time>(?P<hour>\d\d)(?P<minute>\d\d)(?P<second>\d\d\.\d*)))
            |(?:,T(?P<time_of_arrival>[^,]*))          # Seconds within the minute.
            |(?:,x(?P<counter>[0-9]*))
            |(?:,(?P<station>(?P<station_type>[rRbBD])[a-zA-Z0-9_-]*))
          )*
          ,(?P<time>\d+(?:\.\d*)?)?                    # Logger timestamp.
        )",
    )
    .expect("valid regex")
});

const UNKNOWN_STATION: &str = "rUnknown";

/// The comma-appended metadata recovered from one USCG line.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UscgMetadata {
    /// The NMEA sentence ahead of the metadata suffix.
    pub payload: String,
    /// The raw metadata suffix, leading comma included.
    pub uscg_metadata: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_time: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_arrival: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_type: Option<char>,
    /// Datalogger unix timestamp, possibly far from receive time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}

/// A USCG fragment: the inner bare VDM sentence plus its metadata suffix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UscgMatch {
    #[serde(flatten)]
    pub vdm: VdmMatch,
    #[serde(flatten)]
    pub metadata: UscgMetadata,
}

/// Recover the metadata suffix of a USCG line, or None when the shape does
/// not match. The inner sentence is not validated here.
pub fn parse_metadata(line: &str) -> Option<UscgMetadata> {
    let caps = USCG_RE.captures(line)?;

    Some(UscgMetadata {
        payload: caps["payload"].to_string(),
        uscg_metadata: caps["uscg_metadata"].to_string(),
        slot: caps.name("slot").map(|m| maybe_to_number(m.as_str())),
        rssi: caps.name("rssi").map(|m| m.as_str().to_string()),
        signal_strength: caps
            .name("signal_strength")
            .map(|m| maybe_to_number(m.as_str())),
        receiver_time: caps
            .name("receiver_time")
            .map(|m| maybe_to_number(m.as_str())),
        hour: caps.name("hour").and_then(|m| m.as_str().parse().ok()),
        minute: caps.name("minute").and_then(|m| m.as_str().parse().ok()),
        second: caps.name("second").and_then(|m| m.as_str().parse().ok()),
        time_of_arrival: caps
            .name("time_of_arrival")
            .map(|m| maybe_to_number(m.as_str())),
        counter: caps.name("counter").map(|m| maybe_to_number(m.as_str())),
        station: caps.name("station").map(|m| m.as_str().to_string()),
        station_type: caps
            .name("station_type")
            .and_then(|m| m.as_str().chars().next()),
        time: caps.name("time").and_then(|m| m.as_str().parse().ok()),
    })
}

struct PendingGroup {
    line_nums: Vec<u64>,
    lines: Vec<String>,
    matches: Vec<UscgMatch>,
    times: Vec<Option<f64>>,
}

impl PendingGroup {
    fn start(line_num: u64, line: &str, m: UscgMatch) -> Self {
        let time = m.metadata.time;
        PendingGroup {
            line_nums: vec![line_num],
            lines: vec![line.to_string()],
            matches: vec![m],
            times: vec![time],
        }
    }

    fn push(&mut self, line_num: u64, line: &str, m: UscgMatch) {
        self.line_nums.push(line_num);
        self.lines.push(line.to_string());
        self.times.push(m.metadata.time);
        self.matches.push(m);
    }
}

/// Reassembles USCG-suffixed messages keyed by (station, sequence id).
///
/// USCG feeds interleave several physical stations, so the station name is
/// part of the grouping key; a bare sequence id is not unique on its own.
#[derive(Default)]
pub struct UscgAssembler {
    groups: HashMap<(String, Option<u32>), PendingGroup>,
}

impl UscgAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, line: &str, line_num: u64) -> Option<MessageEnvelope> {
        let line = line.trim_end();

        let metadata = parse_metadata(line);
        let Some(vdm_match) = vdm::parse(line) else {
            info!("no VDM match for line {}: {}", line_num, line);
            let mut env = MessageEnvelope::raw(line_num, line);
            if let Some(metadata) = metadata {
                env.matches = vec![Fragment::UscgMetadata(metadata)];
            }
            match sentences::decode(line) {
                Some(sentence) => env.decoded = Some(Decoded::Nmea(sentence)),
                None => info!("no NMEA match for line {}: {}", line_num, line),
            }
            return Some(env);
        };

        let metadata = metadata.unwrap_or_else(|| {
            warn!("no USCG metadata on line {}, assuming none: {}", line_num, line);
            UscgMetadata {
                payload: vdm_match.vdm.clone(),
                ..Default::default()
            }
        });

        let station = metadata
            .station
            .clone()
            .unwrap_or_else(|| UNKNOWN_STATION.to_string());
        let m = UscgMatch {
            vdm: vdm_match,
            metadata,
        };

        if m.vdm.sen_tot == 1 {
            return match vdm::decode_body(&m.vdm.body, m.vdm.fill_bits) {
                Ok(record) => {
                    let mut env = MessageEnvelope::raw(line_num, line);
                    env.decoded = Some(Decoded::Ais(record));
                    env.matches = vec![Fragment::Uscg(m)];
                    Some(env)
                }
                Err(err) => {
                    error!("unable to decode message: {}; line {}: {}", err, line_num, line);
                    None
                }
            };
        }

        let key = (station, m.vdm.seq_id);

        if m.vdm.sen_num == 1 {
            if let Some(old) = self
                .groups
                .insert(key.clone(), PendingGroup::start(line_num, line, m))
            {
                warn!(
                    "group {:?} restarted before completing, dropped lines {:?}",
                    key, old.line_nums
                );
            }
            return None;
        }

        let Some(entry) = self.groups.get_mut(&key) else {
            // A partial message with no start; nothing to anchor it to.
            debug!("no open group {:?}, dropping line {}: {}", key, line_num, line);
            return None;
        };

        if m.vdm.sen_num == 0 || entry.lines.len() != (m.vdm.sen_num - 1) as usize {
            error!(
                "out of sequence message ({} buffered, sentence {}), discarding group {:?}",
                entry.lines.len(),
                m.vdm.sen_num,
                key
            );
            self.groups.remove(&key);
            return None;
        }

        let complete = m.vdm.sen_num == m.vdm.sen_tot;
        entry.push(line_num, line, m);
        if !complete {
            // The middle of a message.
            return None;
        }

        let entry = self.groups.remove(&key)?;
        let payloads: Vec<String> = entry
            .matches
            .iter()
            .map(|m| m.metadata.payload.clone())
            .collect();
        let decoded = vdm::decode_group(&payloads);
        if decoded.is_none() {
            info!("unable to decode group of lines {:?}", entry.line_nums);
        }
        Some(MessageEnvelope {
            line_nums: entry.line_nums,
            lines: entry.lines,
            times: entry.times,
            matches: entry.matches.into_iter().map(Fragment::Uscg).collect(),
            decoded: decoded.map(Decoded::Ais),
            ..Default::default()
        })
    }
}
