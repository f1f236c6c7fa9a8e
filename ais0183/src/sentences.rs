//! Stateless decoders for non-AIS NMEA sentences.
//!
//! These are the fallback for lines that reach an assembler but do not
//! carry an AIS payload: receiver acknowledgements, alarms, GPS fixes,
//! time references. Each sentence tag maps to one anchored regex and one
//! transform; there is no reassembly and no checksum validation here.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::scalar::{maybe_to_number, Scalar};

static SENTENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[$!](?P<talker>[A-Z][A-Z])(?P<sentence>[A-Z]{3,4}),").expect("valid regex")
});

static ABK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[$!](?P<talker>[A-Z][A-Z])ABK,(?P<mmsi>\d+)?,(?P<chan>[AB])?,(?P<msg_id>\d+)?,(?P<seq_num>\d+)?,(?P<ack_type>\d+)\*[0-9A-F]{2}",
    )
    .expect("valid regex")
});

static ADS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[$!](?P<talker>[A-Z][A-Z])ADS,(?P<id>[^,]+?),(?P<time_utc>(?P<hours>\d\d)(?P<minutes>\d\d)(?P<seconds>\d\d\.\d*))?,(?P<alarm>[AV])?,(?P<time_sync_method>\d)?,(?P<pos_src>[EINS])?,(?P<time_src>[EIN])?\*[0-9A-F]{2}",
    )
    .expect("valid regex")
});

static ALR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[$!](?P<talker>[A-Z][A-Z])ALR,(?P<time_utc>(?P<hours>\d\d)(?P<minutes>\d\d)(?P<seconds>\d\d\.\d*))?,(?P<id>\d+)?,(?P<condition>[AV]),(?P<ack_state>[AV]),(?P<text>[^*]*)\*[0-9A-F]{2}",
    )
    .expect("valid regex")
});

static BBM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[$!](?P<talker>[A-Z][A-Z])BBM,(?P<sen_tot>\d),(?P<sen_num>\d),(?P<seq_num>\d),(?P<chan>\d),(?P<msg_id>\d),(?P<body>[^,*]*),(?P<fill_bits>\d)\*[0-9A-F]{2}",
    )
    .expect("valid regex")
});

static FSR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[$!](?P<talker>[A-Z][A-Z])FSR,(?P<id>[^,]+)?,(?P<time_utc>(?P<hours>\d\d)(?P<minutes>\d\d)(?P<seconds>\d\d(?:\.\d*)?))?,(?P<chan>[A-Z])?,(?P<slots_recv>\d+)?,(?P<slots_self>\d+)?,(?P<crc_fails>\d+)?,(?P<slots_reserved>\d+)?,(?P<slots_reserved_self>\d+)?,(?P<noise_db>-?\d+)?,(?P<slots_above_noise>\d+(?:\.\d*)?)?\*[0-9A-F]{2}",
    )
    .expect("valid regex")
});

static GGA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[$!](?P<talker>[A-Z][A-Z])GGA,(?P<time_utc>(?P<hours>\d\d)(?P<minutes>\d\d)(?P<seconds>\d\d\.\d*))?,(?P<latitude>(?P<lat_deg>\d\d)(?P<lat_min>\d\d\.\d*))?,(?P<latitude_hemisphere>[NS])?,(?P<longitude>(?P<lon_deg>\d{3})(?P<lon_min>\d\d\.\d*))?,(?P<longitude_hemisphere>[EW])?,(?P<gps_quality>\d+)?,(?P<satellites>\d+)?,(?P<hdop>\d+\.\d+)?,(?P<antenna_height>[+-]?\d+(?:\.\d+)?)?,(?P<antenna_height_units>M)?,(?P<geoidal_height>[+-]?\d+(?:\.\d+)?)?,(?P<geoidal_height_units>M)?,(?P<differential_ref_station>[A-Z0-9.]*)?,(?P<differential_age_sec>\d+)?\*[0-9A-F]{2}",
    )
    .expect("valid regex")
});

static TXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[$!](?P<talker>[A-Z][A-Z])TXT,(?P<sen_tot>\d+)?,(?P<sen_num>\d+)?,(?P<seq_num>\d+)?,(?P<text>[^*,][^*]*)?\*[0-9A-F]{2}",
    )
    .expect("valid regex")
});

static ZDA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[$!](?P<talker>[A-Z][A-Z])ZDA,(?P<time_utc>(?P<hours>\d\d)(?P<minutes>\d\d)(?P<seconds>\d\d(?:\.\d*)?))?,(?P<day>\d\d)?,(?P<month>\d\d)?,(?P<year>\d{4})?,(?P<zone_hours>[+-]?\d+)?,(?P<zone_minutes>\d+)?\*[0-9A-F]{2}",
    )
    .expect("valid regex")
});

/// A decoded non-AIS sentence, tagged with its NMEA sentence formatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "msg")]
pub enum NmeaSentence {
    #[serde(rename = "ABK")]
    Abk(Abk),
    #[serde(rename = "ADS")]
    Ads(Ads),
    #[serde(rename = "ALR")]
    Alr(Alr),
    #[serde(rename = "BBM")]
    Bbm(Bbm),
    #[serde(rename = "FSR")]
    Fsr(Fsr),
    #[serde(rename = "GGA")]
    Gga(Gga),
    #[serde(rename = "TXT")]
    Txt(Txt),
    #[serde(rename = "ZDA")]
    Zda(Zda),
}

/// Addressed and binary broadcast acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Abk {
    pub talker: String,
    pub chan: Option<char>,
    pub mmsi: Option<Scalar>,
    pub msg_id: Option<Scalar>,
    pub seq_num: Option<Scalar>,
    pub ack_type: Scalar,
}

/// Automatic device status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ads {
    pub talker: String,
    pub id: String,
    pub alarm: Option<char>,
    pub time_sync_method: Option<Scalar>,
    pub pos_src: Option<char>,
    pub time_src: Option<char>,
    pub when: Option<NaiveTime>,
}

/// Set alarm state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alr {
    pub talker: String,
    pub id: Option<Scalar>,
    pub condition: bool,
    pub ack_state: bool,
    pub text: String,
    pub time: Option<NaiveTime>,
}

/// Binary broadcast message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bbm {
    pub talker: String,
    pub body: String,
    pub sen_tot: Scalar,
    pub sen_num: Scalar,
    pub seq_num: Scalar,
    pub chan: Scalar,
    pub msg_id: Scalar,
    pub fill_bits: Scalar,
}

/// Frame summary of a receiver's slot usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fsr {
    pub id: Option<String>,
    pub chan: Option<char>,
    pub time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots_recv: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots_self: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crc_fails: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots_reserved: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots_reserved_self: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_db: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots_above_noise: Option<Scalar>,
}

/// GPS fix data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gga {
    pub time: Option<NaiveTime>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps_quality: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satellites: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hdop: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antenna_height: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geoidal_height: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differential_ref_station: Option<Scalar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub differential_age_sec: Option<Scalar>,
}

/// Text transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Txt {
    pub talker: String,
    pub text: Option<String>,
    pub sen_tot: Option<Scalar>,
    pub sen_num: Option<Scalar>,
    pub seq_num: Option<Scalar>,
}

/// Time and date in UTC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zda {
    pub talker: String,
    pub datetime: Option<NaiveDateTime>,
    pub zone_hours: Option<Scalar>,
    pub zone_minutes: Option<Scalar>,
}

fn time_of_day(hours: &str, minutes: &str, seconds: &str) -> Option<NaiveTime> {
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;
    let micros = (seconds.fract() * 1e6).floor() as u32;
    NaiveTime::from_hms_micro_opt(hours, minutes, seconds.trunc() as u32, micros)
}

fn captured_time(caps: &regex::Captures) -> Option<NaiveTime> {
    match (caps.name("hours"), caps.name("minutes"), caps.name("seconds")) {
        (Some(h), Some(m), Some(s)) => time_of_day(h.as_str(), m.as_str(), s.as_str()),
        _ => None,
    }
}

fn scalar(caps: &regex::Captures, name: &str) -> Option<Scalar> {
    caps.name(name).map(|m| maybe_to_number(m.as_str()))
}

fn single_char(caps: &regex::Captures, name: &str) -> Option<char> {
    caps.name(name).and_then(|m| m.as_str().chars().next())
}

fn abk(line: &str) -> Option<NmeaSentence> {
    let caps = ABK_RE.captures(line)?;
    Some(NmeaSentence::Abk(Abk {
        talker: caps["talker"].to_string(),
        chan: single_char(&caps, "chan"),
        mmsi: scalar(&caps, "mmsi"),
        msg_id: scalar(&caps, "msg_id"),
        seq_num: scalar(&caps, "seq_num"),
        ack_type: maybe_to_number(&caps["ack_type"]),
    }))
}

fn ads(line: &str) -> Option<NmeaSentence> {
    let caps = ADS_RE.captures(line)?;
    Some(NmeaSentence::Ads(Ads {
        talker: caps["talker"].to_string(),
        id: caps["id"].to_string(),
        alarm: single_char(&caps, "alarm"),
        time_sync_method: scalar(&caps, "time_sync_method"),
        pos_src: single_char(&caps, "pos_src"),
        time_src: single_char(&caps, "time_src"),
        when: captured_time(&caps),
    }))
}

fn alr(line: &str) -> Option<NmeaSentence> {
    let caps = ALR_RE.captures(line)?;
    Some(NmeaSentence::Alr(Alr {
        talker: caps["talker"].to_string(),
        id: scalar(&caps, "id"),
        condition: &caps["condition"] == "A",
        ack_state: &caps["ack_state"] == "A",
        text: caps["text"].to_string(),
        time: captured_time(&caps),
    }))
}

fn bbm(line: &str) -> Option<NmeaSentence> {
    let caps = BBM_RE.captures(line)?;
    Some(NmeaSentence::Bbm(Bbm {
        talker: caps["talker"].to_string(),
        body: caps["body"].to_string(),
        sen_tot: maybe_to_number(&caps["sen_tot"]),
        sen_num: maybe_to_number(&caps["sen_num"]),
        seq_num: maybe_to_number(&caps["seq_num"]),
        chan: maybe_to_number(&caps["chan"]),
        msg_id: maybe_to_number(&caps["msg_id"]),
        fill_bits: maybe_to_number(&caps["fill_bits"]),
    }))
}

fn fsr(line: &str) -> Option<NmeaSentence> {
    let caps = FSR_RE.captures(line)?;
    Some(NmeaSentence::Fsr(Fsr {
        id: caps.name("id").map(|m| m.as_str().to_string()),
        chan: single_char(&caps, "chan"),
        time: captured_time(&caps),
        slots_recv: scalar(&caps, "slots_recv"),
        slots_self: scalar(&caps, "slots_self"),
        crc_fails: scalar(&caps, "crc_fails"),
        slots_reserved: scalar(&caps, "slots_reserved"),
        slots_reserved_self: scalar(&caps, "slots_reserved_self"),
        noise_db: scalar(&caps, "noise_db"),
        slots_above_noise: scalar(&caps, "slots_above_noise"),
    }))
}

fn gga(line: &str) -> Option<NmeaSentence> {
    let caps = GGA_RE.captures(line)?;

    let longitude = match (caps.name("lon_deg"), caps.name("lon_min")) {
        (Some(deg), Some(min)) => {
            let deg: f64 = deg.as_str().parse().ok()?;
            let min: f64 = min.as_str().parse().ok()?;
            let mut x = deg + min / 60.0;
            if caps.name("longitude_hemisphere").map(|m| m.as_str()) == Some("W") {
                x = -x;
            }
            Some(x)
        }
        _ => None,
    };
    let latitude = match (caps.name("lat_deg"), caps.name("lat_min")) {
        (Some(deg), Some(min)) => {
            let deg: f64 = deg.as_str().parse().ok()?;
            let min: f64 = min.as_str().parse().ok()?;
            let mut y = deg + min / 60.0;
            if caps.name("latitude_hemisphere").map(|m| m.as_str()) == Some("S") {
                y = -y;
            }
            Some(y)
        }
        _ => None,
    };

    Some(NmeaSentence::Gga(Gga {
        time: captured_time(&caps),
        longitude,
        latitude,
        gps_quality: scalar(&caps, "gps_quality"),
        satellites: scalar(&caps, "satellites"),
        hdop: scalar(&caps, "hdop"),
        antenna_height: scalar(&caps, "antenna_height"),
        geoidal_height: scalar(&caps, "geoidal_height"),
        differential_ref_station: scalar(&caps, "differential_ref_station"),
        differential_age_sec: scalar(&caps, "differential_age_sec"),
    }))
}

fn txt(line: &str) -> Option<NmeaSentence> {
    let caps = TXT_RE.captures(line)?;
    Some(NmeaSentence::Txt(Txt {
        talker: caps["talker"].to_string(),
        text: caps.name("text").map(|m| m.as_str().to_string()),
        sen_tot: scalar(&caps, "sen_tot"),
        sen_num: scalar(&caps, "sen_num"),
        seq_num: scalar(&caps, "seq_num"),
    }))
}

fn zda(line: &str) -> Option<NmeaSentence> {
    let caps = ZDA_RE.captures(line)?;

    let datetime = match (
        caps.name("year"),
        caps.name("month"),
        caps.name("day"),
        captured_time(&caps),
    ) {
        (Some(year), Some(month), Some(day), Some(time)) => NaiveDate::from_ymd_opt(
            year.as_str().parse().ok()?,
            month.as_str().parse().ok()?,
            day.as_str().parse().ok()?,
        )
        .map(|date| date.and_time(time)),
        _ => None,
    };

    Some(NmeaSentence::Zda(Zda {
        talker: caps["talker"].to_string(),
        datetime,
        zone_hours: scalar(&caps, "zone_hours"),
        zone_minutes: scalar(&caps, "zone_minutes"),
    }))
}

/// Best-effort decode of one non-AIS sentence. Returns None for anything
/// that is not a recognized sentence.
pub fn decode(line: &str) -> Option<NmeaSentence> {
    let line = line.trim_end();
    let caps = SENTENCE_RE.captures(line)?;

    match &caps["sentence"] {
        "ABK" => abk(line),
        "ADS" => ads(line),
        "ALR" => alr(line),
        "BBM" => bbm(line),
        "FSR" => fsr(line),
        "GGA" => gga(line),
        "TXT" => txt(line),
        "ZDA" => zda(line),
        other => {
            debug!("skipping sentence {}: {}", other, line);
            None
        }
    }
}
