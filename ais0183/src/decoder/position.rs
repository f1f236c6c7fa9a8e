//! Class A position reports (types 1-3) and the long-range broadcast (27).

use serde::Serialize;

use super::sixbit::BitField;
use super::DecodeError;

/// Types 1, 2 and 3: Class A position report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReport {
    pub id: u8,
    pub repeat_indicator: u32,
    pub mmsi: u32,
    pub nav_status: u32,
    pub rot_over_range: bool,
    pub rot_raw: i32,
    pub rot: f64,
    pub sog: f64,
    pub position_accuracy: u32,
    pub x: f64,
    pub y: f64,
    pub cog: f64,
    pub true_heading: u32,
    pub timestamp: u32,
    pub special_manoeuvre: u32,
    pub spare: u32,
    pub raim: bool,
    pub sync_state: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_hour: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_spare: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_stations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_increment: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slots_to_allocate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_flag: Option<bool>,
}

pub(super) fn decode(bits: &BitField, id: u8) -> Result<PositionReport, DecodeError> {
    if bits.len() != 168 {
        return Err(DecodeError::BadBitCount {
            id,
            bits: bits.len(),
        });
    }

    let rot_raw = bits.int(42, 8);
    let mut rot = (f64::from(rot_raw) / 4.733).powi(2);
    if rot_raw < 0 {
        rot = -rot;
    }
    let (x, y) = bits.position(61);

    let mut report = PositionReport {
        id,
        repeat_indicator: bits.uint(6, 2),
        mmsi: bits.uint(8, 30),
        nav_status: bits.uint(38, 4),
        rot_over_range: rot_raw.abs() > 126,
        rot_raw,
        rot,
        sog: f64::from(bits.uint(50, 10)) / 10.0,
        position_accuracy: bits.uint(60, 1),
        x,
        y,
        cog: f64::from(bits.uint(116, 12)) / 10.0,
        true_heading: bits.uint(128, 9),
        timestamp: bits.uint(137, 6),
        special_manoeuvre: bits.uint(143, 2),
        spare: bits.uint(145, 3),
        raim: bits.flag(148),
        sync_state: bits.uint(149, 2),
        slot_timeout: None,
        slot_offset: None,
        utc_hour: None,
        utc_min: None,
        utc_spare: None,
        slot_number: None,
        received_stations: None,
        slot_increment: None,
        slots_to_allocate: None,
        keep_flag: None,
    };

    if id == 1 || id == 2 {
        // SOTDMA communication state.
        let slot_timeout = bits.uint(151, 3);
        report.slot_timeout = Some(slot_timeout);
        match slot_timeout {
            0 => report.slot_offset = Some(bits.uint(154, 14)),
            1 => {
                report.utc_hour = Some(bits.uint(154, 5));
                report.utc_min = Some(bits.uint(159, 7));
                report.utc_spare = Some(bits.uint(166, 2));
            }
            2 | 4 | 6 => report.slot_number = Some(bits.uint(154, 14)),
            _ => report.received_stations = Some(bits.uint(154, 14)),
        }
    } else {
        // ITDMA communication state.
        report.slot_increment = Some(bits.uint(151, 13));
        report.slots_to_allocate = Some(bits.uint(164, 3));
        report.keep_flag = Some(bits.flag(167));
    }

    Ok(report)
}

/// Type 27: long-range AIS broadcast message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRangeReport {
    pub id: u8,
    pub repeat_indicator: u32,
    pub mmsi: u32,
    pub position_accuracy: u32,
    pub raim: bool,
    pub nav_status: u32,
    pub x: f64,
    pub y: f64,
    pub sog: u32,
    pub cog: u32,
    pub gnss: bool,
    pub spare: u32,
}

pub(super) fn decode_long_range(bits: &BitField) -> Result<LongRangeReport, DecodeError> {
    if bits.len() != 96 {
        return Err(DecodeError::BadBitCount {
            id: 27,
            bits: bits.len(),
        });
    }

    let (x, y) = bits.position_low(44);

    Ok(LongRangeReport {
        id: 27,
        repeat_indicator: bits.uint(6, 2),
        mmsi: bits.uint(8, 30),
        position_accuracy: bits.uint(38, 1),
        raim: bits.flag(39),
        nav_status: bits.uint(40, 4),
        x,
        y,
        sog: bits.uint(79, 6),
        cog: bits.uint(85, 9),
        // Zero means a current GNSS position.
        gnss: !bits.flag(94),
        spare: bits.uint(95, 1),
    })
}
