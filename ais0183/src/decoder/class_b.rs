//! Type 18: Class B equipment position report.

use serde::Serialize;

use super::sixbit::BitField;
use super::DecodeError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassBPositionReport {
    pub id: u8,
    pub repeat_indicator: u32,
    pub mmsi: u32,
    pub spare: u32,
    pub sog: f64,
    pub position_accuracy: u32,
    pub x: f64,
    pub y: f64,
    pub cog: f64,
    pub true_heading: u32,
    pub timestamp: u32,
    pub spare2: u32,
    pub unit_flag: u32,
    pub display_flag: u32,
    pub dsc_flag: u32,
    pub band_flag: u32,
    pub m22_flag: u32,
    pub mode_flag: u32,
    pub raim: bool,
    pub commstate_flag: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_state: Option<u32>,
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

pub(super) fn decode(bits: &BitField) -> Result<ClassBPositionReport, DecodeError> {
    if bits.len() != 168 {
        return Err(DecodeError::BadBitCount {
            id: 18,
            bits: bits.len(),
        });
    }

    let (x, y) = bits.position(57);

    let mut report = ClassBPositionReport {
        id: 18,
        repeat_indicator: bits.uint(6, 2),
        mmsi: bits.uint(8, 30),
        spare: bits.uint(38, 8),
        sog: f64::from(bits.uint(46, 10)) / 10.0,
        position_accuracy: bits.uint(56, 1),
        x,
        y,
        cog: f64::from(bits.uint(112, 12)) / 10.0,
        true_heading: bits.uint(124, 9),
        timestamp: bits.uint(133, 6),
        spare2: bits.uint(139, 2),
        unit_flag: bits.uint(141, 1),
        display_flag: bits.uint(142, 1),
        dsc_flag: bits.uint(143, 1),
        band_flag: bits.uint(144, 1),
        m22_flag: bits.uint(145, 1),
        mode_flag: bits.uint(146, 1),
        raim: bits.flag(147),
        commstate_flag: bits.uint(148, 1),
        sync_state: None,
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

    // Carrier sense units transmit a fixed commstate filler; only decode the
    // commstate for SOTDMA/ITDMA units.
    if report.unit_flag == 0 {
        report.sync_state = Some(bits.uint(149, 2));
        if report.commstate_flag == 0 {
            // SOTDMA
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
            // ITDMA
            report.slot_increment = Some(bits.uint(151, 13));
            report.slots_to_allocate = Some(bits.uint(164, 3));
            report.keep_flag = Some(bits.flag(167));
        }
    }

    Ok(report)
}
