//! Types 4 and 11: base station report and UTC/date response.

use serde::Serialize;

use super::sixbit::BitField;
use super::DecodeError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseStationReport {
    pub id: u8,
    pub repeat_indicator: u32,
    pub mmsi: u32,
    pub year: u32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub position_accuracy: u32,
    pub x: f64,
    pub y: f64,
    pub fix_type: u32,
    pub spare: u32,
    pub raim: bool,
    pub sync_state: u32,
    pub slot_timeout: u32,
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
}

pub(super) fn decode(bits: &BitField, id: u8) -> Result<BaseStationReport, DecodeError> {
    if bits.len() != 168 {
        return Err(DecodeError::BadBitCount {
            id,
            bits: bits.len(),
        });
    }

    let (x, y) = bits.position(79);

    let mut report = BaseStationReport {
        id,
        repeat_indicator: bits.uint(6, 2),
        mmsi: bits.uint(8, 30),
        year: bits.uint(38, 14),
        month: bits.uint(52, 4),
        day: bits.uint(56, 5),
        hour: bits.uint(61, 5),
        minute: bits.uint(66, 6),
        second: bits.uint(72, 6),
        position_accuracy: bits.uint(78, 1),
        x,
        y,
        fix_type: bits.uint(134, 4),
        spare: bits.uint(138, 10),
        raim: bits.flag(148),
        sync_state: bits.uint(149, 2),
        slot_timeout: bits.uint(151, 3),
        slot_offset: None,
        utc_hour: None,
        utc_min: None,
        utc_spare: None,
        slot_number: None,
        received_stations: None,
    };

    // SOTDMA communication state.
    match report.slot_timeout {
        0 => report.slot_offset = Some(bits.uint(154, 14)),
        1 => {
            report.utc_hour = Some(bits.uint(154, 5));
            report.utc_min = Some(bits.uint(159, 7));
            report.utc_spare = Some(bits.uint(166, 2));
        }
        2 | 4 | 6 => report.slot_number = Some(bits.uint(154, 14)),
        _ => report.received_stations = Some(bits.uint(154, 14)),
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::super::{decode, AisMessage};

    #[test]
    fn test_type_4_base_station() {
        let msg = decode("4h3OdJQutqGssIw1T`JFhg700d09", 0).expect("decode");
        let AisMessage::BaseStation(report) = msg else {
            panic!("expected a base station report");
        };
        assert_eq!(report.id, 4);
        assert_eq!(report.year, 2015);
        assert_eq!(report.month, 3);
        assert_eq!(report.day, 18);
        assert_eq!(report.fix_type, 7);
    }

    #[test]
    fn test_type_11_utc_response() {
        let msg = decode(";3P<f6iuiq00aOUu8DOD@j100000", 0).expect("decode");
        let AisMessage::BaseStation(report) = msg else {
            panic!("expected a base station report");
        };
        assert_eq!(report.id, 11);
        assert_eq!(report.year, 2012);
    }
}
