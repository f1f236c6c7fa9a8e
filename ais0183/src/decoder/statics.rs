//! Static vessel data: type 5 (Class A static and voyage related data) and
//! type 24 (Class B static data report, parts A and B).

use serde::Serialize;

use super::sixbit::BitField;
use super::DecodeError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticVoyageData {
    pub id: u8,
    pub repeat_indicator: u32,
    pub mmsi: u32,
    pub ais_version: u32,
    pub imo_num: u32,
    pub callsign: String,
    pub name: String,
    pub type_and_cargo: u32,
    pub dim_a: u32,
    pub dim_b: u32,
    pub dim_c: u32,
    pub dim_d: u32,
    pub fix_type: u32,
    pub eta_month: u32,
    pub eta_day: u32,
    pub eta_hour: u32,
    pub eta_minute: u32,
    pub draught: f64,
    pub destination: String,
    pub dte: u32,
    pub spare: u32,
}

pub(super) fn decode_voyage(bits: &BitField) -> Result<StaticVoyageData, DecodeError> {
    if bits.len() != 424 {
        return Err(DecodeError::BadBitCount {
            id: 5,
            bits: bits.len(),
        });
    }

    Ok(StaticVoyageData {
        id: 5,
        repeat_indicator: bits.uint(6, 2),
        mmsi: bits.uint(8, 30),
        ais_version: bits.uint(38, 2),
        imo_num: bits.uint(40, 30),
        callsign: bits.text(70, 42),
        name: bits.text(112, 120),
        type_and_cargo: bits.uint(232, 8),
        dim_a: bits.uint(240, 9),
        dim_b: bits.uint(249, 9),
        dim_c: bits.uint(258, 6),
        dim_d: bits.uint(264, 6),
        fix_type: bits.uint(270, 4),
        eta_month: bits.uint(274, 4),
        eta_day: bits.uint(278, 5),
        eta_hour: bits.uint(283, 5),
        eta_minute: bits.uint(288, 6),
        draught: f64::from(bits.uint(294, 8)) / 10.0,
        destination: bits.text(302, 120),
        dte: bits.uint(422, 1),
        spare: bits.uint(423, 1),
    })
}

/// Type 24. Part A carries only the name; part B the rest of the statics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticDataReport {
    pub id: u8,
    pub repeat_indicator: u32,
    pub mmsi: u32,
    pub part_num: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_and_cargo: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dim_a: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dim_b: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dim_c: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dim_d: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spare: Option<u32>,
}

pub(super) fn decode_report(bits: &BitField) -> Result<StaticDataReport, DecodeError> {
    if bits.len() != 160 && bits.len() != 168 {
        return Err(DecodeError::BadBitCount {
            id: 24,
            bits: bits.len(),
        });
    }

    let part_num = bits.uint(38, 2);
    let mut report = StaticDataReport {
        id: 24,
        repeat_indicator: bits.uint(6, 2),
        mmsi: bits.uint(8, 30),
        part_num,
        name: None,
        type_and_cargo: None,
        vendor_id: None,
        callsign: None,
        dim_a: None,
        dim_b: None,
        dim_c: None,
        dim_d: None,
        spare: None,
    };

    match part_num {
        0 => {
            if bits.len() != 160 {
                return Err(DecodeError::BadBitCount {
                    id: 24,
                    bits: bits.len(),
                });
            }
            report.name = Some(bits.text(40, 120));
        }
        1 => {
            if bits.len() != 168 {
                return Err(DecodeError::BadBitCount {
                    id: 24,
                    bits: bits.len(),
                });
            }
            report.type_and_cargo = Some(bits.uint(40, 8));
            report.vendor_id = Some(bits.text(48, 42));
            report.callsign = Some(bits.text(90, 42));
            report.dim_a = Some(bits.uint(132, 9));
            report.dim_b = Some(bits.uint(141, 9));
            report.dim_c = Some(bits.uint(150, 6));
            report.dim_d = Some(bits.uint(156, 6));
            report.spare = Some(bits.uint(162, 6));
        }
        // Parts 2 and 3 are not defined by ITU.
        other => return Err(DecodeError::BadContent { id: 24, part: other }),
    }

    Ok(report)
}
