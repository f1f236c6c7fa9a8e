//! Bit-level decoding of six-bit packed AIS payloads.
//!
//! The assemblers hand a reassembled payload body plus its fill bit count
//! to [`decode`], which unpacks the armoring and dispatches on the message
//! id in the first six bits. Decoders are provided for the message types
//! carried by the position/static report streams this crate ingests:
//! 1-3, 4, 5, 11, 18, 24 and 27. Anything else is reported as unsupported
//! and the caller decides whether the raw envelope is still worth emitting.

mod base_station;
mod class_b;
mod position;
mod sixbit;
mod statics;

use serde::Serialize;
use thiserror::Error;

pub use base_station::BaseStationReport;
pub use class_b::ClassBPositionReport;
pub use position::{LongRangeReport, PositionReport};
pub use sixbit::BitField;
pub use statics::{StaticDataReport, StaticVoyageData};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("message type {0} is not supported")]
    UnsupportedType(u8),
    #[error("payload character {0:?} is outside the six bit alphabet")]
    BadCharacter(char),
    #[error("fill bits must be 0..=5, got {0}")]
    BadFillBits(u32),
    #[error("empty payload")]
    EmptyPayload,
    #[error("wrong number of bits for message type {id}: {bits}")]
    BadBitCount { id: u8, bits: usize },
    #[error("bad content in message type {id}: part {part}")]
    BadContent { id: u8, part: u32 },
}

/// A decoded AIS message, tagged by the wire message id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AisMessage {
    Position(PositionReport),
    BaseStation(BaseStationReport),
    StaticVoyage(StaticVoyageData),
    ClassBPosition(ClassBPositionReport),
    StaticData(StaticDataReport),
    LongRange(LongRangeReport),
}

impl AisMessage {
    /// The wire message id (1..=27).
    pub fn id(&self) -> u8 {
        match self {
            AisMessage::Position(m) => m.id,
            AisMessage::BaseStation(m) => m.id,
            AisMessage::StaticVoyage(m) => m.id,
            AisMessage::ClassBPosition(m) => m.id,
            AisMessage::StaticData(m) => m.id,
            AisMessage::LongRange(m) => m.id,
        }
    }

    /// The reporting station's MMSI.
    pub fn mmsi(&self) -> u32 {
        match self {
            AisMessage::Position(m) => m.mmsi,
            AisMessage::BaseStation(m) => m.mmsi,
            AisMessage::StaticVoyage(m) => m.mmsi,
            AisMessage::ClassBPosition(m) => m.mmsi,
            AisMessage::StaticData(m) => m.mmsi,
            AisMessage::LongRange(m) => m.mmsi,
        }
    }
}

/// Decode a reassembled payload body.
pub fn decode(body: &str, fill_bits: u32) -> Result<AisMessage, DecodeError> {
    let bits = BitField::parse(body, fill_bits)?;
    let id = bits.uint(0, 6) as u8;
    match id {
        1..=3 => position::decode(&bits, id).map(AisMessage::Position),
        4 | 11 => base_station::decode(&bits, id).map(AisMessage::BaseStation),
        5 => statics::decode_voyage(&bits).map(AisMessage::StaticVoyage),
        18 => class_b::decode(&bits).map(AisMessage::ClassBPosition),
        24 => statics::decode_report(&bits).map(AisMessage::StaticData),
        27 => position::decode_long_range(&bits).map(AisMessage::LongRange),
        other => Err(DecodeError::UnsupportedType(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_id() {
        assert_eq!(
            decode("14VIk0002sMM04vE>V9jGimn08RP", 0).expect("decode").id(),
            1
        );
        assert_eq!(
            decode("K8VSqb9LdU28WP8<", 0).expect("decode").id(),
            27
        );
    }

    #[test]
    fn test_unsupported_type() {
        // Type 7 binary acknowledgement is outside the supported set.
        assert_eq!(
            decode("78KDut1BAFeu", 0).unwrap_err(),
            DecodeError::UnsupportedType(7)
        );
    }

    #[test]
    fn test_mmsi_accessor() {
        let msg = decode("K8VSqb9LdU28WP8<", 0).expect("decode");
        assert_eq!(msg.mmsi(), 577305000);
    }
}
