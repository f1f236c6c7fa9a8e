//! AIS over NMEA 0183 front end.
//!
//! This library turns a stream of text lines carrying AIS ship-tracking
//! reports into structured message envelopes:
//! - Line classification across the three competing wire dialects (bare
//!   NMEA, NMEA TAG BLOCK, legacy USCG comma-appended metadata)
//! - Multi-sentence reassembly with one in-flight group per station,
//!   channel and sequence scope
//! - XOR checksum validation and recomputation
//! - Payload decoding of the common position/static report types, with an
//!   MD5 body fingerprint for downstream deduplication
//! - Fallback decoders for non-AIS sentences (ABK, ALR, GGA, TXT, ZDA, ...)
//!
//! # Example
//!
//! ```
//! use ais0183::NmeaQueue;
//!
//! let mut queue = NmeaQueue::new();
//! queue.put("!AIVDM,1,1,,A,14VIk0002sMM04vE>V9jGimn08RP,0*0D");
//!
//! while let Some(envelope) = queue.get() {
//!     if let Some(record) = envelope.ais() {
//!         println!("type {} from {}", record.message.id(), record.message.mmsi());
//!     }
//! }
//! ```
//!
//! The engine performs no I/O and never blocks: every `put` classifies,
//! reassembles and decodes synchronously before returning. Feed each input
//! stream its own [`NmeaQueue`].

pub mod decoder;
pub mod envelope;
pub mod framing;
pub mod gpsd;
pub mod normalize;
pub mod queue;
pub mod reader;
pub mod scalar;
pub mod sentences;
pub mod tag_block;
pub mod uscg;
pub mod vdm;

// Re-export commonly used types
pub use decoder::{decode, AisMessage, DecodeError};
pub use envelope::{AisRecord, Decoded, Fragment, MessageEnvelope};
pub use framing::{checksum, line_type, LineType};
pub use queue::NmeaQueue;
pub use reader::NmeaReader;
pub use scalar::{maybe_to_number, Scalar};
