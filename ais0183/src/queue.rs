//! The unifying dispatch queue over the three dialect assemblers.
//!
//! Raw text lines pass through without a decode stage. Bare AIS lines are
//! decoded with no time metadata. USCG and TAG Block lines carry receiver
//! times and extra metadata, reachable through the envelope's `matches`.
//!
//! ```
//! use ais0183::NmeaQueue;
//!
//! let mut queue = NmeaQueue::new();
//! queue.put("!AIVDM,1,1,,A,14VIk0002sMM04vE>V9jGimn08RP,0*0D");
//! let envelope = queue.get().expect("one completed message");
//! assert!(envelope.ais().is_some());
//! ```
//!
//! Ordering across dialects is preserved only within each dialect's own
//! grouping key; envelopes from different keys may complete out of arrival
//! order when their fragments interleave. Each station/sequence scope is
//! the unit of correctness, not global stream order.

use std::collections::VecDeque;

use crate::envelope::MessageEnvelope;
use crate::framing::{self, LineType};
use crate::tag_block::TagBlockAssembler;
use crate::uscg::UscgAssembler;
use crate::vdm::BareAssembler;

/// Classifies each incoming line, routes it to the dialect assembler that
/// owns it, and queues completed envelopes for the caller.
///
/// One instance per input stream; feeding one instance from several
/// threads requires external mutual exclusion around [`NmeaQueue::put`].
#[derive(Default)]
pub struct NmeaQueue {
    bare: BareAssembler,
    tagb: TagBlockAssembler,
    uscg: UscgAssembler,
    line_num: u64,
    queue: VecDeque<MessageEnvelope>,
}

impl NmeaQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line, assigning it the next line number.
    pub fn put(&mut self, line: &str) {
        self.put_with_line_num(line, self.line_num + 1);
    }

    /// Feed one line under an explicit line number. The internal counter
    /// continues from it.
    pub fn put_with_line_num(&mut self, line: &str, line_num: u64) {
        self.line_num = line_num;

        let line = line.trim_end();
        let line_type = framing::line_type(line);

        let envelope = match line_type {
            LineType::Text => Some(MessageEnvelope::raw(line_num, line)),
            LineType::Bare => self.bare.put(line, line_num),
            LineType::Tagb => self.tagb.put(line, line_num),
            LineType::Uscg => self.uscg.put(line, line_num),
        };

        if let Some(mut envelope) = envelope {
            envelope.line_type = line_type;
            self.queue.push_back(envelope);
        }
    }

    /// Pop the oldest completed envelope, if any.
    pub fn get(&mut self) -> Option<MessageEnvelope> {
        self.queue.pop_front()
    }

    /// Number of completed envelopes waiting to be popped.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Decoded, Fragment};

    const BARE_NMEA: &[&str] = &[
        "$GPZDA,203003.00,12,07,2009,00,00,*47",
        "!AIVDM,1,1,,B,23?up2001gGRju>Ap:;R2APP08:c,0*0E",
        "!BSVDM,1,1,,A,15Mj23`PB`o=Of>KjvnJg8PT0L2R,0*7E",
        "!SAVDM,1,1,,B,35Mj2p001qo@5tVKLBWmIDJT01:@,0*33",
        "!AIVDM,1,1,,A,B5NWV1P0<vSE=I3QdK4bGwoUoP06,0*4F",
        "!SAVDM,1,1,,A,403Owi1utn1W0qMtr2AKStg020S:,0*4B",
        "!SAVDM,2,1,4,A,55Mub7P00001L@;SO7TI8DDltqB222222222220O0000067<0620@jhQDTVG,0*43",
        "!SAVDM,2,2,4,A,30H88888880,2*49",
    ];

    const TAG_BLOCK: &[&str] = &[
        r"\n:440661,s:r3669963,c:1428537660*0F\$GPZDA,000253,09,04,2015,+00,00*6C",
        r"\g:1-2-4372,s:rORBCOMM109,c:1426032000,T:2015-03-11 00.00.00*32\!AIVDM,2,1,2,B,576u>F02>hOUI8AGR20tt<j104p4l62222222216H14@@Hoe0JPEDp1TQH88,0*16",
        r"\s:rORBCOMM999u,c:1426032000,T:2015-03-11 00.00.00*36\!AIVDM,1,1,,,;5Qu0v1utmGssvvkA`DRgm100000,0*46",
        r"\g:2-2-4372,s:rORBCOMM109,c:1426032000,T:2015-03-11 00.00.00*31\!AIVDM,2,2,2,B,88888888880,2*25",
        r"\g:1-2-27300,n:636994,s:b003669710,c:1428621738*5F\!SAVDM,2,1,2,B,55Mw@A7J1adAL@?;7WPl58F0U<h4pB222222220t1PN5553fN4g?`4iSp5Rc,0*26",
        r"\g:2-2-27300,n:636995*15\!SAVDM,2,2,2,B,iP`88888880,2*5E",
        r"\n:636996,s:b003669710,c:1428621738*19\!SAVDM,1,1,,B,35Mv4LPP@Go?FFtEbDDWQmlT20k@,0*04",
        r"\g:4-4-993623,n:577969*22\$ARVSI,r003669930,,233948.825272,1831,-97,0*24",
        r"\n:80677,s:b003669952,c:1428884269*2A\!SAVDM,1,1,,B,K8VSqb9LdU28WP8<,0*17",
    ];

    const USCG: &[&str] = &[
        "!SAVDM,1,1,,A,15N4OMPP01I<cGrA1v>Id?vF060l,0*22,b003669978,1429287189",
        "!SAVDM,2,1,4,B,54h@7?02BAF=`L4wN21<eTH4hj2222222222220U4HG6553U06T0C3H0Q@@j,0*5D,d-86,S389,t161310.00,T10.377780,D07MN-MI-LAKBS1,1429287190",
        "!SAVDM,2,2,4,B,88888888880,2*39,d-86,S389,t161310.00,T10.377780,D07MN-MI-LAKBS1,1429287190",
        "!AIVDM,1,1,,B,3592u`iP03GWEflBRosm0Ov@0000,0*70,d-107,S0297,t161407.00,T07.92201452,r11CSDO1,1429287248",
        "!SAVDM,1,1,,B,K8VSqb9LdU28WP8<,0*17,rMySat,1429287258",
    ];

    fn drain(queue: &mut NmeaQueue) -> Vec<MessageEnvelope> {
        let mut out = Vec::new();
        while let Some(envelope) = queue.get() {
            out.push(envelope);
        }
        out
    }

    #[test]
    fn test_text_passes_through() {
        let lines = ["", "a", "123", "$GPZDA", "!AIVDM", "*FF"];
        let mut queue = NmeaQueue::new();
        for line in lines {
            queue.put(line);
        }
        assert_eq!(queue.len(), lines.len());
        for (i, line) in lines.iter().enumerate() {
            let envelope = queue.get().expect("text envelope");
            assert_eq!(envelope.line_nums, vec![i as u64 + 1]);
            assert_eq!(envelope.line_type, LineType::Text);
            assert_eq!(envelope.lines, vec![line.to_string()]);
            assert!(envelope.decoded.is_none());
        }
    }

    #[test]
    fn test_bare_stream() {
        let mut queue = NmeaQueue::new();
        for line in BARE_NMEA {
            queue.put(line);
        }
        assert_eq!(queue.len(), 7);
        let msgs = drain(&mut queue);

        // The ZDA line has a stray comma before its checksum, so it passes
        // through unchanged and undecoded.
        assert_eq!(msgs[0].line_nums, vec![1]);
        assert_eq!(msgs[0].line_type, LineType::Bare);
        assert!(msgs[0].decoded.is_none());

        let record = msgs[1].ais().expect("decoded");
        assert_eq!(record.message.id(), 2);
        assert_eq!(record.md5, "99c8c2804fde0481e6143051930b66c4");
        let Fragment::Vdm(m) = &msgs[1].matches[0] else {
            panic!("expected a VDM fragment");
        };
        assert_eq!(m.checksum, "0E");

        // The two-line type 5 completes last.
        let last = msgs.last().expect("last");
        assert_eq!(last.line_nums, vec![7, 8]);
        assert_eq!(last.ais().expect("decoded").message.id(), 5);
    }

    #[test]
    fn test_tag_block_stream() {
        let mut queue = NmeaQueue::new();
        for line in TAG_BLOCK {
            queue.put(line);
        }
        // Nine lines: two two-line groups collapse into one envelope each,
        // and the orphan VSI group fragment is dropped.
        assert_eq!(queue.len(), 6);
        let msgs = drain(&mut queue);

        for msg in msgs.iter() {
            assert_eq!(msg.line_type, LineType::Tagb);
        }
        let ids: Vec<u8> = msgs
            .iter()
            .filter_map(|m| m.ais())
            .map(|r| r.message.id())
            .collect();
        assert_eq!(ids, vec![11, 5, 5, 3, 27]);

        // The ZDA line decoded through the fallback sentence decoders.
        assert!(matches!(msgs[0].decoded, Some(Decoded::Nmea(_))));

        let last = msgs.last().expect("last");
        assert_eq!(last.line_nums, vec![9]);
        assert_eq!(last.times, vec![Some(1428884269.0)]);
        let record = last.ais().expect("decoded");
        assert_eq!(record.md5, "50898a3435865cf76f1b502b2821672b");
        assert_eq!(record.message.mmsi(), 577305000);
    }

    #[test]
    fn test_uscg_stream() {
        let mut queue = NmeaQueue::new();
        for line in USCG {
            queue.put(line);
        }
        assert_eq!(queue.len(), 4);
        let msgs = drain(&mut queue);

        let ids: Vec<u8> = msgs
            .iter()
            .map(|m| m.ais().expect("decoded").message.id())
            .collect();
        assert_eq!(ids, vec![1, 5, 3, 27]);

        let last = &msgs[3];
        assert_eq!(last.line_type, LineType::Uscg);
        assert_eq!(last.line_nums, vec![5]);
        let Fragment::Uscg(m) = &last.matches[0] else {
            panic!("expected a USCG fragment");
        };
        assert_eq!(m.metadata.station.as_deref(), Some("rMySat"));
        assert_eq!(m.metadata.time, Some(1429287258.0));
    }

    #[test]
    fn test_mixed_stream() {
        let lines = [
            "!SAVDM,1,1,,A,15N4OMPP01I<cGrA1v>Id?vF060l,0*22,b003669978,1429287189",
            "!SAVDM,1,1,,A,403Owi1utn1W0qMtr2AKStg020S:,0*4B",
            r"\n:80677,s:b003669952,c:1428884269*2A\!SAVDM,1,1,,B,K8VSqb9LdU28WP8<,0*17",
            "random text",
        ];
        let mut queue = NmeaQueue::new();
        for line in lines {
            queue.put(line);
        }
        assert_eq!(queue.len(), 4);
        let msgs = drain(&mut queue);

        let ids: Vec<u8> = msgs[..3]
            .iter()
            .map(|m| m.ais().expect("decoded").message.id())
            .collect();
        assert_eq!(ids, vec![1, 4, 27]);

        let line_types: Vec<LineType> = msgs.iter().map(|m| m.line_type).collect();
        assert_eq!(
            line_types,
            vec![LineType::Uscg, LineType::Bare, LineType::Tagb, LineType::Text]
        );
    }

    #[test]
    fn test_single_line_position_report() {
        let mut queue = NmeaQueue::new();
        queue.put("!AIVDM,1,1,,A,14VIk0002sMM04vE>V9jGimn08RP,0*0D");
        assert_eq!(queue.len(), 1);
        let envelope = queue.get().expect("envelope");
        assert_eq!(envelope.line_type, LineType::Bare);
        assert_eq!(envelope.ais().expect("decoded").message.id(), 1);
        let Fragment::Vdm(m) = &envelope.matches[0] else {
            panic!("expected a VDM fragment");
        };
        assert_eq!(m.checksum, "0D");
    }

    #[test]
    fn test_two_line_static_voyage() {
        let mut queue = NmeaQueue::new();
        queue.put("!AIVDM,2,1,2,B,5KNp?6@00000=Phb220u1@Tlv0TV22222222220N0h:22400000000000000,0*2A");
        assert_eq!(queue.len(), 0);
        queue.put("!AIVDM,2,2,2,B,00000000000,2*25");
        assert_eq!(queue.len(), 1);
        let envelope = queue.get().expect("envelope");
        assert_eq!(envelope.line_nums, vec![1, 2]);
        assert_eq!(envelope.ais().expect("decoded").message.id(), 5);
    }

    #[test]
    fn test_explicit_line_number_override() {
        let mut queue = NmeaQueue::new();
        queue.put_with_line_num("!SAVDM,1,1,,B,K8VSqb9LdU28WP8P,0*7B", 100);
        queue.put("random text");
        let first = queue.get().expect("first");
        let second = queue.get().expect("second");
        assert_eq!(first.line_nums, vec![100]);
        assert_eq!(second.line_nums, vec![101]);
    }

    #[test]
    fn test_fresh_engine_is_idempotent() {
        let run = || {
            let mut queue = NmeaQueue::new();
            for line in TAG_BLOCK.iter().chain(USCG).chain(BARE_NMEA) {
                queue.put(line);
            }
            drain(&mut queue)
        };
        assert_eq!(run(), run());
    }
}
