//! A reader-backed iterator over completed message envelopes.

use std::io::BufRead;

use tracing::warn;

use crate::envelope::MessageEnvelope;
use crate::queue::NmeaQueue;

/// Feeds lines from any buffered reader through an owned [`NmeaQueue`] and
/// yields completed envelopes.
///
/// Iteration ends at end of input; any still-incomplete groups are
/// discarded with the queue.
pub struct NmeaReader<R> {
    lines: std::io::Lines<R>,
    queue: NmeaQueue,
}

impl<R: BufRead> NmeaReader<R> {
    pub fn new(reader: R) -> Self {
        NmeaReader {
            lines: reader.lines(),
            queue: NmeaQueue::new(),
        }
    }
}

impl<R: BufRead> Iterator for NmeaReader<R> {
    type Item = MessageEnvelope;

    fn next(&mut self) -> Option<MessageEnvelope> {
        loop {
            if let Some(envelope) = self.queue.get() {
                return Some(envelope);
            }
            match self.lines.next() {
                Some(Ok(line)) => self.queue.put(&line),
                Some(Err(err)) => {
                    warn!("read error, ending stream: {}", err);
                    return None;
                }
                None => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::LineType;

    #[test]
    fn test_reads_mixed_stream() {
        let data = "\
!SAVDM,1,1,,A,15N4OMPP01I<cGrA1v>Id?vF060l,0*22,b003669978,1429287189
!SAVDM,1,1,,A,403Owi1utn1W0qMtr2AKStg020S:,0*4B
random text
";
        let reader = NmeaReader::new(data.as_bytes());
        let envelopes: Vec<MessageEnvelope> = reader.collect();
        assert_eq!(envelopes.len(), 3);
        assert_eq!(envelopes[0].line_type, LineType::Uscg);
        assert_eq!(envelopes[1].line_type, LineType::Bare);
        assert_eq!(envelopes[2].line_type, LineType::Text);
        assert_eq!(envelopes[2].line_nums, vec![3]);
    }

    #[test]
    fn test_multi_sentence_spans_reads() {
        let data = "\
!ABVDM,2,1,2,A,55NJPwP00001L@K?77@DhhU>0@5HU>222222220O18@374B<08CCm2EPH0kk,0*6D
!ABVDM,2,2,2,A,UQCU8888880,2*3F
";
        let reader = NmeaReader::new(data.as_bytes());
        let envelopes: Vec<MessageEnvelope> = reader.collect();
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].line_nums, vec![1, 2]);
        assert_eq!(envelopes[0].ais().expect("decoded").message.id(), 5);
    }

    #[test]
    fn test_incomplete_group_is_discarded_at_eof() {
        let data = "!ABVDM,2,1,2,A,55NJPwP00001L@K?77@DhhU>0@5HU>222222220O18@374B<08CCm2EPH0kk,0*6D\n";
        let reader = NmeaReader::new(data.as_bytes());
        assert_eq!(reader.count(), 0);
    }
}
