//! Sequential record reader

use super::{Record, RECORD_SIZE};
use crate::Result;
use std::io::{BufReader, ErrorKind, Read};

/// Iterates the records of a partition file in fixed strides.
///
/// Iteration ends at end of input or at a partial trailing record. Any other
/// read failure is yielded once as an error, after which iteration stops.
pub struct RecordReader<R: Read> {
    inner: BufReader<R>,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    /// Wrap a reader
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            done: false,
        }
    }

    /// Fill `buf` completely; `Ok(false)` on a clean or partial end of input.
    fn fill(&mut self, buf: &mut [u8; RECORD_SIZE]) -> std::io::Result<bool> {
        let mut filled = 0;
        while filled < RECORD_SIZE {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Ok(false),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut buf = [0u8; RECORD_SIZE];
        match self.fill(&mut buf) {
            Ok(true) => Record::decode(&buf).map(Ok),
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_all(records: &[Record]) -> Vec<u8> {
        records.iter().flat_map(|r| r.encode()).collect()
    }

    #[test]
    fn test_reads_all_records() {
        let records: Vec<Record> = (0..100).map(|i| Record::new(i * 10 - 500, i as i32)).collect();
        let data = encode_all(&records);

        let read: Vec<Record> = RecordReader::new(Cursor::new(data))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(read, records);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(RecordReader::new(Cursor::new(Vec::new())).count(), 0);
    }

    #[test]
    fn test_ignores_truncated_tail() {
        let records = vec![Record::new(1, 1), Record::new(2, 2)];
        let mut data = encode_all(&records);
        data.extend_from_slice(&Record::new(3, 3).encode()[..7]);

        let read: Vec<Record> = RecordReader::new(Cursor::new(data))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(read, records);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn test_surfaces_read_errors_once() {
        let mut reader = RecordReader::new(FailingReader);
        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
    }
}
