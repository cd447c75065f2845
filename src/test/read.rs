use core::{cmp::min, fmt};

use crate::eio::{self, ErrorType, Read};

/// A Read over a fixed byte slice, returning EOF once exhausted.
pub struct SliceReader<'a> {
    slice: &'a [u8],
    index: usize,
}

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SliceReaderError;
impl fmt::Display for SliceReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl core::error::Error for SliceReaderError {}
impl eio::Error for SliceReaderError {
    fn kind(&self) -> eio::ErrorKind {
        eio::ErrorKind::Other
    }
}
impl<'a> ErrorType for SliceReader<'a> {
    type Error = SliceReaderError;
}
impl<'a> Read for SliceReader<'a> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let left = self.slice.len() - self.index;
        let reading = min(left, buf.len());
        let end = self.index + reading;

        buf[..reading].clone_from_slice(&self.slice[self.index..end]);
        self.index = end;
        Ok(reading)
    }
}

impl<'a> SliceReader<'a> {
    pub fn new(slice: &'a [u8]) -> Self {
        Self { slice, index: 0 }
    }
}

#[cfg(test)]
mod unit {
    use tokio_test::assert_ok;

    use crate::{eio::Read, test::read::SliceReader};

    #[tokio::test]
    #[test_log::test]
    async fn drains_the_slice_and_reports_eof() {
        let mut reader = SliceReader::new(b"pubrel");
        let mut buf = [0u8; 6];

        assert_eq!(assert_ok!(reader.read(&mut buf).await), 6);
        assert_eq!(&buf, b"pubrel");

        // Exhausted: every further read is EOF.
        assert_eq!(assert_ok!(reader.read(&mut buf).await), 0);
        assert_eq!(assert_ok!(reader.read(&mut buf).await), 0);
    }

    #[tokio::test]
    #[test_log::test]
    async fn serves_destination_buffers_smaller_than_the_slice() {
        let mut reader = SliceReader::new(&[0x62, 0x02]);
        let mut buf = [0u8; 1];

        assert_eq!(assert_ok!(reader.read(&mut buf).await), 1);
        assert_eq!(buf, [0x62]);

        assert_eq!(assert_ok!(reader.read(&mut buf).await), 1);
        assert_eq!(buf, [0x02]);

        assert_eq!(assert_ok!(reader.read(&mut buf).await), 0);
    }
}
