use core::{cmp::min, fmt};

use crate::eio::{self, ErrorType, Write};

/// A Write into a fixed byte slice, accepting nothing once full.
pub struct SliceWriter<'a> {
    slice: &'a mut [u8],
    index: usize,
}

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SliceWriterError;
impl fmt::Display for SliceWriterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
impl core::error::Error for SliceWriterError {}
impl eio::Error for SliceWriterError {
    fn kind(&self) -> eio::ErrorKind {
        eio::ErrorKind::Other
    }
}
impl<'a> ErrorType for SliceWriter<'a> {
    type Error = SliceWriterError;
}
impl<'a> Write for SliceWriter<'a> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let left = self.slice.len().saturating_sub(self.index);
        let writing = min(left, buf.len());
        if writing == 0 {
            return Ok(0);
        }
        let end = self.index + writing;

        self.slice[self.index..end].clone_from_slice(&buf[..writing]);
        self.index = end;
        Ok(writing)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<'a> SliceWriter<'a> {
    pub fn new(slice: &'a mut [u8]) -> Self {
        Self { slice, index: 0 }
    }

    pub fn written(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod unit {
    use tokio_test::assert_ok;

    use crate::{eio::Write, test::write::SliceWriter};

    #[tokio::test]
    #[test_log::test]
    async fn fills_the_slice_and_then_accepts_nothing() {
        let mut buf = [0u8; 4];
        {
            let mut writer = SliceWriter::new(&mut buf);

            assert_eq!(assert_ok!(writer.write(b"acks").await), 4);
            assert_eq!(writer.written(), 4);

            assert_eq!(assert_ok!(writer.write(b"more").await), 0);
            assert_eq!(writer.written(), 4);
        }

        assert_eq!(&buf, b"acks");
    }

    #[tokio::test]
    #[test_log::test]
    async fn accepts_a_tail_that_still_fits() {
        let mut buf = [0u8; 5];
        {
            let mut writer = SliceWriter::new(&mut buf);

            assert_eq!(assert_ok!(writer.write(b"pub").await), 3);
            // Only the two remaining bytes are taken.
            assert_eq!(assert_ok!(writer.write(b"ack").await), 2);
            assert_eq!(writer.written(), 5);
        }

        assert_eq!(&buf, b"pubac");
    }

    #[tokio::test]
    #[test_log::test]
    async fn grows_the_written_count_per_call() {
        let mut buf = [0u8; 3];
        let mut writer = SliceWriter::new(&mut buf);

        assert_eq!(assert_ok!(writer.write(&[0x70]).await), 1);
        assert_eq!(writer.written(), 1);

        assert_eq!(assert_ok!(writer.write(&[0x04, 0x00]).await), 2);
        assert_eq!(writer.written(), 3);
    }
}
