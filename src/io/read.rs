use core::{cmp::min, marker::PhantomData};

use crate::{
    buffer::BufferProvider,
    bytes::Bytes,
    eio::{ErrorType, Read},
    fmt::trace,
    io::err::{BodyReadError, ReadError},
    types::{MqttBinary, MqttString},
};

pub trait Readable<R: Read>: Sized {
    async fn read(read: &mut R) -> Result<Self, ReadError<R::Error>>;
}

/// A Read that can persist a run of bytes into provided storage.
pub trait Store<'a>: Read {
    async fn read_and_store(&mut self, len: usize) -> Result<Bytes<'a>, ReadError<Self::Error>>;
}

impl<R: Read, const N: usize> Readable<R> for [u8; N] {
    async fn read(read: &mut R) -> Result<Self, ReadError<<R>::Error>> {
        let mut array = [0; N];
        let mut slice = &mut array[..];
        while !slice.is_empty() {
            match read.read(slice).await.map_err(ReadError::Read)? {
                0 => return Err(ReadError::UnexpectedEOF),
                n => slice = &mut slice[n..],
            }
        }
        Ok(array)
    }
}
impl<R: Read> Readable<R> for u8 {
    async fn read(read: &mut R) -> Result<Self, ReadError<R::Error>> {
        <[u8; 1]>::read(read).await.map(Self::from_be_bytes)
    }
}
impl<R: Read> Readable<R> for u16 {
    async fn read(read: &mut R) -> Result<Self, ReadError<R::Error>> {
        <[u8; 2]>::read(read).await.map(Self::from_be_bytes)
    }
}
impl<R: Read> Readable<R> for u32 {
    async fn read(read: &mut R) -> Result<Self, ReadError<R::Error>> {
        <[u8; 4]>::read(read).await.map(Self::from_be_bytes)
    }
}
impl<R: Read> Readable<R> for bool {
    async fn read(read: &mut R) -> Result<Self, ReadError<R::Error>> {
        match u8::read(read).await? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ReadError::MalformedPacket),
        }
    }
}
impl<'b, R: Read + Store<'b>> Readable<R> for MqttBinary<'b> {
    async fn read(read: &mut R) -> Result<Self, ReadError<R::Error>> {
        let len = u16::read(read).await? as usize;

        trace!("reading binary data of {} bytes", len);

        Ok(MqttBinary(read.read_and_store(len).await?))
    }
}
impl<'s, R: Read + Store<'s>> Readable<R> for MqttString<'s> {
    async fn read(read: &mut R) -> Result<Self, ReadError<R::Error>> {
        MqttBinary::read(read)
            .await?
            .try_into()
            .map_err(|_| ReadError::MalformedPacket)
    }
}

/// Reads the body of a single packet: enforces the `remaining length`
/// boundary and persists dynamically sized fields through a
/// [`BufferProvider`].
pub struct BodyReader<'r, 'b, R: Read, B: BufferProvider<'b>> {
    r: &'r mut R,
    buffer: &'r mut B,
    remaining_len: usize,
    _b: PhantomData<&'b ()>,
}

impl<'b, R: Read, B: BufferProvider<'b>> ErrorType for BodyReader<'_, 'b, R, B> {
    type Error = BodyReadError<R::Error, B::ProvisionError>;
}
impl<'b, R: Read, B: BufferProvider<'b>> Read for BodyReader<'_, 'b, R, B> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if !buf.is_empty() && self.remaining_len == 0 {
            return Err(BodyReadError::InsufficientRemainingLen);
        }
        let len = min(buf.len(), self.remaining_len);
        let read = self.r.read(&mut buf[..len]).await?;
        self.remaining_len -= read;
        Ok(read)
    }
}
impl<'r, 'b, R: Read, B: BufferProvider<'b>> Store<'b> for BodyReader<'r, 'b, R, B> {
    async fn read_and_store(&mut self, len: usize) -> Result<Bytes<'b>, ReadError<Self::Error>> {
        if self.remaining_len < len {
            return Err(ReadError::Read(BodyReadError::InsufficientRemainingLen));
        }
        let mut buffer = self
            .buffer
            .provide_buffer(len)
            .map_err(BodyReadError::Buffer)?;

        let slice = buffer.as_mut();

        let mut filled = 0;
        while filled < len {
            match self.read(&mut slice[filled..]).await? {
                0 => return Err(ReadError::UnexpectedEOF),
                n => filled += n,
            }
        }

        Ok(buffer.into())
    }
}

impl<'r, 'b, R: Read, B: BufferProvider<'b>> BodyReader<'r, 'b, R, B> {
    pub fn new(r: &'r mut R, buffer: &'r mut B, remaining_len: usize) -> Self {
        Self {
            r,
            buffer,
            remaining_len,
            _b: PhantomData,
        }
    }

    pub fn remaining_len(&self) -> usize {
        self.remaining_len
    }

    /// Reads and discards `len` bytes.
    pub async fn skip(
        &mut self,
        len: usize,
    ) -> Result<(), BodyReadError<R::Error, B::ProvisionError>> {
        if self.remaining_len < len {
            return Err(BodyReadError::InsufficientRemainingLen);
        }
        self.remaining_len -= len;
        let mut missing = len;

        const CHUNK_SIZE: usize = 16;
        let mut buf = [0; CHUNK_SIZE];
        while missing > 0 {
            let buf = &mut buf[0..min(CHUNK_SIZE, missing)];
            match self.r.read(buf).await? {
                0 => return Err(BodyReadError::UnexpectedEOF),
                r => missing -= r,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod unit {
    use tokio_test::{assert_err, assert_ok};

    #[cfg(feature = "alloc")]
    use crate::buffer::AllocBuffer;
    #[cfg(feature = "bump")]
    use crate::buffer::BumpBuffer;

    use crate::{
        io::{
            err::{BodyReadError, ReadError},
            read::{BodyReader, Readable},
        },
        test::read::SliceReader,
        types::{MqttBinary, MqttString},
    };

    macro_rules! body_reader {
        ($r:ident, $b:ident, $bytes:expr, $remaining_len:expr) => {
            let mut $r = SliceReader::new($bytes);
            #[cfg(feature = "alloc")]
            let mut $b = AllocBuffer;
            #[cfg(feature = "bump")]
            let mut $b = [0; 64];
            #[cfg(feature = "bump")]
            let mut $b = BumpBuffer::new(&mut $b);
            let mut $r = BodyReader::new(&mut $r, &mut $b, $remaining_len);
        };
    }

    #[tokio::test]
    #[test_log::test]
    async fn read_integers() {
        let mut r = SliceReader::new(&[0x42, 0x01, 0x02, 0xDE, 0xAD, 0xBE, 0xEF]);

        assert_eq!(assert_ok!(u8::read(&mut r).await), 0x42);
        assert_eq!(assert_ok!(u16::read(&mut r).await), 0x0102);
        assert_eq!(assert_ok!(u32::read(&mut r).await), 0xDEADBEEF);
    }

    #[tokio::test]
    #[test_log::test]
    async fn read_bool() {
        let mut r = SliceReader::new(&[0x00, 0x01, 0x02]);

        assert!(!assert_ok!(bool::read(&mut r).await));
        assert!(assert_ok!(bool::read(&mut r).await));
        let e = assert_err!(bool::read(&mut r).await);
        assert_eq!(e, ReadError::MalformedPacket);
    }

    #[tokio::test]
    #[test_log::test]
    async fn read_eof() {
        let mut r = SliceReader::new(b"\x00");
        let e = assert_err!(u16::read(&mut r).await);
        assert_eq!(e, ReadError::UnexpectedEOF);
    }

    #[tokio::test]
    #[test_log::test]
    async fn body_reader_stores_binary_and_string() {
        body_reader!(
            r,
            b,
            &[
                0x00, 0x03, 0xAA, 0xBB, 0xCC, // binary
                0x00, 0x04, b't', b'e', b's', b't', // string
            ],
            11
        );

        let binary = assert_ok!(MqttBinary::read(&mut r).await);
        assert_eq!(binary.as_ref(), &[0xAA, 0xBB, 0xCC]);

        let string = assert_ok!(MqttString::read(&mut r).await);
        assert_eq!(string.as_ref(), "test");

        assert_eq!(r.remaining_len(), 0);
    }

    #[tokio::test]
    #[test_log::test]
    async fn body_reader_enforces_remaining_len() {
        body_reader!(r, b, b"abcdefgh", 3);

        let e = assert_err!(<[u8; 4]>::read(&mut r).await);
        assert_eq!(e, ReadError::Read(BodyReadError::InsufficientRemainingLen));
    }

    #[tokio::test]
    #[test_log::test]
    async fn body_reader_skip() {
        body_reader!(r, b, &[0x01, 0x02, 0x03, 0x04, 0x05], 5);

        assert_ok!(r.skip(3).await);
        assert_eq!(r.remaining_len(), 2);
        assert_eq!(assert_ok!(u16::read(&mut r).await), 0x0405);

        body_reader!(r, b, &[0x01], 1);
        let e = assert_err!(r.skip(2).await);
        assert_eq!(e, BodyReadError::InsufficientRemainingLen);
    }

    #[tokio::test]
    #[test_log::test]
    async fn body_reader_store_eof() {
        body_reader!(r, b, &[0x00, 0x05, 0x01, 0x02], 7);

        let e = assert_err!(MqttBinary::read(&mut r).await);
        assert_eq!(e, ReadError::UnexpectedEOF);
    }
}
