use tokio_test::assert_ok;

#[cfg(feature = "alloc")]
use crate::buffer::AllocBuffer;
#[cfg(feature = "bump")]
use crate::buffer::BumpBuffer;

use crate::{
    buffer::BufferProvider,
    eio::Read,
    header::FixedHeader,
    io::{
        err::ReadError,
        read::{BodyReader, Readable},
    },
    packet::{RxError, RxPacket},
    test::read::SliceReader,
    types::VarByteInt,
};

macro_rules! decode {
    ($t:ty, $remaining_len:literal, $bytes:expr) => {{
        const LEN: usize = ($bytes).len();
        const REMAINING_LEN: usize = ($remaining_len);

        let buffer: &mut [u8; LEN] = std::boxed::Box::leak(std::boxed::Box::new([0u8; LEN]));

        crate::test::rx::decode_packet::<$t, _, REMAINING_LEN>(($bytes), buffer).await
    }};
}

impl<R: Read> Readable<R> for FixedHeader {
    async fn read(read: &mut R) -> Result<Self, ReadError<R::Error>> {
        let type_and_flags = u8::read(read).await?;
        let remaining_len = VarByteInt::read(read).await?;
        Ok(Self {
            type_and_flags,
            remaining_len,
        })
    }
}

pub async fn decode_packet<'a, T: RxPacket<'a>, const N: usize, const REMAINING_LEN: usize>(
    bytes: [u8; N],
    buffer: &'a mut [u8],
) -> T {
    let mut reader = SliceReader::new(&bytes);
    let mut buffer = create_buffer(buffer);

    let header = assert_ok!(FixedHeader::read(&mut reader).await);

    let packet_type = assert_ok!(header.packet_type());
    assert_eq!(packet_type, T::PACKET_TYPE, "Packet type not matching");

    assert_eq!(
        header.remaining_len.size(),
        REMAINING_LEN,
        "Remaining length not matching"
    );

    let reader = BodyReader::new(&mut reader, &mut buffer, REMAINING_LEN);
    assert_ok!(T::receive(&header, reader).await)
}

/// Asserts that decoding the packet fails with `MalformedPacket`.
pub async fn assert_malformed<'a, T: RxPacket<'a>>(remaining_len: usize, bytes: &[u8]) {
    let mut reader = SliceReader::new(bytes);
    let backing: &'a mut [u8] =
        std::boxed::Box::leak(std::vec![0u8; bytes.len()].into_boxed_slice());
    let mut buffer = create_buffer(backing);

    let header = assert_ok!(FixedHeader::read(&mut reader).await);

    let reader = BodyReader::new(&mut reader, &mut buffer, remaining_len);
    match T::receive(&header, reader).await {
        Ok(_) => panic!("decoding unexpectedly succeeded"),
        Err(RxError::MalformedPacket) => {}
        Err(e) => panic!("expected MalformedPacket, got {e:?}"),
    }
}

/// Asserts that decoding the packet fails with `ProtocolError`.
pub async fn assert_protocol_error<'a, T: RxPacket<'a>>(remaining_len: usize, bytes: &[u8]) {
    let mut reader = SliceReader::new(bytes);
    let backing: &'a mut [u8] =
        std::boxed::Box::leak(std::vec![0u8; bytes.len()].into_boxed_slice());
    let mut buffer = create_buffer(backing);

    let header = assert_ok!(FixedHeader::read(&mut reader).await);

    let reader = BodyReader::new(&mut reader, &mut buffer, remaining_len);
    match T::receive(&header, reader).await {
        Ok(_) => panic!("decoding unexpectedly succeeded"),
        Err(RxError::ProtocolError) => {}
        Err(e) => panic!("expected ProtocolError, got {e:?}"),
    }
}

#[allow(unused_variables)]
fn create_buffer<'a>(buffer: &'a mut [u8]) -> impl BufferProvider<'a> {
    #[cfg(feature = "bump")]
    {
        BumpBuffer::new(buffer)
    }
    #[cfg(feature = "alloc")]
    {
        AllocBuffer
    }
}

pub(crate) use decode;
