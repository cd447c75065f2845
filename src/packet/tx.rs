use crate::{eio::Write, io::err::WriteError, packet::Packet};

/// A packet that can be encoded onto the wire.
pub trait TxPacket: Packet {
    /// Writes the full packet including its fixed header.
    async fn send<W: Write>(&self, write: &mut W) -> Result<(), TxError<W::Error>>;
}

/// Errors returned while encoding a packet.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxError<E> {
    /// The underlying Write failed.
    Write(E),
    /// The underlying Write made no progress.
    WriteZero,
}

impl<E> From<WriteError<E>> for TxError<E> {
    fn from(e: WriteError<E>) -> Self {
        match e {
            WriteError::Write(e) => Self::Write(e),
            WriteError::WriteZero => Self::WriteZero,
        }
    }
}
