use crate::{
    eio::Write,
    header::{FixedHeader, PacketType},
    io::write::{Writable, wlen},
    packet::{Packet, TxError, TxPacket},
    types::{MqttString, ReasonCode, VarByteInt},
    v5::property::ReasonString,
};

/// A client-originated DISCONNECT packet.
///
/// The inbound engine only ever sends DISCONNECTs (on protocol violations);
/// server-originated DISCONNECTs are handled further up the pipeline.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisconnectPacket<'p> {
    /// Why the connection is being closed.
    pub reason_code: ReasonCode,
    /// Optional human readable elaboration of the reason code.
    pub reason_string: Option<ReasonString<'p>>,
}

impl<'p> Packet for DisconnectPacket<'p> {
    const PACKET_TYPE: PacketType = PacketType::Disconnect;
}

impl<'p> TxPacket for DisconnectPacket<'p> {
    async fn send<W: Write>(&self, write: &mut W) -> Result<(), TxError<W::Error>> {
        FixedHeader::new(Self::PACKET_TYPE, 0x00, self.remaining_len())
            .write(write)
            .await?;

        self.reason_code.write(write).await?;
        self.properties_length().write(write).await?;
        self.reason_string.write(write).await?;

        Ok(())
    }
}

impl<'p> DisconnectPacket<'p> {
    /// Creates a DISCONNECT with the given reason code and no properties.
    pub const fn new(reason_code: ReasonCode) -> Self {
        Self {
            reason_code,
            reason_string: None,
        }
    }

    /// Attaches a human readable reason string.
    pub fn add_reason_string(&mut self, reason_string: MqttString<'p>) {
        self.reason_string = Some(reason_string.into());
    }

    fn remaining_len(&self) -> VarByteInt {
        let variable_header_length = wlen!(ReasonCode);

        let properties_length = self.properties_length();
        let total_properties_length = properties_length.size() + properties_length.written_len();

        // Invariant: Max length = 65543 < VarByteInt::MAX_ENCODABLE
        // variable header (reason code): 1
        // properties length: 4
        // reason string: 65538
        VarByteInt::new((variable_header_length + total_properties_length) as u32)
    }

    fn properties_length(&self) -> VarByteInt {
        // Invariant: Max length = 65538 < VarByteInt::MAX_ENCODABLE
        VarByteInt::new(self.reason_string.written_len() as u32)
    }
}

#[cfg(test)]
mod unit {
    use crate::{
        test::tx::encode,
        types::{MqttString, ReasonCode},
        v5::packet::DisconnectPacket,
    };

    #[tokio::test]
    #[test_log::test]
    async fn encode_simple() {
        let packet = DisconnectPacket::new(ReasonCode::ReceiveMaximumExceeded);

        #[rustfmt::skip]
        encode!(packet, [
            0xE0, //
            0x02, // remaining length
            0x93, // reason code
            0x00, // property length
        ]);
    }

    #[tokio::test]
    #[test_log::test]
    async fn encode_with_reason_string() {
        let mut packet = DisconnectPacket::new(ReasonCode::ProtocolError);
        packet.add_reason_string(MqttString::try_from("unexpected PUBREL").unwrap());

        #[rustfmt::skip]
        encode!(packet, [
            0xE0,
            0x16, // remaining length
            0x82, // reason code
            0x14, // property length

            // Reason String
            0x1F, 0x00, 0x11, b'u', b'n', b'e', b'x', b'p', b'e', b'c', b't', b'e', b'd', b' ',
            b'P', b'U', b'B', b'R', b'E', b'L',
        ]);
    }
}
