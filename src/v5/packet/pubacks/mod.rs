//! PUBACK, PUBREC, PUBREL and PUBCOMP share one encoding, so a single
//! generic packet covers all four.

use core::marker::PhantomData;

use heapless::Vec;

use crate::{
    buffer::BufferProvider,
    eio::{Read, Write},
    fmt::{error, trace, warn},
    header::{FixedHeader, PacketType},
    io::{
        read::{BodyReader, Readable},
        write::{Writable, wlen},
    },
    packet::{Packet, RxError, RxPacket, TxError, TxPacket},
    types::{MqttString, ReasonCode, VarByteInt},
    v5::property::{AtMostOnceProperty, PropertyType, ReasonString, UserProperty},
};

mod types;

pub use types::{Ack, Comp, PubackPacketType, Rec, Rel};

/// The maximum number of user properties kept on a single acknowledgement
/// packet. Further properties on a received packet are skipped.
pub const USER_PROPERTIES_MAX: usize = 4;

/// A PUBACK packet.
pub type PubackPacket<'p> = GenericPubackPacket<'p, Ack>;
/// A PUBREC packet.
pub type PubrecPacket<'p> = GenericPubackPacket<'p, Rec>;
/// A PUBREL packet.
pub type PubrelPacket<'p> = GenericPubackPacket<'p, Rel>;
/// A PUBCOMP packet.
pub type PubcompPacket<'p> = GenericPubackPacket<'p, Comp>;

/// One of the four publication acknowledgement packets, selected by the
/// marker type `T`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GenericPubackPacket<'p, T: PubackPacketType> {
    /// Identifier of the publication this acknowledgement belongs to.
    /// Never 0.
    pub packet_identifier: u16,
    /// Result of this step of the handshake.
    pub reason_code: ReasonCode,
    /// Optional human readable elaboration of the reason code.
    pub reason_string: Option<ReasonString<'p>>,
    /// User properties, at most [`USER_PROPERTIES_MAX`].
    pub user_properties: Vec<UserProperty<'p>, USER_PROPERTIES_MAX>,
    marker: PhantomData<T>,
}

impl<'p, T: PubackPacketType> Packet for GenericPubackPacket<'p, T> {
    const PACKET_TYPE: PacketType = T::PACKET_TYPE;
}

impl<'p, T: PubackPacketType> RxPacket<'p> for GenericPubackPacket<'p, T> {
    async fn receive<R: Read, B: BufferProvider<'p>>(
        header: &FixedHeader,
        mut reader: BodyReader<'_, 'p, R, B>,
    ) -> Result<Self, RxError<R::Error, B::ProvisionError>> {
        trace!("decoding");

        if header.flags() != T::FLAGS {
            error!("flags are not matching");
            return Err(RxError::MalformedPacket);
        }

        let r = &mut reader;

        trace!("reading packet identifier");
        let packet_identifier = u16::read(r).await?;
        if packet_identifier == 0 {
            error!("packet identifier is 0");
            return Err(RxError::ProtocolError);
        }

        let reason_code = if header.remaining_len.size() == 2 {
            ReasonCode::Success
        } else {
            trace!("reading reason code");
            let c = ReasonCode::read(r).await?;
            if !T::reason_code_allowed(c) {
                error!("invalid reason code: {:?}", c);
                return Err(RxError::ProtocolError);
            }
            c
        };

        let mut reason_string = None;
        let mut user_properties = Vec::new();

        let properties_length = if header.remaining_len.value() < 4 {
            0
        } else {
            trace!("reading properties length");
            VarByteInt::read(r).await?.size()
        };

        if r.remaining_len() != properties_length {
            error!("properties length is not equal to remaining packet length");
            return Err(RxError::MalformedPacket);
        }

        while r.remaining_len() > 0 {
            let property_type = PropertyType::read(r).await?;
            trace!("reading property {:?}", property_type);

            match property_type {
                PropertyType::ReasonString => reason_string.try_set(r).await?,
                PropertyType::UserProperty => {
                    let name = MqttString::read(r).await?;
                    let value = MqttString::read(r).await?;
                    if user_properties.push(UserProperty::new(name, value)).is_err() {
                        warn!("skipping user property beyond capacity");
                    }
                }
                p => {
                    // Malformed packet according to <https://docs.oasis-open.org/mqtt/mqtt/v5.0/os/mqtt-v5.0-os.html#_Toc3901029>
                    error!("packet contains unexpected property {:?}", p);
                    return Err(RxError::MalformedPacket);
                }
            };
        }

        Ok(Self {
            packet_identifier,
            reason_code,
            reason_string,
            user_properties,
            marker: PhantomData,
        })
    }
}

impl<'p, T: PubackPacketType> TxPacket for GenericPubackPacket<'p, T> {
    async fn send<W: Write>(&self, write: &mut W) -> Result<(), TxError<W::Error>> {
        FixedHeader::new(Self::PACKET_TYPE, T::FLAGS, self.remaining_len())
            .write(write)
            .await?;

        self.packet_identifier.write(write).await?;
        self.reason_code.write(write).await?;

        self.properties_length().write(write).await?;
        self.reason_string.write(write).await?;
        for p in &self.user_properties {
            p.write(write).await?;
        }

        Ok(())
    }
}

impl<'p, T: PubackPacketType> GenericPubackPacket<'p, T> {
    /// Creates an acknowledgement with no properties.
    pub const fn new(packet_identifier: u16, reason_code: ReasonCode) -> Self {
        Self {
            packet_identifier,
            reason_code,
            reason_string: None,
            user_properties: Vec::new(),
            marker: PhantomData,
        }
    }

    pub(crate) fn from_parts(
        packet_identifier: u16,
        reason_code: ReasonCode,
        reason_string: Option<ReasonString<'p>>,
        user_properties: Vec<UserProperty<'p>, USER_PROPERTIES_MAX>,
    ) -> Self {
        Self {
            packet_identifier,
            reason_code,
            reason_string,
            user_properties,
            marker: PhantomData,
        }
    }

    fn remaining_len(&self) -> VarByteInt {
        let variable_header_length = wlen!(u16) + wlen!(ReasonCode);

        let properties_length = self.properties_length();
        let total_properties_length = properties_length.size() + properties_length.written_len();

        // Invariant: Max length = 589842 < VarByteInt::MAX_ENCODABLE
        // variable header: 3
        // properties length: 4
        // reason string: 65538
        // user properties: 4 * 131073
        VarByteInt::new((variable_header_length + total_properties_length) as u32)
    }

    fn properties_length(&self) -> VarByteInt {
        let len = self.reason_string.written_len()
            + self
                .user_properties
                .iter()
                .map(Writable::written_len)
                .sum::<usize>();

        // Invariant: Max length = 589835 < VarByteInt::MAX_ENCODABLE
        VarByteInt::new(len as u32)
    }
}
