use core::marker::PhantomData;

use heapless::Vec;

use crate::{
    fmt::{debug_assert, warn},
    types::{MqttString, ReasonCode},
    v5::{
        packet::{
            Ack, Comp, GenericPubackPacket, PubackPacketType, PublishPacket, PubrelPacket, Rec,
            USER_PROPERTIES_MAX,
        },
        property::{ReasonString, UserProperty},
    },
};

/// Customizes the PUBACK sent for a received QoS 1 publication.
///
/// Invoked synchronously while the acknowledgement is built. The builder must
/// not be retained beyond the call.
pub trait Qos1Interceptor<'c> {
    /// Called with the publication being acknowledged and the PUBACK under
    /// construction.
    fn on_publish(&mut self, publish: &PublishPacket<'c>, puback: &mut PubackBuilder<'c>);
}

/// Customizes the PUBREC and PUBCOMP sent during a received QoS 2 exchange.
///
/// Invoked synchronously while the respective acknowledgement is built. The
/// builders must not be retained beyond the calls.
pub trait Qos2Interceptor<'c> {
    /// Called with the publication being acknowledged and the PUBREC under
    /// construction.
    fn on_publish(&mut self, publish: &PublishPacket<'c>, pubrec: &mut PubrecBuilder<'c>);

    /// Called with the received PUBREL and the PUBCOMP under construction.
    fn on_pubrel(&mut self, pubrel: &PubrelPacket<'c>, pubcomp: &mut PubcompBuilder<'c>);
}

/// The do-nothing interceptor: all acknowledgements keep their defaults.
impl<'c> Qos1Interceptor<'c> for () {
    fn on_publish(&mut self, _publish: &PublishPacket<'c>, _puback: &mut PubackBuilder<'c>) {}
}

/// The do-nothing interceptor: all acknowledgements keep their defaults.
impl<'c> Qos2Interceptor<'c> for () {
    fn on_publish(&mut self, _publish: &PublishPacket<'c>, _pubrec: &mut PubrecBuilder<'c>) {}

    fn on_pubrel(&mut self, _pubrel: &PubrelPacket<'c>, _pubcomp: &mut PubcompBuilder<'c>) {}
}

/// Builds a PUBACK.
pub type PubackBuilder<'c> = AckBuilder<'c, Ack>;
/// Builds a PUBREC.
pub type PubrecBuilder<'c> = AckBuilder<'c, Rec>;
/// Builds a PUBCOMP.
pub type PubcompBuilder<'c> = AckBuilder<'c, Comp>;

/// A single-use builder for one of the outgoing acknowledgement packets.
///
/// Handed to interceptors by exclusive reference; `build` freezes it into the
/// immutable packet that is written and, where the handshake requires it,
/// cached for retransmission.
pub struct AckBuilder<'c, T: PubackPacketType> {
    packet_identifier: u16,
    reason_code: ReasonCode,
    reason_string: Option<ReasonString<'c>>,
    user_properties: Vec<UserProperty<'c>, USER_PROPERTIES_MAX>,
    marker: PhantomData<T>,
}

impl<'c, T: PubackPacketType> AckBuilder<'c, T> {
    pub(crate) fn new(packet_identifier: u16, reason_code: ReasonCode) -> Self {
        Self {
            packet_identifier,
            reason_code,
            reason_string: None,
            user_properties: Vec::new(),
            marker: PhantomData,
        }
    }

    /// Returns the identifier of the exchange being acknowledged.
    pub fn packet_identifier(&self) -> u16 {
        self.packet_identifier
    }

    /// Overrides the reason code.
    ///
    /// # Panics
    /// Panics in debug builds if the specification does not allow the code in
    /// this packet.
    pub fn reason_code(&mut self, reason_code: ReasonCode) -> &mut Self {
        debug_assert!(
            T::reason_code_allowed(reason_code),
            "reason code not allowed in this packet"
        );

        self.reason_code = reason_code;
        self
    }

    /// Attaches a human readable reason string.
    pub fn reason_string(&mut self, reason_string: MqttString<'c>) -> &mut Self {
        self.reason_string = Some(reason_string.into());
        self
    }

    /// Attaches a user property. Properties beyond
    /// [`USER_PROPERTIES_MAX`] are dropped.
    pub fn user_property(&mut self, name: MqttString<'c>, value: MqttString<'c>) -> &mut Self {
        if self
            .user_properties
            .push(UserProperty::new(name, value))
            .is_err()
        {
            warn!("acknowledgement user property limit reached, dropping property");
        }
        self
    }

    pub(crate) fn build(self) -> GenericPubackPacket<'c, T> {
        GenericPubackPacket::from_parts(
            self.packet_identifier,
            self.reason_code,
            self.reason_string,
            self.user_properties,
        )
    }
}

#[cfg(test)]
mod unit {
    use crate::types::{MqttString, ReasonCode};

    use super::*;

    #[test]
    fn builder_freezes_into_packet() {
        let mut builder = PubackBuilder::new(9, ReasonCode::Success);
        builder
            .reason_code(ReasonCode::NoMatchingSubscribers)
            .reason_string(MqttString::from_str_unchecked("nobody listens"))
            .user_property(
                MqttString::from_str_unchecked("trace"),
                MqttString::from_str_unchecked("abc"),
            );

        let puback = builder.build();
        assert_eq!(puback.packet_identifier, 9);
        assert_eq!(puback.reason_code, ReasonCode::NoMatchingSubscribers);
        assert_eq!(
            puback.reason_string.as_ref().map(|r| r.0.as_str()),
            Some("nobody listens")
        );
        assert_eq!(puback.user_properties.len(), 1);
    }

    #[test]
    fn surplus_user_properties_are_dropped() {
        let mut builder = PubcompBuilder::new(1, ReasonCode::Success);
        for _ in 0..USER_PROPERTIES_MAX + 2 {
            builder.user_property(
                MqttString::from_str_unchecked("k"),
                MqttString::from_str_unchecked("v"),
            );
        }

        assert_eq!(builder.build().user_properties.len(), USER_PROPERTIES_MAX);
    }
}
