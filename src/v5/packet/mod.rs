//! The control packets the inbound QoS path touches: PUBLISH and PUBREL
//! inbound, PUBACK, PUBREC, PUBCOMP and DISCONNECT outbound.

mod disconnect;
mod pubacks;
mod publish;

pub use disconnect::DisconnectPacket;
pub use pubacks::{
    Ack, Comp, GenericPubackPacket, PubackPacket, PubackPacketType, PubcompPacket, PubrecPacket,
    PubrelPacket, Rec, Rel, USER_PROPERTIES_MAX,
};
pub use publish::PublishPacket;
