//! MQTT 5 packets and properties of the inbound QoS path.

pub mod packet;
pub mod property;
