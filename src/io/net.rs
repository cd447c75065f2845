use crate::eio::{Read, Write};

/// Underlying transport of MQTT. Must provide an ordered, lossless stream of
/// bytes in both directions.
pub trait Transport: Read + Write {}

impl<T> Transport for T where T: Read + Write {}
