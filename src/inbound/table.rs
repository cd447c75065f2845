use core::mem;

use alloc::boxed::Box;

use crate::{
    fmt::debug_assert,
    v5::packet::{PubackPacket, PubrecPacket},
};

/// Handshake state of one server→client packet identifier.
///
/// The acked variants own the acknowledgement packet that was built for the
/// identifier so a duplicate PUBLISH can be answered with a byte-identical
/// retransmission.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdState<'c> {
    /// No exchange in progress for this identifier.
    #[default]
    Absent,
    /// A QoS 1 PUBLISH was received and not yet acknowledged by the
    /// application.
    Qos1Pending,
    /// A QoS 2 PUBLISH was received and no PUBREC has been sent yet.
    Qos2Pending,
    /// The application acknowledged a QoS 1 PUBLISH; the PUBACK may still be
    /// in flight.
    Qos1Acked(Box<PubackPacket<'c>>),
    /// The application acknowledged a QoS 2 PUBLISH; the PUBREC was sent and
    /// the exchange awaits the server's PUBREL.
    Qos2Acked(Box<PubrecPacket<'c>>),
}

impl<'c> IdState<'c> {
    /// Returns whether no exchange is in progress.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

const SEGMENT_SIZE: usize = 256;
const SEGMENT_COUNT: usize = 256;

type Segment<'c> = [IdState<'c>; SEGMENT_SIZE];

/// Maps the dense packet identifier space 1..=65535 to [`IdState`] values
/// with O(1) lookups.
///
/// Identifiers are grouped into fixed-size segments that are allocated the
/// first time one of their identifiers is written. Servers hand out low
/// identifiers first, so a connection with a small receive window touches
/// only the first segment.
pub struct IdStateTable<'c> {
    segments: [Option<Box<Segment<'c>>>; SEGMENT_COUNT],
}

impl<'c> Default for IdStateTable<'c> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'c> IdStateTable<'c> {
    /// Creates an empty table. No segments are allocated yet.
    pub const fn new() -> Self {
        Self {
            segments: [const { None }; SEGMENT_COUNT],
        }
    }

    fn slot_mut(&mut self, packet_identifier: u16) -> &mut IdState<'c> {
        debug_assert!(packet_identifier != 0, "packet identifier 0 is reserved");

        let segment = self.segments[packet_identifier as usize / SEGMENT_SIZE]
            .get_or_insert_with(|| Box::new([const { IdState::Absent }; SEGMENT_SIZE]));

        &mut segment[packet_identifier as usize % SEGMENT_SIZE]
    }

    /// Replaces the identifier's state, returning the previous one.
    pub fn get_and_set(&mut self, packet_identifier: u16, state: IdState<'c>) -> IdState<'c> {
        mem::replace(self.slot_mut(packet_identifier), state)
    }

    /// Overwrites the identifier's state. Used to revert a transition whose
    /// triggering event turned out to be invalid.
    pub fn put(&mut self, packet_identifier: u16, state: IdState<'c>) {
        *self.slot_mut(packet_identifier) = state;
    }

    /// Clears the identifier's state, returning the previous one.
    pub fn remove(&mut self, packet_identifier: u16) -> IdState<'c> {
        debug_assert!(packet_identifier != 0, "packet identifier 0 is reserved");

        match &mut self.segments[packet_identifier as usize / SEGMENT_SIZE] {
            // An untouched segment holds no state to remove.
            None => IdState::Absent,
            Some(segment) => mem::take(&mut segment[packet_identifier as usize % SEGMENT_SIZE]),
        }
    }

    /// Drops every tracked identifier and releases all segments.
    pub fn clear(&mut self) {
        for segment in &mut self.segments {
            *segment = None;
        }
    }
}

#[cfg(test)]
mod unit {
    use crate::{
        types::ReasonCode,
        v5::packet::PubackPacket,
    };

    use super::*;

    #[test]
    fn absent_until_written() {
        let mut table = IdStateTable::new();

        assert!(table.remove(1).is_absent());
        assert!(table.remove(65535).is_absent());
        assert!(table.get_and_set(42, IdState::Qos1Pending).is_absent());
        assert!(matches!(table.remove(42), IdState::Qos1Pending));
    }

    #[test]
    fn get_and_set_returns_previous_state() {
        let mut table = IdStateTable::new();

        table.put(7, IdState::Qos2Pending);
        let puback = Box::new(PubackPacket::new(7, ReasonCode::Success));
        let prev = table.get_and_set(7, IdState::Qos1Acked(puback));
        assert!(matches!(prev, IdState::Qos2Pending));

        let prev = table.remove(7);
        assert!(matches!(prev, IdState::Qos1Acked(_)));
        assert!(table.remove(7).is_absent());
    }

    #[test]
    fn identifiers_do_not_alias_across_segments() {
        let mut table = IdStateTable::new();

        // 255 and 256 sit in different segments, 256 and 512 in different
        // slots of the same offset.
        table.put(255, IdState::Qos1Pending);
        table.put(256, IdState::Qos2Pending);
        table.put(512, IdState::Qos1Pending);

        assert!(matches!(table.remove(255), IdState::Qos1Pending));
        assert!(matches!(table.remove(256), IdState::Qos2Pending));
        assert!(matches!(table.remove(512), IdState::Qos1Pending));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut table = IdStateTable::new();

        table.put(1, IdState::Qos1Pending);
        table.put(40_000, IdState::Qos2Pending);
        table.clear();

        assert!(table.remove(1).is_absent());
        assert!(table.remove(40_000).is_absent());
    }
}
