use heapless::Deque;

use crate::{
    config::ReceiveMaximum,
    fmt::{debug, warn},
    inbound::mailbox::{AckSender, MailboxFull},
    types::ReasonCode,
    v5::packet::PublishPacket,
};

/// The downstream consumer of admitted publications.
///
/// Implementations own the receive window accounting: a publication admitted
/// by [`offer`](Self::offer) occupies a window slot until the application
/// acknowledges it.
pub trait PublishService<'c> {
    /// Admits a publication into the receive window.
    ///
    /// Returns `false` iff accepting it would take the number of
    /// unacknowledged publications above `receive_maximum`. On `true` the
    /// publication is owned by the downstream pipeline, which will
    /// eventually acknowledge it. The handler never offers the same
    /// delivery twice; duplicates are filtered upstream.
    ///
    /// Must not block.
    fn offer(&mut self, publish: PublishPacket<'c>, receive_maximum: ReceiveMaximum) -> bool;

    /// Drains buffered publications and fails pending flows after the client
    /// reached the fully disconnected state, with the disconnect cause.
    fn clear(&mut self, cause: ReasonCode);
}

/// A bounded buffer between the I/O loop and the application, with window
/// accounting.
///
/// `offer` admits while the in-flight count is below the receive maximum and
/// the buffer has room; [`acknowledge`](Self::acknowledge) releases the slot
/// and forwards the acknowledgement to the mailbox in one step.
pub struct PublishQueue<'c, const CAPACITY: usize> {
    buffered: Deque<PublishPacket<'c>, CAPACITY>,
    in_flight: u16,
}

impl<'c, const CAPACITY: usize> Default for PublishQueue<'c, CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'c, const CAPACITY: usize> PublishQueue<'c, CAPACITY> {
    /// Creates an empty queue.
    pub const fn new() -> Self {
        Self {
            buffered: Deque::new(),
            in_flight: 0,
        }
    }

    /// Takes the oldest buffered publication.
    pub fn pop(&mut self) -> Option<PublishPacket<'c>> {
        self.buffered.pop_front()
    }

    /// Number of admitted publications that are not yet acknowledged.
    pub fn in_flight(&self) -> u16 {
        self.in_flight
    }

    /// Releases the publication's window slot and hands it to the mailbox
    /// for acknowledgement on the I/O loop.
    pub fn acknowledge<const DEPTH: usize>(
        &mut self,
        publish: PublishPacket<'c>,
        sender: &AckSender<'_, 'c, DEPTH>,
    ) -> Result<(), MailboxFull<'c>> {
        sender.ack(publish)?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Ok(())
    }
}

impl<'c, const CAPACITY: usize> PublishService<'c> for PublishQueue<'c, CAPACITY> {
    fn offer(&mut self, publish: PublishPacket<'c>, receive_maximum: ReceiveMaximum) -> bool {
        // TODO QoS 0 publications should get their own queue instead of
        // occupying receive window slots.
        if self.in_flight >= receive_maximum.get() {
            return false;
        }
        if self.buffered.is_full() {
            warn!("publication buffer is full");
            return false;
        }

        let qos = publish.qos();

        // Deque capacity was just checked.
        let _ = self.buffered.push_back(publish);
        self.in_flight += 1;

        debug!("buffered {:?} publication", qos);

        true
    }

    fn clear(&mut self, cause: ReasonCode) {
        debug!("dropping buffered publications: {:?}", cause);

        self.buffered.clear();
        self.in_flight = 0;
    }
}
