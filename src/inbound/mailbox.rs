use heapless::mpmc::MpMcQueue;

use crate::v5::packet::PublishPacket;

/// Hands acknowledged publications from the application's execution context
/// back to the I/O loop.
///
/// The application side enqueues through an [`AckSender`] and returns
/// immediately; the I/O loop drains the queue into
/// [`InboundQosHandler::ack`](crate::inbound::InboundQosHandler::ack).
/// Acknowledgements for distinct identifiers keep their enqueue order across
/// the hand-off. Waking the loop is the owner's concern; a loop that selects
/// over transport traffic gets woken anyway.
///
/// `DEPTH` must be a power of two. Sizing it to the connection's receive
/// maximum guarantees the queue never fills up.
pub struct AckMailbox<'c, const DEPTH: usize> {
    queue: MpMcQueue<PublishPacket<'c>, DEPTH>,
}

impl<'c, const DEPTH: usize> Default for AckMailbox<'c, DEPTH> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'c, const DEPTH: usize> AckMailbox<'c, DEPTH> {
    /// Creates an empty mailbox.
    pub const fn new() -> Self {
        Self {
            queue: MpMcQueue::new(),
        }
    }

    /// Returns the application-side handle for acknowledging publications.
    pub fn sender(&self) -> AckSender<'_, 'c, DEPTH> {
        AckSender { mailbox: self }
    }

    /// Takes the oldest pending acknowledgement. Called from the I/O loop.
    pub fn pop(&self) -> Option<PublishPacket<'c>> {
        self.queue.dequeue()
    }
}

/// Application-side handle of an [`AckMailbox`]. Cheap to copy and usable
/// from any execution context.
pub struct AckSender<'m, 'c, const DEPTH: usize> {
    mailbox: &'m AckMailbox<'c, DEPTH>,
}

impl<'m, 'c, const DEPTH: usize> Clone for AckSender<'m, 'c, DEPTH> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<'m, 'c, const DEPTH: usize> Copy for AckSender<'m, 'c, DEPTH> {}

impl<'m, 'c, const DEPTH: usize> AckSender<'m, 'c, DEPTH> {
    /// Acknowledges a publication, handing it back to the I/O loop.
    ///
    /// Returns immediately. On a full mailbox the publication is returned so
    /// the caller can retry after the loop has drained.
    pub fn ack(&self, publish: PublishPacket<'c>) -> Result<(), MailboxFull<'c>> {
        self.mailbox.queue.enqueue(publish).map_err(MailboxFull)
    }
}

/// The mailbox had no room; the publication is handed back for a retry.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MailboxFull<'c>(pub PublishPacket<'c>);

#[cfg(test)]
mod unit {
    use crate::{
        bytes::Bytes,
        types::{IdentifiedQoS, MqttString},
        v5::packet::PublishPacket,
    };

    use super::*;

    fn publication(packet_identifier: u16) -> PublishPacket<'static> {
        PublishPacket::new(
            false,
            false,
            IdentifiedQoS::AtLeastOnce(packet_identifier),
            MqttString::from_str_unchecked("t"),
            Bytes::from("m".as_bytes()),
        )
    }

    #[test]
    fn acknowledgements_keep_their_order() {
        let mailbox: AckMailbox<'_, 4> = AckMailbox::new();
        let sender = mailbox.sender();

        sender.ack(publication(1)).unwrap();
        sender.ack(publication(2)).unwrap();
        sender.ack(publication(3)).unwrap();

        assert_eq!(mailbox.pop().unwrap().packet_identifier(), Some(1));
        assert_eq!(mailbox.pop().unwrap().packet_identifier(), Some(2));
        assert_eq!(mailbox.pop().unwrap().packet_identifier(), Some(3));
        assert!(mailbox.pop().is_none());
    }

    #[test]
    fn full_mailbox_returns_the_publication() {
        let mailbox: AckMailbox<'_, 2> = AckMailbox::new();
        let sender = mailbox.sender();

        sender.ack(publication(1)).unwrap();
        sender.ack(publication(2)).unwrap();

        let MailboxFull(publish) = sender.ack(publication(3)).unwrap_err();
        assert_eq!(publish.packet_identifier(), Some(3));

        // Draining makes room again.
        assert!(mailbox.pop().is_some());
        sender.ack(publish).unwrap();
    }
}
