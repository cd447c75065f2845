//! The server→client QoS engine.
//!
//! [`InboundQosHandler`] sits between the packet decoder and the
//! application. It tracks every QoS 1 and QoS 2 packet identifier through
//! its handshake, offers new publications to a [`PublishService`] under the
//! connection's receive maximum, answers duplicates from cached
//! acknowledgements and disconnects when the server violates the protocol.
//!
//! All handler methods run on the connection's I/O loop. The application
//! acknowledges publications through an [`AckMailbox`] from wherever it
//! runs; the loop drains the mailbox back into the handler.

use alloc::boxed::Box;

use crate::{
    config::ReceiveMaximum,
    eio::{Error as IoError, ErrorKind},
    fmt::{debug, error, trace, warn},
    io::{Transport, err::WriteError},
    packet::{TxError, TxPacket},
    types::{IdentifiedQoS, MqttString, QoS, ReasonCode},
    v5::packet::{
        DisconnectPacket, PubackPacket, PubcompPacket, PublishPacket, PubrecPacket, PubrelPacket,
    },
};

mod interceptor;
mod mailbox;
mod service;
mod table;

pub use interceptor::{
    AckBuilder, PubackBuilder, PubcompBuilder, PubrecBuilder, Qos1Interceptor, Qos2Interceptor,
};
pub use mailbox::{AckMailbox, AckSender, MailboxFull};
pub use service::{PublishQueue, PublishService};
pub use table::{IdState, IdStateTable};

/// Overall lifecycle state of the owning client, as relevant to this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClientState {
    /// A connection attempt is in progress.
    Connecting,
    /// The connection is established.
    Connected,
    /// The connection is gone but the client will reconnect.
    DisconnectedReconnect,
    /// The client gave up on the connection for good.
    Disconnected,
}

/// Attach-time configuration, read from the connection that was just
/// negotiated.
pub struct InboundConfig<I1 = (), I2 = ()> {
    /// The receive maximum this client announced in its CONNECT packet.
    pub receive_maximum: ReceiveMaximum,
    /// Customizes outgoing PUBACKs.
    pub qos1_interceptor: Option<I1>,
    /// Customizes outgoing PUBRECs and PUBCOMPs.
    pub qos2_interceptor: Option<I2>,
}

impl InboundConfig {
    /// Configuration without interceptors: all acknowledgements carry their
    /// defaults.
    pub fn new(receive_maximum: ReceiveMaximum) -> Self {
        Self {
            receive_maximum,
            qos1_interceptor: None,
            qos2_interceptor: None,
        }
    }
}

impl<I1, I2> InboundConfig<I1, I2> {
    /// Configuration with interceptors.
    pub fn with_interceptors(
        receive_maximum: ReceiveMaximum,
        qos1_interceptor: Option<I1>,
        qos2_interceptor: Option<I2>,
    ) -> Self {
        Self {
            receive_maximum,
            qos1_interceptor,
            qos2_interceptor,
        }
    }
}

/// A decoded inbound event for [`InboundQosHandler::read`].
///
/// `U` is the representation of packets this engine does not handle; they
/// are returned unchanged so the rest of the pipeline can process them.
#[derive(Debug)]
pub enum InboundEvent<'p, U> {
    /// A PUBLISH packet from the server.
    Publish(PublishPacket<'p>),
    /// A PUBREL packet from the server.
    Pubrel(PubrelPacket<'p>),
    /// Any other packet kind, passed through.
    Other(U),
}

/// A protocol violation by the server. The handler has already sent a
/// DISCONNECT carrying this reason when the violation surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Violation {
    /// The reason code sent in the DISCONNECT packet.
    pub reason_code: ReasonCode,
    /// The reason string sent in the DISCONNECT packet.
    pub description: &'static str,
}

/// Errors surfaced by [`InboundQosHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A transport write failed. Cached acknowledgements stay in the state
    /// table; tearing the connection down is the owner's decision.
    Network(ErrorKind),

    /// The server violated the protocol and a DISCONNECT has been sent.
    /// The handler refuses further inbound packets until it is re-attached.
    Violation(Violation),

    /// The handler has no transport attached.
    Detached,

    /// `attach` was called while a transport is attached.
    AlreadyAttached,
}

/// The state machine of the server→client QoS 1 and QoS 2 handshakes.
///
/// One handler instance serves one transport at a time: it holds
/// per-connection state and must be [`attach`](Self::attach)ed before use
/// and may only be re-attached after [`connection_closed`](Self::connection_closed).
pub struct InboundQosHandler<'c, N: Transport, S: PublishService<'c>, I1 = (), I2 = ()> {
    net: Attachment<N>,
    table: IdStateTable<'c>,
    service: S,
    receive_maximum: ReceiveMaximum,
    qos1_interceptor: Option<I1>,
    qos2_interceptor: Option<I2>,
}

#[derive(Default)]
enum Attachment<N> {
    Attached(N),
    #[default]
    Detached,
}

impl<'c, N, S, I1, I2> InboundQosHandler<'c, N, S, I1, I2>
where
    N: Transport,
    S: PublishService<'c>,
    I1: Qos1Interceptor<'c>,
    I2: Qos2Interceptor<'c>,
{
    /// Creates a detached handler delivering admitted publications to
    /// `service`.
    pub fn new(service: S) -> Self {
        Self {
            net: Attachment::Detached,
            table: IdStateTable::new(),
            service,
            receive_maximum: ReceiveMaximum::default(),
            qos1_interceptor: None,
            qos2_interceptor: None,
        }
    }

    /// Attaches the handler to a freshly connected transport and takes over
    /// the connection's negotiated configuration.
    ///
    /// Fails with [`Error::AlreadyAttached`] when a transport is attached;
    /// a handler never serves two connections at once.
    pub fn attach(&mut self, net: N, config: InboundConfig<I1, I2>) -> Result<(), Error> {
        if !self.is_ready() {
            error!("handler is already attached to a transport");
            return Err(Error::AlreadyAttached);
        }

        self.net = Attachment::Attached(net);
        self.receive_maximum = config.receive_maximum;
        self.qos1_interceptor = config.qos1_interceptor;
        self.qos2_interceptor = config.qos2_interceptor;

        Ok(())
    }

    /// Returns whether the handler is free to be attached to a transport.
    pub fn is_ready(&self) -> bool {
        matches!(self.net, Attachment::Detached)
    }

    /// Returns the receive maximum in effect since the last attach.
    pub fn receive_maximum(&self) -> ReceiveMaximum {
        self.receive_maximum
    }

    /// Returns the downstream publish service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Returns the downstream publish service mutably.
    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    /// Processes one decoded inbound event.
    ///
    /// PUBLISH and PUBREL packets are consumed; any other event is returned
    /// unchanged for the rest of the pipeline.
    pub async fn read<U>(&mut self, event: InboundEvent<'c, U>) -> Result<Option<U>, Error> {
        match event {
            InboundEvent::Publish(publish) => self.read_publish(publish).await.map(|_| None),
            InboundEvent::Pubrel(pubrel) => self.read_pubrel(pubrel).await.map(|_| None),
            InboundEvent::Other(other) => Ok(Some(other)),
        }
    }

    /// Processes an inbound PUBLISH packet.
    pub async fn read_publish(&mut self, publish: PublishPacket<'c>) -> Result<(), Error> {
        if self.is_ready() {
            return Err(Error::Detached);
        }

        match publish.identified_qos {
            IdentifiedQoS::AtMostOnce => {
                self.read_publish_qos0(publish);
                Ok(())
            }
            IdentifiedQoS::AtLeastOnce(packet_identifier) => {
                self.read_publish_qos1(publish, packet_identifier).await
            }
            IdentifiedQoS::ExactlyOnce(packet_identifier) => {
                self.read_publish_qos2(publish, packet_identifier).await
            }
        }
    }

    fn read_publish_qos0(&mut self, publish: PublishPacket<'c>) {
        debug!("received QoS 0 publication");

        // TODO QoS 0 deserves its own queue; until then it takes up receive
        // window slots and a full window drops it.
        let _ = self.service.offer(publish, self.receive_maximum);
    }

    async fn read_publish_qos1(
        &mut self,
        publish: PublishPacket<'c>,
        packet_identifier: u16,
    ) -> Result<(), Error> {
        match self.table.get_and_set(packet_identifier, IdState::Qos1Pending) {
            IdState::Absent => {
                debug!(
                    "received QoS 1 publication with packet identifier {}",
                    packet_identifier
                );
                self.admit(publish).await
            }
            IdState::Qos1Pending => {
                if !publish.dup {
                    return Err(self
                        .missing_dup(IdState::Qos1Pending, packet_identifier, QoS::AtLeastOnce)
                        .await);
                }
                // The first delivery is still queued downstream.
                debug!(
                    "ignoring duplicate of unacknowledged QoS 1 publication {}",
                    packet_identifier
                );
                Ok(())
            }
            IdState::Qos1Acked(puback) => {
                if !publish.dup {
                    return Err(self
                        .missing_dup(
                            IdState::Qos1Acked(puback),
                            packet_identifier,
                            QoS::AtLeastOnce,
                        )
                        .await);
                }
                debug!("resending cached PUBACK for {}", packet_identifier);
                let cached = (*puback).clone();
                self.table
                    .put(packet_identifier, IdState::Qos1Acked(puback));
                self.write_puback(cached).await
            }
            prev @ (IdState::Qos2Pending | IdState::Qos2Acked(_)) => {
                self.table.put(packet_identifier, prev);
                Err(self
                    .protocol_error(
                        ReasonCode::ProtocolError,
                        "QoS 1 PUBLISH must not be received with the same packet identifier as a QoS 2 PUBLISH",
                    )
                    .await)
            }
        }
    }

    async fn read_publish_qos2(
        &mut self,
        publish: PublishPacket<'c>,
        packet_identifier: u16,
    ) -> Result<(), Error> {
        match self.table.get_and_set(packet_identifier, IdState::Qos2Pending) {
            IdState::Absent => {
                debug!(
                    "received QoS 2 publication with packet identifier {}",
                    packet_identifier
                );
                self.admit(publish).await
            }
            IdState::Qos2Pending => {
                if !publish.dup {
                    return Err(self
                        .missing_dup(IdState::Qos2Pending, packet_identifier, QoS::ExactlyOnce)
                        .await);
                }
                debug!(
                    "ignoring duplicate of unacknowledged QoS 2 publication {}",
                    packet_identifier
                );
                Ok(())
            }
            IdState::Qos2Acked(pubrec) => {
                if !publish.dup {
                    return Err(self
                        .missing_dup(
                            IdState::Qos2Acked(pubrec),
                            packet_identifier,
                            QoS::ExactlyOnce,
                        )
                        .await);
                }
                debug!("resending cached PUBREC for {}", packet_identifier);
                let cached = (*pubrec).clone();
                self.table
                    .put(packet_identifier, IdState::Qos2Acked(pubrec));
                // The entry outlives the write; it is released by PUBREL.
                self.transmit(&cached).await
            }
            prev @ (IdState::Qos1Pending | IdState::Qos1Acked(_)) => {
                self.table.put(packet_identifier, prev);
                Err(self
                    .protocol_error(
                        ReasonCode::ProtocolError,
                        "QoS 2 PUBLISH must not be received with the same packet identifier as a QoS 1 PUBLISH",
                    )
                    .await)
            }
        }
    }

    /// Processes an inbound PUBREL packet.
    pub async fn read_pubrel(&mut self, pubrel: PubrelPacket<'c>) -> Result<(), Error> {
        if self.is_ready() {
            return Err(Error::Detached);
        }

        let packet_identifier = pubrel.packet_identifier;
        match self.table.remove(packet_identifier) {
            IdState::Qos2Acked(_) => {
                debug!("QoS 2 exchange {} released", packet_identifier);
                let pubcomp = self.build_pubcomp(&pubrel, ReasonCode::Success);
                self.write_pubcomp(pubcomp).await
            }
            IdState::Absent => {
                // The matching PUBCOMP was lost; answer so the server can
                // finish the exchange.
                debug!(
                    "PUBREL for unknown packet identifier {}",
                    packet_identifier
                );
                let pubcomp = self.build_pubcomp(&pubrel, ReasonCode::PacketIdentifierNotFound);
                self.write_pubcomp(pubcomp).await
            }
            prev @ IdState::Qos2Pending => {
                self.table.put(packet_identifier, prev);
                Err(self
                    .protocol_error(
                        ReasonCode::ProtocolError,
                        "PUBREL must not be received with the same packet identifier as a QoS 2 PUBLISH when no PUBREC has been sent yet",
                    )
                    .await)
            }
            prev @ (IdState::Qos1Pending | IdState::Qos1Acked(_)) => {
                self.table.put(packet_identifier, prev);
                Err(self
                    .protocol_error(
                        ReasonCode::ProtocolError,
                        "PUBREL must not be received with the same packet identifier as a QoS 1 PUBLISH",
                    )
                    .await)
            }
        }
    }

    /// Acknowledges a publication on behalf of the application.
    ///
    /// Runs on the I/O loop; acknowledgements from other execution contexts
    /// arrive here through [`drain_acks`](Self::drain_acks). After a
    /// disconnect this is a no-op: neither the state table nor the wire is
    /// touched.
    pub async fn ack(&mut self, publish: PublishPacket<'c>) -> Result<(), Error> {
        if self.is_ready() {
            trace!("discarding acknowledgement received after disconnect");
            return Ok(());
        }

        match publish.identified_qos {
            IdentifiedQoS::AtMostOnce => Ok(()),
            IdentifiedQoS::AtLeastOnce(packet_identifier) => {
                let puback = self.build_puback(packet_identifier, &publish);
                self.table.put(
                    packet_identifier,
                    IdState::Qos1Acked(Box::new(puback.clone())),
                );
                self.write_puback(puback).await
            }
            IdentifiedQoS::ExactlyOnce(packet_identifier) => {
                let pubrec = self.build_pubrec(packet_identifier, &publish);
                self.table.put(
                    packet_identifier,
                    IdState::Qos2Acked(Box::new(pubrec.clone())),
                );
                debug!("sending PUBREC packet for {}", packet_identifier);
                // Fire and forget; the table entry is released by PUBREL.
                self.transmit(&pubrec).await
            }
        }
    }

    /// Drains the mailbox into [`ack`](Self::ack), preserving enqueue order.
    pub async fn drain_acks<const DEPTH: usize>(
        &mut self,
        mailbox: &AckMailbox<'c, DEPTH>,
    ) -> Result<(), Error> {
        while let Some(publish) = mailbox.pop() {
            self.ack(publish).await?;
        }
        Ok(())
    }

    /// Handles the transport-level disconnect event.
    ///
    /// Releases the transport, clears the state table and, iff the client
    /// reached [`ClientState::Disconnected`], drains the downstream flows
    /// with the disconnect cause.
    pub fn connection_closed(&mut self, cause: ReasonCode, client_state: ClientState) {
        self.net = Attachment::Detached;
        self.table.clear();

        if client_state == ClientState::Disconnected {
            self.service.clear(cause);
        }
    }

    async fn admit(&mut self, publish: PublishPacket<'c>) -> Result<(), Error> {
        if self.service.offer(publish, self.receive_maximum) {
            Ok(())
        } else {
            Err(self
                .protocol_error(
                    ReasonCode::ReceiveMaximumExceeded,
                    "received more QoS 1 and/or 2 PUBLISHes than allowed by receive maximum",
                )
                .await)
        }
    }

    async fn missing_dup(
        &mut self,
        prev: IdState<'c>,
        packet_identifier: u16,
        qos: QoS,
    ) -> Error {
        self.table.put(packet_identifier, prev);

        let description = match qos {
            QoS::ExactlyOnce => "DUP flag must be set for a resent QoS 2 PUBLISH",
            _ => "DUP flag must be set for a resent QoS 1 PUBLISH",
        };
        self.protocol_error(ReasonCode::ProtocolError, description)
            .await
    }

    /// Sends a DISCONNECT for a protocol violation and releases the
    /// transport. Returns the violation for the caller to surface.
    async fn protocol_error(
        &mut self,
        reason_code: ReasonCode,
        description: &'static str,
    ) -> Error {
        error!("disconnecting: {}", description);

        if let Attachment::Attached(net) = &mut self.net {
            let mut packet = DisconnectPacket::new(reason_code);
            packet.add_reason_string(MqttString::from_str_unchecked(description));

            // The connection is being torn down either way; a failed
            // DISCONNECT write changes nothing.
            if packet.send(net).await.is_ok() {
                let _ = net.flush().await;
            }
        }
        self.net = Attachment::Detached;

        Error::Violation(Violation {
            reason_code,
            description,
        })
    }

    async fn write_puback(&mut self, puback: PubackPacket<'c>) -> Result<(), Error> {
        let packet_identifier = puback.packet_identifier;
        debug!("sending PUBACK packet for {}", packet_identifier);

        match self.transmit(&puback).await {
            Ok(()) => {
                // The write completed, the exchange is finished.
                self.table.remove(packet_identifier);
                Ok(())
            }
            Err(e) => {
                // The cached PUBACK stays for the server's retransmission.
                warn!("PUBACK write for {} failed", packet_identifier);
                Err(e)
            }
        }
    }

    async fn write_pubcomp(&mut self, pubcomp: PubcompPacket<'c>) -> Result<(), Error> {
        debug!("sending PUBCOMP packet for {}", pubcomp.packet_identifier);
        self.transmit(&pubcomp).await
    }

    async fn transmit<P: TxPacket>(&mut self, packet: &P) -> Result<(), Error> {
        let Attachment::Attached(net) = &mut self.net else {
            return Err(Error::Detached);
        };

        let written = async {
            packet.send(net).await?;
            net.flush().await.map_err(WriteError::from)?;
            Ok(())
        }
        .await;

        written.map_err(|e: TxError<N::Error>| match e {
            TxError::Write(e) => Error::Network(e.kind()),
            TxError::WriteZero => Error::Network(ErrorKind::WriteZero),
        })
    }

    fn build_puback(
        &mut self,
        packet_identifier: u16,
        publish: &PublishPacket<'c>,
    ) -> PubackPacket<'c> {
        let mut builder = PubackBuilder::new(packet_identifier, ReasonCode::Success);
        if let Some(interceptor) = self.qos1_interceptor.as_mut() {
            interceptor.on_publish(publish, &mut builder);
        }
        builder.build()
    }

    fn build_pubrec(
        &mut self,
        packet_identifier: u16,
        publish: &PublishPacket<'c>,
    ) -> PubrecPacket<'c> {
        let mut builder = PubrecBuilder::new(packet_identifier, ReasonCode::Success);
        if let Some(interceptor) = self.qos2_interceptor.as_mut() {
            interceptor.on_publish(publish, &mut builder);
        }
        builder.build()
    }

    fn build_pubcomp(
        &mut self,
        pubrel: &PubrelPacket<'c>,
        reason_code: ReasonCode,
    ) -> PubcompPacket<'c> {
        let mut builder = PubcompBuilder::new(pubrel.packet_identifier, reason_code);
        if let Some(interceptor) = self.qos2_interceptor.as_mut() {
            interceptor.on_pubrel(pubrel, &mut builder);
        }
        builder.build()
    }
}
