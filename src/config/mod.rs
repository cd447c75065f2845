//! Connection-scoped configuration values negotiated at CONNECT time.

/// Maximum concurrent inbound publications with a Quality of Service greater
/// than 0 that this client accepts, as announced in its CONNECT packet.
///
/// Always positive; the negotiation layer never produces 0. Defaults to
/// [`u16::MAX`], which is also what the protocol assumes when the property is
/// absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiveMaximum(u16);

impl ReceiveMaximum {
    /// Creates a receive maximum.
    ///
    /// # Panics
    /// Panics in debug builds if `value` is 0, which the specification does
    /// not allow.
    pub const fn new(value: u16) -> Self {
        debug_assert!(value != 0, "a receive maximum of 0 is not allowed");

        Self(value)
    }

    /// Returns the window size.
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl Default for ReceiveMaximum {
    fn default() -> Self {
        Self(u16::MAX)
    }
}
