use core::fmt;

use const_fn::const_fn;

use crate::{
    bytes::Bytes,
    types::{MqttString, TooLargeToEncode},
};

/// Arbitrary binary data whose length fits the 2-byte length field of the
/// encoding, i.e. at most [`MqttBinary::MAX_LENGTH`] bytes.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct MqttBinary<'b>(pub(crate) Bytes<'b>);

impl<'b> fmt::Debug for MqttBinary<'b> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MqttBinary").field(&self.as_ref()).finish()
    }
}

#[cfg(feature = "defmt")]
impl<'a> defmt::Format for MqttBinary<'a> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "MqttBinary({:?})", self.as_ref());
    }
}

impl<'b> TryFrom<&'b [u8]> for MqttBinary<'b> {
    type Error = TooLargeToEncode;

    fn try_from(value: &'b [u8]) -> Result<Self, Self::Error> {
        Self::from_slice(value)
    }
}
impl<'b> From<MqttString<'b>> for MqttBinary<'b> {
    fn from(value: MqttString<'b>) -> Self {
        Self(value.0.0)
    }
}

impl<'b> AsRef<[u8]> for MqttBinary<'b> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<'b> MqttBinary<'b> {
    /// The maximum length of binary data so that its 2-byte length field can
    /// be encoded.
    pub const MAX_LENGTH: usize = u16::MAX as usize;

    /// Converts [`Bytes`] into `MqttBinary`, checking the
    /// [`MqttBinary::MAX_LENGTH`] invariant.
    #[const_fn(cfg(not(feature = "alloc")))]
    pub const fn from_bytes(bytes: Bytes<'b>) -> Result<Self, TooLargeToEncode> {
        match bytes.len() {
            ..=Self::MAX_LENGTH => Ok(Self(bytes)),
            _ => Err(TooLargeToEncode),
        }
    }

    /// Converts a slice into `MqttBinary`, checking the
    /// [`MqttBinary::MAX_LENGTH`] invariant.
    pub const fn from_slice(slice: &'b [u8]) -> Result<Self, TooLargeToEncode> {
        match slice.len() {
            ..=Self::MAX_LENGTH => Ok(Self(Bytes::Borrowed(slice))),
            _ => Err(TooLargeToEncode),
        }
    }

    /// Converts a slice into `MqttBinary` without checking its length.
    ///
    /// # Invariants
    /// The slice must be at most [`MqttBinary::MAX_LENGTH`] bytes long.
    ///
    /// # Panics
    /// Panics in debug builds if the slice is longer than
    /// [`MqttBinary::MAX_LENGTH`].
    pub const fn from_slice_unchecked(slice: &'b [u8]) -> Self {
        debug_assert!(
            slice.len() <= Self::MAX_LENGTH,
            "the slice's length exceeds MAX_LENGTH"
        );

        Self(Bytes::Borrowed(slice))
    }

    /// Returns the length of the underlying data.
    #[inline]
    #[const_fn(cfg(not(feature = "alloc")))]
    pub const fn len(&self) -> u16 {
        self.0.len() as u16
    }

    /// Returns whether the underlying data is empty.
    #[inline]
    #[const_fn(cfg(not(feature = "alloc")))]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the underlying bytes as `&[u8]`.
    #[inline]
    #[const_fn(cfg(not(feature = "alloc")))]
    pub const fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Delegates to [`Bytes::as_borrowed`].
    #[inline]
    #[const_fn(cfg(not(feature = "alloc")))]
    pub const fn as_borrowed(&'b self) -> Self {
        Self(self.0.as_borrowed())
    }
}
