//! Storage strategy for dynamically sized fields of received packets.

use crate::bytes::Bytes;

#[cfg(feature = "alloc")]
pub use alloc_buffer::AllocBuffer;
#[cfg(feature = "bump")]
pub use bump::BumpBuffer;

/// Provides memory for payloads, topics and strings of received packets.
///
/// Returned memory can be borrowed or owned; either way it is bound by the
/// `'a` lifetime of the provider's backing storage. The decode path never
/// keeps references into memory returned here beyond the decoded packet.
pub trait BufferProvider<'a> {
    /// The type returned from a successful provision. It must be mutably
    /// borrowable for initialization and convertible into [`Bytes`] for
    /// storing in a packet.
    type Buffer: AsMut<[u8]> + Into<Bytes<'a>>;

    /// The error type returned from a failed provision.
    type ProvisionError: core::fmt::Debug;

    /// Returns contiguous memory of exactly `len` bytes.
    fn provide_buffer(&mut self, len: usize) -> Result<Self::Buffer, Self::ProvisionError>;
}

#[cfg(feature = "bump")]
mod bump {
    use core::slice;

    use crate::buffer::BufferProvider;

    /// The bump buffer ran out of backing memory.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct InsufficientSpace;

    /// Hands out chunks of a caller-provided slice front to back.
    ///
    /// Can be reset once no references into the backing slice remain.
    #[derive(Debug)]
    pub struct BumpBuffer<'a> {
        slice: &'a mut [u8],
        index: usize,
    }

    impl<'a> BufferProvider<'a> for BumpBuffer<'a> {
        type Buffer = &'a mut [u8];
        type ProvisionError = InsufficientSpace;

        fn provide_buffer(&mut self, len: usize) -> Result<Self::Buffer, Self::ProvisionError> {
            if self.remaining_len() < len {
                return Err(InsufficientSpace);
            }

            // Safety: bounds were checked above and the pointer originates
            // from the backing slice owned by this struct with lifetime 'a.
            let ptr = unsafe { self.slice.as_mut_ptr().add(self.index) };
            self.index += len;

            // Safety: the range starts past every previous reservation and
            // self.index has already been advanced past its end.
            Ok(unsafe { slice::from_raw_parts_mut(ptr, len) })
        }
    }

    impl<'a> BumpBuffer<'a> {
        /// Creates a new `BumpBuffer` over the given backing slice.
        pub fn new(slice: &'a mut [u8]) -> Self {
            Self { slice, index: 0 }
        }

        /// Returns the amount of unreserved bytes left in the backing slice.
        #[inline]
        pub fn remaining_len(&self) -> usize {
            self.slice.len() - self.index
        }

        /// Invalidates all previous reservations so the backing slice can be
        /// reused from the start.
        ///
        /// # Safety
        /// No references into previously provided chunks may exist anymore.
        /// In the context of the inbound engine this means no publication
        /// content and no reason strings are still held.
        #[inline]
        pub unsafe fn reset(&mut self) {
            self.index = 0;
        }
    }

}

#[cfg(feature = "alloc")]
mod alloc_buffer {
    use core::convert::Infallible;

    use alloc::boxed::Box;
    use alloc::vec;

    use crate::buffer::BufferProvider;

    /// Provides memory from the global allocator.
    #[derive(Debug)]
    pub struct AllocBuffer;

    impl<'a> BufferProvider<'a> for AllocBuffer {
        type Buffer = Box<[u8]>;
        type ProvisionError = Infallible;

        fn provide_buffer(&mut self, len: usize) -> Result<Self::Buffer, Self::ProvisionError> {
            Ok(vec![0; len].into_boxed_slice())
        }
    }

    #[cfg(test)]
    mod unit {
        use tokio_test::assert_ok;

        use super::*;

        #[test]
        fn provides_requested_length() {
            let mut alloc = AllocBuffer;

            let buffer = assert_ok!(alloc.provide_buffer(12));
            assert_eq!(buffer.len(), 12);
        }
    }
}
