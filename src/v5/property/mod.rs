//! Properties appearing in the packets of the inbound QoS path.

use crate::{
    eio::Read,
    io::{err::ReadError, read::Readable},
};

mod types;
mod values;

pub use types::PropertyType;
pub use values::*;

/// Marker trait tying a property value to its wire identifier.
///
/// Implementations come with the following `Readable`/`Writable` qualities:
///
/// * `Writable` writes both the property's identifier and its content.
/// * `Readable` reads only the property's content.
pub trait Property {
    /// The identifier preceding the property's content on the wire.
    const TYPE: PropertyType;
    /// The wrapped value type.
    type Inner;

    /// Unwraps the property's content.
    fn into_inner(self) -> Self::Inner;
}

/// Helper to read properties that may appear at most once into a packet.
pub trait AtMostOnceProperty<R: Read, T: Property> {
    /// Reads the property's content, failing when it was already present.
    async fn try_set(
        &mut self,
        read: &mut R,
    ) -> Result<(), AtMostOncePropertyError<ReadError<R::Error>>>;
}

/// Error of [`AtMostOnceProperty::try_set`].
pub enum AtMostOncePropertyError<E> {
    /// Reading the property's content failed.
    Read(E),
    /// The property appeared more than once.
    AlreadySet,
}
impl<E> From<ReadError<E>> for AtMostOncePropertyError<ReadError<E>> {
    fn from(e: ReadError<E>) -> Self {
        Self::Read(e)
    }
}
impl<R: Read, T: Property + Readable<R>> AtMostOnceProperty<R, T> for Option<T> {
    async fn try_set(
        &mut self,
        read: &mut R,
    ) -> Result<(), AtMostOncePropertyError<ReadError<R::Error>>> {
        if self.is_some() {
            Err(AtMostOncePropertyError::AlreadySet)
        } else {
            let value = T::read(read).await.map_err(AtMostOncePropertyError::Read)?;

            self.replace(value);
            Ok(())
        }
    }
}
