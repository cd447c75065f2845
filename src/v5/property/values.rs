use crate::{
    eio::{Read, Write},
    io::{
        err::{ReadError, WriteError},
        read::{Readable, Store},
        write::Writable,
    },
    types::{MqttBinary, MqttString, VarByteInt},
    v5::property::{Property, PropertyType},
};

/// Implements a property newtype with the given identifier and wrapped type.
///
/// * `Writable` writes identifier and content.
/// * `Readable` reads only the content; a lifetime on the newtype adds a
///   `Store` bound for persisting it.
macro_rules! property {
    ($name:ident, $ty:ty) => {
        #[doc = concat!("The ", stringify!($name), " property.")]
        #[derive(Debug, PartialEq, Clone, Copy)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name(pub(crate) $ty);

        impl Property for $name {
            const TYPE: PropertyType = PropertyType::$name;
            type Inner = $ty;

            fn into_inner(self) -> Self::Inner {
                self.0
            }
        }

        impl<R: Read> Readable<R> for $name {
            async fn read(read: &mut R) -> Result<Self, ReadError<<R>::Error>> {
                let content = <$ty as Readable<R>>::read(read).await?;
                Ok(Self(content))
            }
        }

        impl Writable for $name {
            fn written_len(&self) -> usize {
                Self::TYPE.written_len() + self.0.written_len()
            }
            async fn write<W: Write>(&self, write: &mut W) -> Result<(), WriteError<W::Error>> {
                Self::TYPE.write(write).await?;
                self.0.write(write).await?;

                Ok(())
            }
        }

        impl From<$ty> for $name {
            fn from(value: $ty) -> Self {
                Self(value)
            }
        }
    };
    ($name:ident < $lt:lifetime >, $ty:ty) => {
        #[doc = concat!("The ", stringify!($name), " property.")]
        #[derive(Debug, PartialEq, Clone)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name<$lt>(pub(crate) $ty);

        impl<$lt> Property for $name<$lt> {
            const TYPE: PropertyType = PropertyType::$name;
            type Inner = $ty;

            fn into_inner(self) -> Self::Inner {
                self.0
            }
        }

        impl<$lt, R: Read + Store<$lt>> Readable<R> for $name<$lt> {
            async fn read(read: &mut R) -> Result<Self, ReadError<<R>::Error>> {
                let content = <$ty as Readable<R>>::read(read).await?;
                Ok(Self(content))
            }
        }

        impl<$lt> Writable for $name<$lt> {
            fn written_len(&self) -> usize {
                Self::TYPE.written_len() + self.0.written_len()
            }
            async fn write<W: Write>(&self, write: &mut W) -> Result<(), WriteError<W::Error>> {
                Self::TYPE.write(write).await?;
                self.0.write(write).await?;

                Ok(())
            }
        }

        impl<$lt> From<$ty> for $name<$lt> {
            fn from(value: $ty) -> Self {
                Self(value)
            }
        }
    };
}

property!(PayloadFormatIndicator, bool);
property!(MessageExpiryInterval, u32);
property!(ContentType<'c>, MqttString<'c>);
property!(ResponseTopic<'c>, MqttString<'c>);
property!(CorrelationData<'c>, MqttBinary<'c>);
property!(SubscriptionIdentifier, VarByteInt);
property!(TopicAlias, u16);
property!(ReasonString<'c>, MqttString<'c>);

/// A name/value pair attached to a packet. Unlike the other properties it may
/// appear any number of times.
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UserProperty<'c> {
    /// Key of the pair. Duplicate keys are allowed.
    pub name: MqttString<'c>,
    /// Value of the pair.
    pub value: MqttString<'c>,
}

impl<'c> UserProperty<'c> {
    /// Creates a user property pair.
    pub const fn new(name: MqttString<'c>, value: MqttString<'c>) -> Self {
        Self { name, value }
    }
}

impl<'c> Writable for UserProperty<'c> {
    fn written_len(&self) -> usize {
        PropertyType::UserProperty.written_len() + self.name.written_len() + self.value.written_len()
    }

    async fn write<W: Write>(&self, write: &mut W) -> Result<(), WriteError<W::Error>> {
        PropertyType::UserProperty.write(write).await?;
        self.name.write(write).await?;
        self.value.write(write).await?;

        Ok(())
    }
}
