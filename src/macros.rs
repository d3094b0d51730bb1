// SPDX-License-Identifier: MIT

/// Generates a wrapper struct and implementations for CBOR-tagged types.
///
/// The generated struct wraps a value with a CBOR tag number. When serialized
/// to a binary format (CBOR), the value is emitted with its tag; when the
/// serializer is human-readable (JSON), the wrapper is transparent and only
/// the inner value is written.
///
/// # Parameters
///
/// The macro accepts a comma-separated list of tuples with the following elements:
///
/// * `tag_num`: The CBOR tag number as a literal expression
/// * `title`: The identifier for the generated wrapper struct
/// * `type`: The type being wrapped
/// * `doc_comments`: Documentation string for the generated struct
///
/// # Generated Items
///
/// For each tuple, the macro generates:
///
/// * A struct named `title` containing the wrapped value
/// * `new()` and `into_inner()`
/// * `AsRef<T>`, `AsMut<T>`, `Deref<Target = T>`, `DerefMut`, `From<T>`
/// * `Serialize` and `Deserialize`
///
/// # Example
///
/// ```
/// use unsigned_corim::generate_tagged;
///
/// generate_tagged!((42, TaggedCounter, u32, "A counter wrapped with CBOR tag 42"));
///
/// let tagged = TaggedCounter::new(7);
///
/// let mut cbor: Vec<u8> = vec![];
/// ciborium::into_writer(&tagged, &mut cbor).unwrap();
/// assert_eq!(cbor, vec![0xd8, 0x2a, 0x07]);
///
/// assert_eq!(serde_json::to_string(&tagged).unwrap(), "7");
/// assert_eq!(*tagged, 7);
/// ```
///
/// # Notes
///
/// * The wrapped value is stored in a `ciborium::tag::Accepted<T, N>` field, so
///   decoding CBOR accepts the value with or without its tag.
#[macro_export]
macro_rules! generate_tagged {
    ($(($tag_num:expr, $title:ident, $type:ty, $doc_comments:literal)),* $(,)?) => {
        $(
            #[doc = $doc_comments]
            #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
            pub struct $title(pub ::ciborium::tag::Accepted<$type, $tag_num>);

            impl $title {
                /// Creates a new wrapped instance from the provided value
                #[inline]
                pub const fn new(value: $type) -> Self {
                    Self(::ciborium::tag::Accepted(value))
                }

                /// Unwrap the tag, returning the inner value
                #[inline]
                pub fn into_inner(self) -> $type {
                    self.0 .0
                }
            }

            impl ::std::convert::AsRef<$type> for $title {
                fn as_ref(&self) -> &$type {
                    &self.0 .0
                }
            }

            impl ::std::convert::AsMut<$type> for $title {
                fn as_mut(&mut self) -> &mut $type {
                    &mut self.0 .0
                }
            }

            impl ::std::ops::Deref for $title {
                type Target = $type;

                fn deref(&self) -> &Self::Target {
                    &self.0 .0
                }
            }

            impl ::std::ops::DerefMut for $title {
                fn deref_mut(&mut self) -> &mut Self::Target {
                    &mut self.0 .0
                }
            }

            impl ::std::convert::From<$type> for $title {
                fn from(value: $type) -> Self {
                    Self::new(value)
                }
            }

            impl ::serde::ser::Serialize for $title {
                fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
                where
                    S: ::serde::ser::Serializer,
                {
                    if serializer.is_human_readable() {
                        ::serde::ser::Serialize::serialize(&self.0 .0, serializer)
                    } else {
                        ::serde::ser::Serialize::serialize(&self.0, serializer)
                    }
                }
            }

            impl<'de> ::serde::de::Deserialize<'de> for $title {
                fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
                where
                    D: ::serde::de::Deserializer<'de>,
                {
                    if deserializer.is_human_readable() {
                        <$type as ::serde::de::Deserialize>::deserialize(deserializer).map(Self::new)
                    } else {
                        <::ciborium::tag::Accepted<$type, $tag_num> as ::serde::de::Deserialize>::deserialize(
                            deserializer,
                        )
                        .map(Self)
                    }
                }
            }
        )*
    };
}

/// Calculate the "map length" of a struct to be used for CBOR encoding.
/// The first argument is the struct, followed by the number of mandatory
/// fields, followed by a list of optional fields that need to be evaluated.
///
///  For example, for [CorimLocatorMap](crate::corim::CorimLocatorMap) that
///  has one mandatory field and one optional thumbprint, this would be:
///
/// ```ignore
///  let len = map_len!(self, 1, thumbprint);
/// ```
macro_rules! map_len {
    ($s:expr, $mandatory_count:expr, $($opt_field:ident),* $(,)?) => {
        $mandatory_count $(+ ($s.$opt_field.is_some() as usize))*
    };
}

pub(crate) use map_len;
