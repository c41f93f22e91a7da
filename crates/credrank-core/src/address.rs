//! Hierarchical, prefix-ordered addresses for nodes and edges.
//!
//! An address is an ordered sequence of string parts. Two disjoint address
//! flavors — [`NodeAddress`] and [`EdgeAddress`] — share this algebra through
//! the private [`Address`] type but are never interchangeable: the type
//! system, not a convention, keeps a node address from drifting into a field
//! that expects an edge address.
//!
//! Ordering compares parts element-by-element (`Vec<String>`'s derived
//! `Ord`), never the canonical joined string. This keeps sorting stable even
//! if a part happens to contain bytes that collide with the separator in a
//! naive string comparison.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CredRankError;

/// Separator used only by [`Address::to_canonical_string`]; never consulted
/// for ordering or equality.
pub const SEPARATOR: char = '/';

/// The reserved root part under which all structural (gadget-produced)
/// addresses live. A compile-time constant, not mutable global state.
pub const CORE_ROOT: &str = "core";

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Address {
    parts: Vec<String>,
}

impl Address {
    fn from_parts<I, S>(parts: I) -> Result<Self, CredRankError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parts: Vec<String> = parts.into_iter().map(Into::into).collect();
        for part in &parts {
            if part.contains(SEPARATOR) {
                return Err(CredRankError::AddressParseError {
                    gadget: "address",
                    address: part.clone(),
                });
            }
        }
        Ok(Address { parts })
    }

    fn append<I, S>(&self, more: I) -> Result<Self, CredRankError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = self.parts.clone();
        let appended = Address::from_parts(more)?;
        parts.extend(appended.parts);
        Ok(Address { parts })
    }

    fn has_prefix(&self, prefix: &Address) -> bool {
        self.parts.starts_with(prefix.parts.as_slice())
    }

    fn to_canonical_string(&self) -> String {
        self.parts.join(&SEPARATOR.to_string())
    }
}

/// Build both address newtypes from a common private [`Address`] algebra,
/// without an inheritance hierarchy or trait object between them — the two
/// flavors are a closed pair, not an open family.
macro_rules! address_newtype {
    ($name:ident, $gadget_label:literal) => {
        #[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name {
            #[serde(with = "address_parts_serde")]
            inner: Address,
        }

        impl $name {
            /// Construct from an ordered sequence of parts. Errors if any
            /// part contains the reserved separator character.
            pub fn from_parts<I, S>(parts: I) -> Result<Self, CredRankError>
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                Ok(Self {
                    inner: Address::from_parts(parts)?,
                })
            }

            /// The empty address — a prefix of every address, including itself.
            pub fn root() -> Self {
                Self {
                    inner: Address::default(),
                }
            }

            /// The reserved structural root, `core`.
            pub fn core_root() -> Self {
                Self::from_parts([CORE_ROOT]).expect("CORE_ROOT contains no separator")
            }

            /// Append further parts, returning a new, longer address.
            pub fn append<I, S>(&self, more: I) -> Result<Self, CredRankError>
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                Ok(Self {
                    inner: self.inner.append(more)?,
                })
            }

            /// Borrow the ordered parts.
            pub fn to_parts(&self) -> &[String] {
                &self.inner.parts
            }

            /// True if `self` is `prefix` followed by zero or more parts.
            pub fn has_prefix(&self, prefix: &Self) -> bool {
                self.inner.has_prefix(&prefix.inner)
            }

            /// True if this address lives under the reserved `core` root.
            pub fn is_core(&self) -> bool {
                self.has_prefix(&Self::core_root())
            }

            /// The prefix of this address truncated to `len` parts, or the
            /// whole address if `len` exceeds its length.
            pub fn prefix(&self, len: usize) -> Self {
                let len = len.min(self.inner.parts.len());
                Self {
                    inner: Address {
                        parts: self.inner.parts[..len].to_vec(),
                    },
                }
            }

            /// Canonical string form: parts joined by `/`. Injective given
            /// the constructor's separator-free-part invariant.
            pub fn to_canonical_string(&self) -> String {
                self.inner.to_canonical_string()
            }

            /// Re-parse a canonical string produced by [`Self::to_canonical_string`].
            pub fn from_canonical_string(s: &str) -> Result<Self, CredRankError> {
                if s.is_empty() {
                    return Self::from_parts(Vec::<String>::new());
                }
                Self::from_parts(s.split(SEPARATOR).map(str::to_string))
            }

            #[allow(dead_code)]
            const GADGET_LABEL: &'static str = $gadget_label;
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_canonical_string())
            }
        }
    };
}

address_newtype!(NodeAddress, "node");
address_newtype!(EdgeAddress, "edge");

/// Serializes an [`Address`] as its canonical string, rather than as a raw
/// parts array, so the wire format matches the rest of the ecosystem's
/// slash-joined address convention.
mod address_parts_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Address;

    pub fn serialize<S: Serializer>(addr: &Address, s: S) -> Result<S::Ok, S::Error> {
        addr.to_canonical_string().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        let s = String::deserialize(d)?;
        if s.is_empty() {
            return Ok(Address::default());
        }
        Address::from_parts(s.split(super::SEPARATOR).map(str::to_string))
            .map_err(serde::de::Error::custom)
    }
}
