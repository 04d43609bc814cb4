// MOI SDK: Rust client library for the MOI network
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2024-2025 by the MOI SDK contributors
//
// Copyright (C) 2024-2025 MOI SDK contributors. All rights under the above copyright are reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License
// is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express
// or implied. See the License for the specific language governing permissions and limitations under
// the License.

//! Fixed 32-byte tagged identifiers addressing participants, assets and logic modules.
//!
//! Byte layout: tag (kind and version nibbles), flags, two metadata bytes, a 24-byte fingerprint,
//! and a big-endian u32 variant index. An all-zero variant marks the canonical instance; a nonzero
//! one a derived sub-identity.

use core::fmt::{self, Display, Formatter};
use core::num::NonZeroU32;
use core::ops::Deref;
use core::str::FromStr;

use amplify::Bytes32;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::util::{decode_hex, encode_hex};

/// Byte length of every identifier, independent of its kind.
pub const ID_LENGTH: usize = 32;

/// Flag bit marking identifiers owned by the protocol itself. Legal for every kind.
pub const FLAG_SYSTEMIC: u8 = 0b0000_0001;
/// Asset flag: the asset is backed by a logic module.
pub const FLAG_LOGICAL: u8 = 0b0000_0010;
/// Asset flag: the asset keeps auxiliary state.
pub const FLAG_STATEFUL: u8 = 0b0000_0100;
/// Logic flag: the module is auxiliary to another logic.
pub const FLAG_AUXILIARY: u8 = 0b0000_0010;

/// Identifier kind, stored in the high nibble of the tag byte.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[repr(u8)]
pub enum IdKind {
    #[display("participant")]
    Participant = 0,

    #[display("asset")]
    Asset = 1,

    #[display("logic")]
    Logic = 2,
}

impl IdKind {
    /// The largest kind code known to this SDK version.
    pub const MAX: u8 = IdKind::Logic as u8;

    pub fn from_code(code: u8) -> Result<Self, IdError> {
        Ok(match code {
            0 => IdKind::Participant,
            1 => IdKind::Asset,
            2 => IdKind::Logic,
            unknown => return Err(IdError::UnknownKind(unknown)),
        })
    }

    /// The largest tag version supported for this kind.
    pub const fn max_version(self) -> u8 { 0 }

    /// Bitmap of the flag bits legal under a `(kind, version)` tag; any other bit set is a
    /// validation failure.
    pub const fn flag_mask(self, version: u8) -> u8 {
        match (self, version) {
            (IdKind::Participant, 0) => FLAG_SYSTEMIC,
            (IdKind::Asset, 0) => FLAG_SYSTEMIC | FLAG_LOGICAL | FLAG_STATEFUL,
            (IdKind::Logic, 0) => FLAG_SYSTEMIC | FLAG_AUXILIARY,
            _ => 0,
        }
    }
}

/// Tag byte of an identifier: kind in the high nibble, version in the low one.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct IdTag(u8);

impl IdTag {
    pub fn new(kind: IdKind, version: u8) -> Result<Self, IdError> {
        if version > kind.max_version() {
            return Err(IdError::UnsupportedVersion { kind, version });
        }
        Ok(IdTag(((kind as u8) << 4) | (version & 0x0F)))
    }

    pub const fn from_byte(byte: u8) -> Self { IdTag(byte) }

    pub const fn to_byte(self) -> u8 { self.0 }

    pub fn kind(self) -> Result<IdKind, IdError> { IdKind::from_code(self.0 >> 4) }

    pub const fn version(self) -> u8 { self.0 & 0x0F }
}

/// Raw 32-byte identifier with structural accessors but no kind guarantee.
///
/// Use [`ParticipantId`], [`AssetId`] or [`LogicId`] when the kind is part of the contract: those
/// validate the tag, version and flag mask at construction.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Deref, BorrowSlice, Index, RangeOps)]
pub struct Identifier(
    #[from]
    #[from([u8; 32])]
    Bytes32,
);

impl Identifier {
    /// Builds an identifier from its structural parts.
    pub fn compose(tag: IdTag, flags: u8, metadata: [u8; 2], fingerprint: [u8; 24], variant: u32) -> Self {
        let mut bytes = [0u8; 32];
        bytes[0] = tag.to_byte();
        bytes[1] = flags;
        bytes[2..4].copy_from_slice(&metadata);
        bytes[4..28].copy_from_slice(&fingerprint);
        bytes[28..32].copy_from_slice(&variant.to_be_bytes());
        Identifier(Bytes32::from(bytes))
    }

    /// Parses an identifier from hex (with or without the `0x` prefix). The decoded payload must
    /// be exactly 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, IdError> { Self::from_str(s) }

    pub fn copy_from_slice(bytes: &[u8]) -> Result<Self, IdError> {
        if bytes.len() != ID_LENGTH {
            return Err(IdError::InvalidLength {
                value: encode_hex(bytes),
                len: bytes.len(),
            });
        }
        let mut array = [0u8; 32];
        array.copy_from_slice(bytes);
        Ok(Identifier(Bytes32::from(array)))
    }

    pub fn to_byte_array(&self) -> [u8; 32] { self.0.to_byte_array() }

    pub fn tag(&self) -> IdTag { IdTag::from_byte(self.to_byte_array()[0]) }

    pub fn flags(&self) -> u8 { self.to_byte_array()[1] }

    pub fn metadata(&self) -> [u8; 2] {
        let bytes = self.to_byte_array();
        [bytes[2], bytes[3]]
    }

    pub fn fingerprint(&self) -> [u8; 24] {
        let mut fingerprint = [0u8; 24];
        fingerprint.copy_from_slice(&self.to_byte_array()[4..28]);
        fingerprint
    }

    /// The big-endian variant index; zero for the canonical instance.
    pub fn variant(&self) -> u32 {
        let bytes = self.to_byte_array();
        u32::from_be_bytes([bytes[28], bytes[29], bytes[30], bytes[31]])
    }

    pub fn is_variant(&self) -> bool { self.variant() != 0 }

    pub fn is_nil(&self) -> bool { self.to_byte_array() == [0u8; 32] }

    /// Derives the variant sub-identity with the given index: the variant field is replaced, all
    /// other bytes stay untouched. The derivation is pure, so any client reproduces the same
    /// identifier from the same inputs.
    pub fn derive_variant(&self, index: NonZeroU32) -> Self {
        let mut bytes = self.to_byte_array();
        bytes[28..32].copy_from_slice(&index.get().to_be_bytes());
        Identifier(Bytes32::from(bytes))
    }

    /// Validates the tag, version and flag mask against whatever kind the tag itself declares.
    pub fn validate_structure(&self) -> Result<(), IdError> {
        let kind = self.tag().kind()?;
        self.validate_as(kind)
    }

    /// Validates the tag, version and flag mask against an expected kind.
    pub fn validate_as(&self, kind: IdKind) -> Result<(), IdError> {
        let tag = self.tag();
        let found = tag.kind()?;
        if found != kind {
            return Err(IdError::KindMismatch {
                expected: kind,
                found,
                value: self.to_string(),
            });
        }
        if tag.version() > found.max_version() {
            return Err(IdError::UnsupportedVersion {
                kind: found,
                version: tag.version(),
            });
        }
        let mask = found.flag_mask(tag.version());
        if self.flags() & !mask != 0 {
            return Err(IdError::UnsupportedFlags {
                kind: found,
                version: tag.version(),
                flags: self.flags(),
            });
        }
        Ok(())
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&encode_hex(&self.to_byte_array())) }
}

impl FromStr for Identifier {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s).map_err(|_| IdError::InvalidHex(s.to_owned()))?;
        Self::copy_from_slice(&bytes)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(de::Error::custom)
    }
}

/// Error of identifier construction or validation. Always carries the offending value; raw bytes
/// are never truncated or padded into shape.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
pub enum IdError {
    /// Identifiers are exactly 32 bytes for every kind.
    #[display("identifier '{value}' decodes to {len} bytes instead of the required 32")]
    InvalidLength { value: String, len: usize },

    #[display("identifier string '{0}' is not valid hex")]
    InvalidHex(String),

    #[display("unknown identifier kind code {0:#x}")]
    UnknownKind(u8),

    #[display("version {version} exceeds the maximum supported for {kind} identifiers")]
    UnsupportedVersion { kind: IdKind, version: u8 },

    #[display("flags {flags:#010b} include bits unsupported by the {kind} v{version} tag")]
    UnsupportedFlags { kind: IdKind, version: u8, flags: u8 },

    #[display("expected a {expected} identifier, but '{value}' carries a {found} tag")]
    KindMismatch {
        expected: IdKind,
        found: IdKind,
        value: String,
    },
}

macro_rules! impl_typed_id {
    ($ty:ident, $kind:expr) => {
        impl $ty {
            pub const KIND: IdKind = $kind;

            /// Structural validity check; `None` means the bytes form a valid identifier of this
            /// kind. Construction goes through the same check and fails on the first violation.
            pub fn validate(bytes: &[u8]) -> Option<IdError> {
                match Identifier::copy_from_slice(bytes) {
                    Ok(id) => id.validate_as(Self::KIND).err(),
                    Err(err) => Some(err),
                }
            }

            pub fn from_hex(s: &str) -> Result<Self, IdError> { Self::from_str(s) }

            pub fn copy_from_slice(bytes: &[u8]) -> Result<Self, IdError> {
                Identifier::copy_from_slice(bytes)?.try_into()
            }

            /// See [`Identifier::derive_variant`]. A valid identifier stays valid: only the
            /// variant bytes change.
            pub fn derive_variant(&self, index: NonZeroU32) -> Self { Self(self.0.derive_variant(index)) }
        }

        impl Deref for $ty {
            type Target = Identifier;
            fn deref(&self) -> &Identifier { &self.0 }
        }

        impl TryFrom<Identifier> for $ty {
            type Error = IdError;
            fn try_from(id: Identifier) -> Result<Self, Self::Error> {
                id.validate_as($kind)?;
                Ok(Self(id))
            }
        }

        impl From<$ty> for Identifier {
            fn from(id: $ty) -> Self { id.0 }
        }

        impl FromStr for $ty {
            type Err = IdError;
            fn from_str(s: &str) -> Result<Self, Self::Err> { Identifier::from_str(s)?.try_into() }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { Display::fmt(&self.0, f) }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.0.serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                Identifier::deserialize(deserializer)?.try_into().map_err(de::Error::custom)
            }
        }
    };
}

/// Identifier of a network participant (an account).
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct ParticipantId(Identifier);
impl_typed_id!(ParticipantId, IdKind::Participant);

/// Identifier of an asset.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct AssetId(Identifier);
impl_typed_id!(AssetId, IdKind::Asset);

impl AssetId {
    /// The asset standard enumerant, stored big-endian in the metadata bytes.
    pub fn standard(&self) -> u16 { u16::from_be_bytes(self.metadata()) }
}

/// Identifier of a deployed logic module.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct LogicId(Identifier);
impl_typed_id!(LogicId, IdKind::Logic);
