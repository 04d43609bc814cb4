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

//! Encrypted-key-at-rest file model consumed from the wallet collaborator.
//!
//! This SDK parses and structurally validates keystore files; the scrypt derivation and AES
//! decryption producing the raw private key happen in the wallet layer, whose output feeds a
//! [`crate::Signer`] implementation.

use moiapi::decode_hex;

/// Standard encrypted keystore file.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Keystore {
    pub cipher: String,
    pub ciphertext: String,
    pub cipherparams: CipherParams,
    pub kdf: String,
    pub kdfparams: KdfParams,
    pub mac: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct CipherParams {
    #[serde(rename = "IV")]
    pub iv: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct KdfParams {
    pub n: u32,
    pub r: u32,
    pub p: u32,
    pub dklen: u32,
    pub salt: String,
}

/// Error of parsing or validating a keystore file.
#[derive(Debug, Display, Error, From)]
pub enum KeystoreError {
    #[from]
    #[display(inner)]
    Json(serde_json::Error),

    #[display("cipher '{0}' is not supported")]
    UnsupportedCipher(String),

    #[display("key derivation function '{0}' is not supported")]
    UnsupportedKdf(String),

    #[display("keystore field '{0}' is not valid hex")]
    MalformedField(&'static str),

    #[display("scrypt cost {0} is not a power of two")]
    BadCost(u32),

    #[display("derived key length {0} is too short")]
    ShortKey(u32),
}

impl Keystore {
    pub fn from_json(json: &str) -> Result<Self, KeystoreError> {
        let keystore: Keystore = serde_json::from_str(json)?;
        keystore.validate()?;
        Ok(keystore)
    }

    /// Structural validation: supported algorithms, well-formed hex fields, sane scrypt
    /// parameters. Does not check the MAC - that requires the derived key.
    pub fn validate(&self) -> Result<(), KeystoreError> {
        if self.cipher != "aes-128-ctr" {
            return Err(KeystoreError::UnsupportedCipher(self.cipher.clone()));
        }
        if self.kdf != "scrypt" {
            return Err(KeystoreError::UnsupportedKdf(self.kdf.clone()));
        }
        for (field, hex) in [
            ("ciphertext", &self.ciphertext),
            ("cipherparams.IV", &self.cipherparams.iv),
            ("kdfparams.salt", &self.kdfparams.salt),
            ("mac", &self.mac),
        ] {
            if decode_hex(hex).is_err() {
                return Err(KeystoreError::MalformedField(field));
            }
        }
        if !self.kdfparams.n.is_power_of_two() {
            return Err(KeystoreError::BadCost(self.kdfparams.n));
        }
        if self.kdfparams.dklen < 16 {
            return Err(KeystoreError::ShortKey(self.kdfparams.dklen));
        }
        Ok(())
    }

    /// The ciphertext bytes handed to the wallet layer for decryption.
    pub fn ciphertext_bytes(&self) -> Result<Vec<u8>, KeystoreError> {
        decode_hex(&self.ciphertext).map_err(|_| KeystoreError::MalformedField("ciphertext"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> String {
        r#"{
            "cipher": "aes-128-ctr",
            "ciphertext": "aabbccddeeff00112233445566778899",
            "cipherparams": {"IV": "000102030405060708090a0b0c0d0e0f"},
            "kdf": "scrypt",
            "kdfparams": {"n": 4096, "r": 8, "p": 1, "dklen": 32, "salt": "ffee"},
            "mac": "deadbeef"
        }"#
        .to_owned()
    }

    #[test]
    fn well_formed_keystore_parses() {
        let keystore = Keystore::from_json(&sample()).unwrap();
        assert_eq!(keystore.kdfparams.n, 4096);
        assert_eq!(keystore.ciphertext_bytes().unwrap().len(), 16);
    }

    #[test]
    fn unsupported_cipher_is_rejected() {
        let json = sample().replace("aes-128-ctr", "rot13");
        assert!(matches!(Keystore::from_json(&json), Err(KeystoreError::UnsupportedCipher(_))));
    }

    #[test]
    fn malformed_hex_fields_are_rejected() {
        let json = sample().replace("deadbeef", "notahex!");
        assert!(matches!(
            Keystore::from_json(&json),
            Err(KeystoreError::MalformedField("mac"))
        ));
    }

    #[test]
    fn scrypt_cost_must_be_power_of_two() {
        let json = sample().replace("4096", "4095");
        assert!(matches!(Keystore::from_json(&json), Err(KeystoreError::BadCost(4095))));
    }
}
