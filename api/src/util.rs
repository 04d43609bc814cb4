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

use amplify::hex::{Error as HexError, FromHex, ToHex};

/// The sentinel payload meaning "no data": decodes to `None` across the manifest coder, never an
/// error.
pub const EMPTY_PAYLOAD: &str = "0x";

/// Whether a hex payload is the empty-data sentinel (with or without the `0x` prefix).
pub fn is_empty_payload(hex: &str) -> bool { strip_prefix(hex).is_empty() }

/// Decodes a hex string into bytes, accepting an optional `0x`/`0X` prefix.
pub fn decode_hex(hex: &str) -> Result<Vec<u8>, HexError> { Vec::<u8>::from_hex(strip_prefix(hex)) }

/// Encodes bytes as a lowercase `0x`-prefixed hex string.
pub fn encode_hex(data: &[u8]) -> String { format!("0x{}", data.to_hex()) }

fn strip_prefix(hex: &str) -> &str {
    hex.strip_prefix("0x").or_else(|| hex.strip_prefix("0X")).unwrap_or(hex)
}
