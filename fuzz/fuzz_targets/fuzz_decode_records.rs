// Copyright (c) 2026 Aclinspect
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![no_main]
#![forbid(unsafe_code)]

use aclinspect::acl::envelope::{decode_delta, decode_root};
use aclinspect::acl::format::{operation_lines, root_line};
use aclinspect::core::types::RawRecordWithId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding and rendering must reject garbage without panicking.
    let raw = RawRecordWithId { id: String::from_utf8_lossy(&data[..data.len().min(8)]).into_owned(), payload: data.to_vec() };
    if let Ok(root) = decode_root(&raw) {
        let _ = root_line(&root);
    }
    if let Ok(delta) = decode_delta(&raw) {
        let _ = operation_lines(&delta);
    }
});
