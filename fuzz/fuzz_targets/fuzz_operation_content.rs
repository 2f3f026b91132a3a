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

use aclinspect::acl::operation::{format_operation, OperationEntry};
use aclinspect::core::types::RawAclContent;
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Clone, Debug, Arbitrary)]
struct Input {
    tag: u8,
    body: Vec<u8>,
}

fuzz_target!(|inp: Input| {
    // Small tags hit the known variants far more often than a full u32 would.
    let entry = OperationEntry::from_raw(&RawAclContent { tag: u32::from(inp.tag % 20), body: inp.body });
    let f = format_operation(&entry);
    assert!(!f.kind.is_empty());
});
