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


#![forbid(unsafe_code)]

//! Generate (or show) an account key: prints the account id and the hex identity bytes.

use aclinspect::core::security::keys::AccountKeys;
use anyhow::{Context, Result};
use std::path::PathBuf;

fn main() -> Result<()> {
    let out_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let mut key_path = PathBuf::from(out_dir);
    key_path.push("account.key");

    let keys = AccountKeys::load_or_create(&key_path)
        .with_context(|| format!("load or create {}", key_path.display()))?;

    println!("account={}", keys.account_id());
    println!("identity={}", hex::encode(keys.identity()));
    Ok(())
}
