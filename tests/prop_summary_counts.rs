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

use aclinspect::acl::state::{AccountRecord, Invite, MembershipState};
use aclinspect::acl::summary::MembershipSummary;
use aclinspect::core::types::{AccountStatus, Permissions};
use proptest::prelude::*;

fn arb_account() -> impl Strategy<Value = AccountRecord> {
    (
        prop::collection::vec(any::<u8>(), 0..8),
        prop::sample::select(Permissions::ALL.to_vec()),
        prop::sample::select(AccountStatus::ALL.to_vec()),
    )
        .prop_map(|(identity, permissions, status)| AccountRecord { identity, permissions, status })
}

proptest! {
    #[test]
    fn prop_counts_cover_every_account(accounts in prop::collection::vec(arb_account(), 0..40)) {
        let n = accounts.len();
        let state = MembershipState::new(vec![], Vec::<Invite>::new(), accounts);
        let s = MembershipSummary::from_state(&state);

        prop_assert_eq!(s.accounts_by_status.iter().sum::<usize>(), n);
        prop_assert_eq!(s.accounts_by_role.iter().sum::<usize>(), n);

        let mut out = Vec::new();
        s.render(&mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");
        // zero buckets are never printed
        prop_assert!(!text.contains("=0\n"));
    }
}
