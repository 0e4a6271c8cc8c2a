// Copyright 2025 jitcache Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use super::{Eviction, Op};
use crate::record::Record;

/// Dump the tracked records of a policy in list order for assertions.
pub trait Dump {
    type Output;
    fn dump(&self) -> Self::Output;
}

/// Apply acquire/release ops directly in tests.
pub trait OpExt: Eviction {
    fn acquire_mutable(&mut self, record: &Arc<Record<Self>>) {
        match Self::acquire() {
            Op::Mutable(mut f) => f(self, record),
            _ => unreachable!(),
        }
    }

    fn release_mutable(&mut self, record: &Arc<Record<Self>>) {
        match Self::release() {
            Op::Mutable(mut f) => f(self, record),
            _ => unreachable!(),
        }
    }
}

impl<E> OpExt for E where E: Eviction {}

pub fn assert_ptr_eq<E>(a: &Arc<Record<E>>, b: &Arc<Record<E>>)
where
    E: Eviction,
{
    assert_eq!(Arc::as_ptr(a), Arc::as_ptr(b));
}

pub fn assert_ptr_vec_eq<E>(va: Vec<Arc<Record<E>>>, vb: Vec<Arc<Record<E>>>)
where
    E: Eviction,
{
    assert_eq!(va.len(), vb.len());
    for (a, b) in va.iter().zip(vb.iter()) {
        assert_ptr_eq(a, b);
    }
}

pub fn assert_ptr_vec_vec_eq<E>(vva: Vec<Vec<Arc<Record<E>>>>, vvb: Vec<Vec<Arc<Record<E>>>>)
where
    E: Eviction,
{
    assert_eq!(vva.len(), vvb.len());
    for (va, vb) in vva.into_iter().zip(vvb.into_iter()) {
        assert_ptr_vec_eq(va, vb);
    }
}
