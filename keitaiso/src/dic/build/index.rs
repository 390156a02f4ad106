/*
 * Copyright (c) 2021 Works Applications Co., Ltd.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::collections::BTreeMap;

use crate::dic::build::error::{BuildFailure, BuildResult};
use crate::dic::lexicon::{MAX_HOMOGRAPHS, MAX_TOKENS};

/// Groups entries by surface and builds the double array over them
///
/// Token order of the compiled dictionary is the key order of the trie,
/// homographs keep the order in which they were added.
pub struct IndexBuilder<'a> {
    data: BTreeMap<&'a str, Vec<usize>>,
}

/// Compiled index
#[derive(Debug)]
pub struct Index {
    /// Entry index for every token slot
    pub order: Vec<usize>,
    /// Double array bytes
    pub trie: Vec<u8>,
}

impl<'a> IndexBuilder<'a> {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, key: &'a str, entry: usize) {
        self.data.entry(key).or_default().push(entry)
    }

    pub fn build(self) -> BuildResult<Index> {
        let total: usize = self.data.values().map(|v| v.len()).sum();
        if total >= MAX_TOKENS {
            return Err(BuildFailure::TooManyEntries(total, MAX_TOKENS));
        }

        let mut order = Vec::with_capacity(total);
        let mut trie_entries: Vec<(&str, u32)> = Vec::with_capacity(self.data.len());
        for (k, ids) in self.data {
            if ids.len() > MAX_HOMOGRAPHS {
                return Err(BuildFailure::TooManyHomographs(
                    k.to_owned(),
                    ids.len(),
                    MAX_HOMOGRAPHS,
                ));
            }
            let value = ((order.len() as u32) << 8) | ids.len() as u32;
            trie_entries.push((k, value));
            order.extend(ids);
        }

        // yada requires sorted keys, BTreeMap already yields them that way
        let trie = if trie_entries.is_empty() {
            Vec::new()
        } else {
            yada::builder::DoubleArrayBuilder::build(&trie_entries)
                .ok_or(BuildFailure::TrieBuildFailure)?
        };

        Ok(Index { order, trie })
    }
}
