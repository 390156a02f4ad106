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

/// Result of a prefix search step
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct TrieEntry {
    /// Value stored for the matched key
    pub value: u32,
    /// Byte index of the key end in the searched input
    pub end: usize,
}

/// Read-only view over a double array built by `yada`
///
/// Every unit is a little endian `u32`.
pub struct Trie<'a> {
    array: &'a [u8],
}

pub struct TrieEntryIter<'a> {
    trie: Trie<'a>,
    node_pos: usize,
    data: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for TrieEntryIter<'a> {
    type Item = TrieEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let mut node_pos = self.node_pos;

        for i in self.offset..self.data.len() {
            let k = self.data[i] as usize;
            node_pos ^= k;
            let unit = self.trie.get(node_pos)? as usize;
            if Trie::label(unit) != k {
                return None;
            }

            node_pos ^= Trie::offset(unit);
            if Trie::has_leaf(unit) {
                let r = TrieEntry {
                    value: Trie::value(self.trie.get(node_pos)?),
                    end: i + 1,
                };
                self.offset = r.end;
                self.node_pos = node_pos;
                return Some(r);
            }
        }
        self.offset = self.data.len();
        None
    }
}

impl<'a> Trie<'a> {
    pub const UNIT_SIZE: usize = 4;

    pub fn new(array: &'a [u8]) -> Trie<'a> {
        Trie { array }
    }

    /// Number of units in the array
    pub fn size(&self) -> usize {
        self.array.len() / Self::UNIT_SIZE
    }

    /// Iterates over all keys which are prefixes of `input[offset..]`, shortest first
    pub fn common_prefix_iterator(&self, input: &'a [u8], offset: usize) -> TrieEntryIter<'a> {
        let node_pos = self.get(0).map_or(0, |u| Trie::offset(u as usize));
        TrieEntryIter {
            trie: Trie { array: self.array },
            node_pos,
            data: input,
            offset: if self.size() == 0 { input.len() } else { offset },
        }
    }

    #[inline]
    fn get(&self, index: usize) -> Option<u32> {
        let start = index * Self::UNIT_SIZE;
        let bytes = self.array.get(start..start + Self::UNIT_SIZE)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn has_leaf(unit: usize) -> bool {
        ((unit >> 8) & 1) == 1
    }

    fn value(unit: u32) -> u32 {
        unit & ((1 << 31) - 1)
    }

    fn label(unit: usize) -> usize {
        unit & ((1 << 31) | 0xFF)
    }

    fn offset(unit: usize) -> usize {
        (unit >> 10) << ((unit & (1 << 9)) >> 6)
    }
}
