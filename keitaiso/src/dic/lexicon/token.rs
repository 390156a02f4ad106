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

use std::io::Write;

/// Fixed size record of the token table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub left_id: u16,
    pub right_id: u16,
    pub cost: i16,
    pub feature_offset: u32,
    pub feature_len: u32,
}

impl Token {
    pub const STORAGE_SIZE: usize = 16;

    /// Reads the token at `index` of a token table
    pub fn read(table: &[u8], index: usize) -> Option<Token> {
        let start = index * Self::STORAGE_SIZE;
        let b = table.get(start..start + Self::STORAGE_SIZE)?;
        Some(Token {
            left_id: u16::from_le_bytes([b[0], b[1]]),
            right_id: u16::from_le_bytes([b[2], b[3]]),
            cost: i16::from_le_bytes([b[4], b[5]]),
            // b[6..8] is reserved
            feature_offset: u32::from_le_bytes([b[8], b[9], b[10], b[11]]),
            feature_len: u32::from_le_bytes([b[12], b[13], b[14], b[15]]),
        })
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<usize> {
        w.write_all(&self.left_id.to_le_bytes())?;
        w.write_all(&self.right_id.to_le_bytes())?;
        w.write_all(&self.cost.to_le_bytes())?;
        w.write_all(&[0, 0])?;
        w.write_all(&self.feature_offset.to_le_bytes())?;
        w.write_all(&self.feature_len.to_le_bytes())?;
        Ok(Self::STORAGE_SIZE)
    }

    pub fn feature_range(&self) -> std::ops::Range<usize> {
        let begin = self.feature_offset as usize;
        begin..begin + self.feature_len as usize
    }
}
