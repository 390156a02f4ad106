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

use std::path::Path;

use crate::dic::build::conn::ConnBuffer;
use crate::dic::storage::Storage;
use crate::error::{DictionaryLoadError, KeitaisoError};

/// Dense table of transition costs between context ids
///
/// Binary layout: `u16 num_left`, `u16 num_right`, then
/// `num_left * num_right` little endian `i16` cells, right id major.
#[derive(Debug)]
pub struct ConnectionMatrix {
    data: Storage,
    num_left: usize,
    num_right: usize,
}

impl ConnectionMatrix {
    pub const HEADER_SIZE: usize = 4;

    /// Wraps a binary matrix, checking that the data covers every cell
    pub fn from_storage(data: Storage) -> Result<ConnectionMatrix, String> {
        let bytes = data.as_ref();
        if bytes.len() < Self::HEADER_SIZE {
            return Err(format!("expected a header, got {} bytes", bytes.len()));
        }
        let num_left = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
        let num_right = u16::from_le_bytes([bytes[2], bytes[3]]) as usize;
        let expected = Self::HEADER_SIZE + num_left * num_right * 2;
        if bytes.len() != expected {
            return Err(format!(
                "{}x{} matrix needs {} bytes, was {}",
                num_left,
                num_right,
                expected,
                bytes.len()
            ));
        }

        Ok(ConnectionMatrix {
            data,
            num_left,
            num_right,
        })
    }

    /// Loads either a compiled matrix or a `.def` text matrix
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ConnectionMatrix, DictionaryLoadError> {
        let path = path.as_ref();
        let storage = if path.extension().map_or(false, |e| e == "def") {
            if !path.is_file() {
                return Err(DictionaryLoadError::NotFound(path.to_path_buf()));
            }
            let mut conn = ConnBuffer::new();
            let invalid = |e: KeitaisoError| {
                DictionaryLoadError::InvalidMatrix(path.to_path_buf(), e.to_string())
            };
            conn.read_file(path).map_err(invalid)?;
            let mut data = Vec::with_capacity(conn.byte_size());
            conn.write_to(&mut data).map_err(invalid)?;
            Storage::Owned(data)
        } else {
            Storage::map_file(path)?
        };
        Self::from_storage(storage)
            .map_err(|e| DictionaryLoadError::InvalidMatrix(path.to_path_buf(), e))
    }

    #[inline(always)]
    fn index(&self, left: u16, right: u16) -> usize {
        let uleft = left as usize;
        let uright = right as usize;
        debug_assert!(uleft < self.num_left);
        debug_assert!(uright < self.num_right);
        Self::HEADER_SIZE + (uright * self.num_left + uleft) * 2
    }

    /// Gets the cost of connecting a node with right id `left`
    /// to a following node with left id `right`
    ///
    /// Ids are validated against the matrix size when dictionaries are loaded.
    #[inline(always)]
    pub fn cost(&self, left: u16, right: u16) -> i16 {
        let index = self.index(left, right);
        let bytes = self.data.as_ref();
        i16::from_le_bytes([bytes[index], bytes[index + 1]])
    }

    /// Returns maximum number of left connection ID
    pub fn num_left(&self) -> usize {
        self.num_left
    }

    /// Returns maximum number of right connection ID
    pub fn num_right(&self) -> usize {
        self.num_right
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claim::assert_err;

    fn matrix(left: u16, right: u16, cells: &[i16]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&left.to_le_bytes());
        data.extend_from_slice(&right.to_le_bytes());
        for c in cells {
            data.extend_from_slice(&c.to_le_bytes());
        }
        data
    }

    #[test]
    fn right_major_layout() {
        let cm = ConnectionMatrix::from_storage(Storage::Owned(matrix(2, 3, &[0, 1, 2, 3, 4, 5])))
            .unwrap();
        assert_eq!(cm.num_left(), 2);
        assert_eq!(cm.num_right(), 3);
        assert_eq!(cm.cost(0, 0), 0);
        assert_eq!(cm.cost(1, 0), 1);
        assert_eq!(cm.cost(0, 1), 2);
        assert_eq!(cm.cost(1, 2), 5);
    }

    #[test]
    fn short_data_is_rejected() {
        assert_err!(ConnectionMatrix::from_storage(Storage::Owned(vec![1])));
        assert_err!(ConnectionMatrix::from_storage(Storage::Owned(matrix(
            2,
            2,
            &[0, 1, 2]
        ))));
    }
}
