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

use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

use crate::error::DictionaryLoadError;

/// Bytes of a loaded dictionary file
#[derive(Debug)]
pub enum Storage {
    File(Mmap),
    Owned(Vec<u8>),
}

impl Storage {
    /// Memory-maps the file at `path`
    pub fn map_file<P: AsRef<Path>>(path: P) -> Result<Storage, DictionaryLoadError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DictionaryLoadError::NotFound(path.to_path_buf()));
        }
        let io_err = |cause| DictionaryLoadError::Io {
            cause,
            path: path.to_path_buf(),
        };
        let file = File::open(path).map_err(io_err)?;
        let map = unsafe { Mmap::map(&file) }.map_err(io_err)?;
        Ok(Storage::File(map))
    }
}

impl AsRef<[u8]> for Storage {
    fn as_ref(&self) -> &[u8] {
        match self {
            Storage::File(m) => m.as_ref(),
            Storage::Owned(v) => v,
        }
    }
}

impl From<Vec<u8>> for Storage {
    fn from(v: Vec<u8>) -> Self {
        Storage::Owned(v)
    }
}
