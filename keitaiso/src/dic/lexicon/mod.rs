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

use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::dic::header::Header;
use crate::dic::storage::Storage;
use crate::dic::word_id::WordId;
use crate::dic::DictionaryInfo;
use crate::error::DictionaryLoadError;

use self::token::Token;
use self::trie::Trie;

pub mod token;
pub mod trie;

/// The first 4 bits of word_id are used to indicate that from which lexicon
/// the word comes, thus we can only hold 15 lexicons in the same time.
/// 16th is reserved for unknown words.
pub const MAX_DICTIONARIES: usize = 15;

/// Trie values keep the number of homographs in the lowest byte
pub const MAX_HOMOGRAPHS: usize = 0xff;

/// Tokens are addressed with the remaining 23 bits of a trie value
pub const MAX_TOKENS: usize = 1 << 23;

/// A binary dictionary file
///
/// Contains the double array trie, the token table and the feature pool
pub struct Lexicon {
    storage: Storage,
    header: Header,
    path: PathBuf,
    dic_id: u8,
    trie: Range<usize>,
    tokens: Range<usize>,
    features: Range<usize>,
}

impl std::fmt::Debug for Lexicon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexicon")
            .field("path", &self.path)
            .field("dic_id", &self.dic_id)
            .field("header", &self.header)
            .finish()
    }
}

/// Result of the Lexicon lookup
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct LexiconEntry {
    /// Id of the returned word
    pub word_id: WordId,
    /// Byte index of the word end
    pub end: usize,
}

impl Lexicon {
    /// Memory-maps and validates the dictionary at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Lexicon, DictionaryLoadError> {
        let path = path.as_ref();
        let storage = Storage::map_file(path)?;
        Self::from_storage(storage, path.to_path_buf())
    }

    pub fn from_storage(storage: Storage, path: PathBuf) -> Result<Lexicon, DictionaryLoadError> {
        let bytes = storage.as_ref();
        let header = match Header::parse(bytes) {
            Ok(h) => h,
            Err(e) => return Err(DictionaryLoadError::InvalidHeader(path, e)),
        };

        let broken = |msg: String| DictionaryLoadError::Truncated(path.clone(), msg);

        if header.file_size() != bytes.len() {
            return Err(broken(format!(
                "header describes {} bytes, file has {}",
                header.file_size(),
                bytes.len()
            )));
        }
        if header.tsize as usize != header.lexsize as usize * Token::STORAGE_SIZE {
            return Err(broken(format!(
                "token table of {} bytes can't hold {} tokens",
                header.tsize, header.lexsize
            )));
        }
        if header.dsize as usize % Trie::UNIT_SIZE != 0 {
            return Err(broken(format!("double array size {} is unaligned", header.dsize)));
        }

        let trie = Header::STORAGE_SIZE..Header::STORAGE_SIZE + header.dsize as usize;
        let tokens = trie.end..trie.end + header.tsize as usize;
        let features = tokens.end..tokens.end + header.fsize as usize;

        let pool = std::str::from_utf8(&bytes[features.clone()])
            .map_err(|e| broken(format!("feature pool is not UTF-8: {}", e)))?;
        let table = &bytes[tokens.clone()];
        for i in 0..header.lexsize as usize {
            let valid = Token::read(table, i)
                .map(|t| pool.get(t.feature_range()).is_some())
                .unwrap_or(false);
            if !valid {
                return Err(broken(format!("feature of token {} is out of the pool", i)));
            }
        }

        Ok(Lexicon {
            storage,
            header,
            path,
            dic_id: 0,
            trie,
            tokens,
            features,
        })
    }

    /// Assign lexicon id to the current Lexicon
    pub fn set_dic_id(&mut self, id: u8) {
        assert!(id < MAX_DICTIONARIES as u8);
        self.dic_id = id
    }

    pub fn dic_id(&self) -> u8 {
        self.dic_id
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of tokens
    pub fn size(&self) -> u32 {
        self.header.lexsize
    }

    /// Returns an iterator of word_id and end of words that matches given input
    ///
    /// Shorter matches come first, homographs keep their order in the source lexicon.
    pub fn lookup<'a>(
        &'a self,
        input: &'a [u8],
        offset: usize,
    ) -> impl Iterator<Item = LexiconEntry> + 'a {
        let dic_id = self.dic_id;
        Trie::new(&self.storage.as_ref()[self.trie.clone()])
            .common_prefix_iterator(input, offset)
            .flat_map(move |e| {
                let first = e.value >> 8;
                let count = e.value & 0xff;
                (first..first + count).map(move |i| LexiconEntry {
                    word_id: WordId::new(dic_id, i),
                    end: e.end,
                })
            })
    }

    /// Returns the token for given word index
    pub fn token(&self, word: u32) -> Option<Token> {
        Token::read(&self.storage.as_ref()[self.tokens.clone()], word as usize)
    }

    /// Returns the feature string of a token of this lexicon
    pub fn feature(&self, token: &Token) -> &str {
        self.feature_pool().get(token.feature_range()).unwrap_or("")
    }

    fn feature_pool(&self) -> &str {
        let bytes = &self.storage.as_ref()[self.features.clone()];
        // validated in from_storage
        unsafe { std::str::from_utf8_unchecked(bytes) }
    }

    /// Checks that all tokens can be used with a matrix of the given size
    pub fn check_context_ids(
        &self,
        num_left: usize,
        num_right: usize,
    ) -> Result<(), DictionaryLoadError> {
        if self.header.lsize as usize != num_left || self.header.rsize as usize != num_right {
            return Err(DictionaryLoadError::IncompatibleMatrix {
                path: self.path.clone(),
                matrix_left: num_left,
                matrix_right: num_right,
                dic_left: self.header.lsize as usize,
                dic_right: self.header.rsize as usize,
            });
        }
        for i in 0..self.size() {
            if let Some(t) = self.token(i) {
                if t.right_id as usize >= num_left {
                    return Err(DictionaryLoadError::InvalidContextId(
                        self.path.clone(),
                        t.right_id as usize,
                        i as usize,
                    ));
                }
                if t.left_id as usize >= num_right {
                    return Err(DictionaryLoadError::InvalidContextId(
                        self.path.clone(),
                        t.left_id as usize,
                        i as usize,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Metadata record of this dictionary
    pub fn info(&self) -> DictionaryInfo {
        DictionaryInfo {
            filename: self.path.clone(),
            charset: self.header.charset.clone(),
            size: self.header.lexsize,
            dic_type: self.header.dic_type,
            lsize: self.header.lsize,
            rsize: self.header.rsize,
            version: self.header.version,
        }
    }
}
