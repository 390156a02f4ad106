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

use thiserror::Error;

use crate::dic::header::DictionaryType;
use crate::dic::lexicon::token::Token;
use crate::dic::lexicon::{Lexicon, LexiconEntry, MAX_DICTIONARIES};
use crate::dic::word_id::WordId;
use crate::dic::DictionaryInfo;
use crate::error::DictionaryLoadError;

/// Lexicon stacking error
#[derive(Error, Debug, Eq, PartialEq, Clone)]
pub enum LexiconSetError {
    #[error("too large word_id {0} in dict {1}")]
    TooLargeWordId(u32, usize),

    #[error("too large dictionary_id {0}")]
    TooLargeDictionaryId(usize),

    #[error("too many user dictionaries")]
    TooManyDictionaries,
}

/// Set of Lexicons
///
/// Handles multiple lexicons as one lexicon
/// The first lexicon in the list must be from system dictionary
#[derive(Debug)]
pub struct LexiconSet {
    lexicons: Vec<Lexicon>,
}

fn check_type(lexicon: &Lexicon, expected: DictionaryType) -> Result<(), DictionaryLoadError> {
    let actual = lexicon.header().dic_type;
    if actual != expected {
        return Err(DictionaryLoadError::InvalidDictionaryType {
            path: lexicon.path().to_path_buf(),
            expected: expected.name(),
            actual: actual.name(),
        });
    }
    Ok(())
}

impl LexiconSet {
    /// Creates a LexiconSet given a lexicon
    ///
    /// The passed lexicon must be a system dictionary
    pub fn new(mut system_lexicon: Lexicon) -> Result<LexiconSet, DictionaryLoadError> {
        check_type(&system_lexicon, DictionaryType::System)?;
        system_lexicon.set_dic_id(0);
        Ok(LexiconSet {
            lexicons: vec![system_lexicon],
        })
    }

    /// Add a user lexicon to the lexicon list
    pub fn append(&mut self, mut lexicon: Lexicon) -> crate::error::KeitaisoResult<()> {
        check_type(&lexicon, DictionaryType::User)?;
        if self.is_full() {
            return Err(LexiconSetError::TooManyDictionaries.into());
        }
        lexicon.set_dic_id(self.lexicons.len() as u8);
        self.lexicons.push(lexicon);
        Ok(())
    }

    /// Returns if dictionary capacity is full
    pub fn is_full(&self) -> bool {
        self.lexicons.len() >= MAX_DICTIONARIES
    }

    /// Returns iterator which yields all words in the dictionary, starting from the `offset` bytes
    ///
    /// Searches dictionaries in the reverse order: user dictionaries first, system dictionary last
    #[inline]
    pub fn lookup<'b>(
        &'b self,
        input: &'b [u8],
        offset: usize,
    ) -> impl Iterator<Item = LexiconEntry> + 'b {
        self.lexicons
            .iter()
            .rev()
            .flat_map(move |l| l.lookup(input, offset))
    }

    fn lexicon(&self, id: WordId) -> Result<&Lexicon, LexiconSetError> {
        self.lexicons
            .get(id.dic() as usize)
            .ok_or(LexiconSetError::TooLargeDictionaryId(id.dic() as usize))
    }

    /// Returns the token and its feature for given WordId
    pub fn entry(&self, id: WordId) -> Result<(Token, &str), LexiconSetError> {
        let lex = self.lexicon(id)?;
        let token = lex
            .token(id.word())
            .ok_or(LexiconSetError::TooLargeWordId(id.word(), id.dic() as usize))?;
        Ok((token, lex.feature(&token)))
    }

    /// Checks every lexicon against the connection matrix dimensions
    pub fn check_context_ids(
        &self,
        num_left: usize,
        num_right: usize,
    ) -> Result<(), DictionaryLoadError> {
        self.lexicons
            .iter()
            .try_for_each(|l| l.check_context_ids(num_left, num_right))
    }

    /// Metadata of all lexicons, the system dictionary first
    pub fn infos(&self) -> Vec<DictionaryInfo> {
        self.lexicons.iter().map(|l| l.info()).collect()
    }

    pub fn len(&self) -> usize {
        self.lexicons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicons.is_empty()
    }

    /// Total number of tokens
    pub fn size(&self) -> u32 {
        self.lexicons.iter().fold(0, |acc, lex| acc + lex.size())
    }
}
