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

use std::fmt::{Debug, Display, Formatter};

use crate::dic::lexicon_set::LexiconSetError;

const WORD_MASK: u32 = 0x0fff_ffff;
const UNKNOWN_DIC: u8 = 0xf;

/// Identifies the dictionary entry behind a lattice node
///
/// The upper 4 bits select the dictionary, the lower 28 bits the token index in it.
/// Dictionary 0 is the system dictionary, 1..=14 are user dictionaries in load order
/// and 15 is the unknown word table, which also hosts the sentinels.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct WordId {
    raw: u32,
}

impl WordId {
    pub const BOS: WordId = WordId::from_raw(0xffff_fffe);
    pub const EOS: WordId = WordId::from_raw(0xffff_fffd);
    /// Nodes created for feature constraints which no entry could satisfy
    pub const CONSTRAINED: WordId = WordId::from_raw(0xffff_fffc);

    pub const fn from_raw(raw: u32) -> WordId {
        WordId { raw }
    }

    pub fn new(dic: u8, word: u32) -> WordId {
        debug_assert_eq!(word & !WORD_MASK, 0);
        debug_assert_eq!(dic & !0xf, 0);
        Self::from_raw((((dic & 0xf) as u32) << 28) | (word & WORD_MASK))
    }

    /// Creates the WordId with range checking of both parts
    pub fn checked(dic: u8, word: u32) -> Result<WordId, LexiconSetError> {
        if dic & !0xf != 0 {
            return Err(LexiconSetError::TooLargeDictionaryId(dic as usize));
        }
        if word & !WORD_MASK != 0 {
            return Err(LexiconSetError::TooLargeWordId(word, WORD_MASK as usize));
        }
        Ok(Self::new(dic, word))
    }

    /// Id of an unknown word produced from the unknown entry `index`
    pub fn unknown(index: u32) -> WordId {
        Self::new(UNKNOWN_DIC, index)
    }

    pub fn dic(self) -> u8 {
        (self.raw >> 28) as u8
    }

    pub fn word(self) -> u32 {
        self.raw & WORD_MASK
    }

    pub fn as_raw(self) -> u32 {
        self.raw
    }

    pub fn is_system(self) -> bool {
        self.dic() == 0
    }

    pub fn is_user(self) -> bool {
        !matches!(self.dic(), 0 | UNKNOWN_DIC)
    }

    /// Unknown words and sentinels
    pub fn is_unknown(self) -> bool {
        self.dic() == UNKNOWN_DIC
    }
}

impl Debug for WordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for WordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            WordId::BOS => write!(f, "BOS"),
            WordId::EOS => write!(f, "EOS"),
            id if id.is_unknown() => write!(f, "(unk, {})", id.word()),
            id => write!(f, "({}, {})", id.dic(), id.word()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use claim::assert_err;

    #[test]
    fn parts() {
        for (dic, word) in [(0, 0), (0, WORD_MASK), (14, 12), (15, 3121)] {
            let id = WordId::new(dic, word);
            assert_eq!(dic, id.dic());
            assert_eq!(word, id.word());
        }
    }

    #[test]
    fn checked() {
        assert_err!(WordId::checked(16, 0));
        assert_err!(WordId::checked(0, WORD_MASK + 1));
        assert_eq!(WordId::checked(3, 7).unwrap(), WordId::new(3, 7));
    }

    #[test]
    fn kinds() {
        assert!(WordId::new(0, 5).is_system());
        assert!(WordId::new(2, 5).is_user());
        assert!(!WordId::unknown(5).is_user());
        assert!(WordId::unknown(5).is_unknown());
        assert!(WordId::BOS.is_unknown());
    }

    #[test]
    fn display() {
        assert_eq!("(0, 521321)", format!("{}", WordId::new(0, 521321)));
        assert_eq!("(unk, 2)", format!("{:?}", WordId::unknown(2)));
        assert_eq!("EOS", format!("{}", WordId::EOS));
    }
}
