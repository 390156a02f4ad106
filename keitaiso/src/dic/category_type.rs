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

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::KeitaisoError;

bitflags! {
    /// Character categories of `char.def`
    ///
    /// A character may belong to several categories at once,
    /// an unknown word node carries exactly one.
    #[derive(Default)]
    pub struct CategoryType: u32 {
        /// Characters not covered by any range
        const DEFAULT = 1;
        const SPACE = 1 << 1;
        const KANJI = 1 << 2;
        const SYMBOL = 1 << 3;
        const NUMERIC = 1 << 4;
        const ALPHA = 1 << 5;
        const HIRAGANA = 1 << 6;
        const KATAKANA = 1 << 7;
        const KANJINUMERIC = 1 << 8;
        const GREEK = 1 << 9;
        const CYRILLIC = 1 << 10;
        const USER1 = 1 << 11;
        const USER2 = 1 << 12;
        const USER3 = 1 << 13;
        const USER4 = 1 << 14;
    }
}

/// Single categories in bit order
const SINGLE: [(CategoryType, &str); 15] = [
    (CategoryType::DEFAULT, "DEFAULT"),
    (CategoryType::SPACE, "SPACE"),
    (CategoryType::KANJI, "KANJI"),
    (CategoryType::SYMBOL, "SYMBOL"),
    (CategoryType::NUMERIC, "NUMERIC"),
    (CategoryType::ALPHA, "ALPHA"),
    (CategoryType::HIRAGANA, "HIRAGANA"),
    (CategoryType::KATAKANA, "KATAKANA"),
    (CategoryType::KANJINUMERIC, "KANJINUMERIC"),
    (CategoryType::GREEK, "GREEK"),
    (CategoryType::CYRILLIC, "CYRILLIC"),
    (CategoryType::USER1, "USER1"),
    (CategoryType::USER2, "USER2"),
    (CategoryType::USER3, "USER3"),
    (CategoryType::USER4, "USER4"),
];

impl CategoryType {
    pub fn count(self) -> u32 {
        self.bits().count_ones()
    }

    /// Single categories of the set, lowest bit first
    pub fn iter(self) -> impl Iterator<Item = CategoryType> {
        SINGLE
            .iter()
            .map(|&(cat, _)| cat)
            .filter(move |&cat| self.contains(cat))
    }

    /// `char.def` name of a single category
    pub fn name(self) -> Option<&'static str> {
        SINGLE
            .iter()
            .find(|&&(cat, _)| cat == self)
            .map(|&(_, name)| name)
    }
}

impl FromStr for CategoryType {
    type Err = KeitaisoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match SINGLE.iter().find(|&&(_, name)| name == s) {
            Some(&(cat, _)) => Ok(cat),
            None => Err(KeitaisoError::InvalidCharacterCategoryType(s.to_owned())),
        }
    }
}

impl Display for CategoryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, cat) in self.iter().enumerate() {
            if i != 0 {
                f.write_str("|")?;
            }
            f.write_str(cat.name().unwrap_or("?"))?;
        }
        Ok(())
    }
}
