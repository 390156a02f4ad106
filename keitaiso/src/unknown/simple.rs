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

use serde::Deserialize;
use std::path::PathBuf;

use crate::dic::category_type::CategoryType;
use crate::dic::word_id::WordId;
use crate::error::{DictionaryLoadError, KeitaisoResult};
use crate::unknown::{UnknownNode, UnknownWordProvider};

/// Provides an unknown node with single character if no words found in the dictionary
#[derive(Debug, Clone, Default)]
pub struct SimpleUnknown {
    left_id: u16,
    right_id: u16,
    cost: i16,
    feature: String,
}

/// Struct corresponds with the `simpleUnknown` section of the config file.
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SimpleUnknownSettings {
    pub leftId: u16,
    pub rightId: u16,
    pub cost: i16,
    pub feature: String,
}

impl Default for SimpleUnknownSettings {
    fn default() -> Self {
        Self {
            leftId: 0,
            rightId: 0,
            cost: 10000,
            feature: String::from("*"),
        }
    }
}

impl SimpleUnknown {
    pub fn new<S: Into<String>>(left_id: u16, right_id: u16, cost: i16, feature: S) -> Self {
        Self {
            left_id,
            right_id,
            cost,
            feature: feature.into(),
        }
    }

    pub fn from_settings(settings: &SimpleUnknownSettings) -> Self {
        Self::new(
            settings.leftId,
            settings.rightId,
            settings.cost,
            settings.feature.clone(),
        )
    }
}

impl UnknownWordProvider for SimpleUnknown {
    fn provide<'a>(
        &'a self,
        sentence: &str,
        offset: usize,
        has_dictionary_match: bool,
        result: &mut Vec<UnknownNode<'a>>,
    ) -> KeitaisoResult<usize> {
        if has_dictionary_match {
            return Ok(0);
        }

        let length = match sentence[offset..].chars().next() {
            Some(c) => c.len_utf8(),
            None => return Ok(0),
        };

        result.push(UnknownNode {
            end: offset + length,
            left_id: self.left_id,
            right_id: self.right_id,
            cost: self.cost,
            feature: &self.feature,
            char_type: CategoryType::DEFAULT,
            word_id: WordId::unknown(0),
        });
        Ok(1)
    }

    fn check_context_ids(
        &self,
        num_left: usize,
        num_right: usize,
    ) -> Result<(), DictionaryLoadError> {
        let path = PathBuf::from("<simple unknown>");
        if self.right_id as usize >= num_left {
            return Err(DictionaryLoadError::InvalidContextId(path, self.right_id as usize, 0));
        }
        if self.left_id as usize >= num_right {
            return Err(DictionaryLoadError::InvalidContextId(path, self.left_id as usize, 0));
        }
        Ok(())
    }

    fn feature(&self, word: WordId) -> Option<&str> {
        if word == WordId::unknown(0) {
            Some(&self.feature)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use claim::{assert_matches, assert_ok};

    #[test]
    fn single_character() {
        let unk = SimpleUnknown::new(1, 2, 300, "記号");
        let mut result = Vec::new();
        assert_matches!(unk.provide("あいう", 3, false, &mut result), Ok(1));
        assert_eq!(result[0].end, 6);
        assert_eq!(result[0].feature, "記号");
        assert_eq!(result[0].cost, 300);
    }

    #[test]
    fn nothing_with_dictionary_words() {
        let unk = SimpleUnknown::new(1, 2, 300, "記号");
        let mut result = Vec::new();
        assert_matches!(unk.provide("abc", 0, true, &mut result), Ok(0));
        assert!(result.is_empty());
    }

    #[test]
    fn context_ids() {
        let unk = SimpleUnknown::new(1, 2, 300, "記号");
        assert_ok!(unk.check_context_ids(3, 2));
        assert_matches!(
            unk.check_context_ids(2, 2),
            Err(DictionaryLoadError::InvalidContextId(_, 2, 0))
        );
    }
}
