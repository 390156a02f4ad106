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

use crate::dic::category_type::CategoryType;
use crate::dic::word_id::WordId;
use crate::error::{DictionaryLoadError, KeitaisoResult};

pub mod mecab;
pub mod simple;

pub use mecab::MeCabUnknown;
pub use simple::SimpleUnknown;

/// Default cap on the number of characters an unknown word can group
pub const DEFAULT_MAX_GROUPING_SIZE: usize = 24;

/// Unknown word candidate
///
/// The feature is borrowed from the provider, which lives as long as the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNode<'a> {
    /// Byte index of the word end
    pub end: usize,
    pub left_id: u16,
    pub right_id: u16,
    pub cost: i16,
    pub feature: &'a str,
    /// Character category which produced this node
    pub char_type: CategoryType,
    pub word_id: WordId,
}

/// Generates fallback nodes for text which is not (or not only) covered by dictionaries
pub trait UnknownWordProvider: Send + Sync {
    /// Adds unknown word candidates starting at `offset` to `result`
    ///
    /// `offset` is a byte index and always lies on a character boundary of `sentence`.
    /// At least one node must be added when `has_dictionary_match` is false.
    /// Returns the number of added nodes.
    fn provide<'a>(
        &'a self,
        sentence: &str,
        offset: usize,
        has_dictionary_match: bool,
        result: &mut Vec<UnknownNode<'a>>,
    ) -> KeitaisoResult<usize>;

    /// Checks that generated nodes can be connected with a matrix of the given size
    fn check_context_ids(
        &self,
        num_left: usize,
        num_right: usize,
    ) -> Result<(), DictionaryLoadError>;

    /// Feature of the unknown entry `word`, as given in [`UnknownNode::word_id`]
    fn feature(&self, word: WordId) -> Option<&str>;
}
