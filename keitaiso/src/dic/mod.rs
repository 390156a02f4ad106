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
use std::iter::FusedIterator;
use std::path::PathBuf;

use header::DictionaryType;

pub mod build;
pub mod category_type;
pub mod character_category;
pub mod connect;
pub mod header;
pub mod lexicon;
pub mod lexicon_set;
pub mod storage;
pub mod word_id;

/// Metadata of a loaded dictionary file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryInfo {
    pub filename: PathBuf,
    pub charset: String,
    /// Number of entries
    pub size: u32,
    pub dic_type: DictionaryType,
    /// Left context size of the matrix the dictionary was compiled with
    pub lsize: u32,
    /// Right context size of the matrix the dictionary was compiled with
    pub rsize: u32,
    pub version: u32,
}

impl Display for DictionaryInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            concat!(
                "filename:\t{}\nversion:\t{}\ncharset:\t{}\ntype:\t{}\n",
                "size:\t{}\nleft size:\t{}\nright size:\t{}\n"
            ),
            self.filename.display(),
            self.version,
            self.charset,
            self.dic_type.to_u32(),
            self.size,
            self.lsize,
            self.rsize
        )
    }
}

/// Iterator over the dictionaries of a model in load order
///
/// The system dictionary comes first, then the user dictionaries.
#[derive(Clone)]
pub struct DictionaryInfoIter<'a> {
    inner: std::slice::Iter<'a, DictionaryInfo>,
}

impl<'a> DictionaryInfoIter<'a> {
    pub(crate) fn new(infos: &'a [DictionaryInfo]) -> Self {
        Self {
            inner: infos.iter(),
        }
    }
}

impl<'a> Iterator for DictionaryInfoIter<'a> {
    type Item = &'a DictionaryInfo;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for DictionaryInfoIter<'_> {}

impl FusedIterator for DictionaryInfoIter<'_> {}
