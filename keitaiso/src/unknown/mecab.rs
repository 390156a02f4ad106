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

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::dic::build::lexicon::LexiconReader;
use crate::dic::category_type::CategoryType;
use crate::dic::character_category::{CharacterCategory, Error as CharacterCategoryError};
use crate::dic::word_id::WordId;
use crate::error::{DictionaryLoadError, KeitaisoError, KeitaisoResult};
use crate::unknown::{UnknownNode, UnknownWordProvider, DEFAULT_MAX_GROUPING_SIZE};

/// The character category definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CategoryInfo {
    is_invoke: bool,
    is_group: bool,
    length: usize,
}

/// The unknown word definition
#[derive(Debug, Clone)]
struct UnknownEntry {
    left_id: u16,
    right_id: u16,
    cost: i16,
    feature: String,
}

/// Provides unknown nodes as driven by `char.def` and `unk.def`
///
/// For each category of the character at the offset, a node covering the whole
/// run of characters of that category is generated if the category is a grouping one,
/// and nodes of `1..=length` characters are generated in addition.
/// Categories which are not `invoke` are only used when no dictionary word starts there.
#[derive(Debug)]
pub struct MeCabUnknown {
    chars: CharacterCategory,
    categories: HashMap<CategoryType, CategoryInfo>,
    // indices into entries
    lists: HashMap<CategoryType, Vec<usize>>,
    entries: Vec<UnknownEntry>,
    max_grouping_size: usize,
    path: PathBuf,
}

impl MeCabUnknown {
    /// Loads character definition and unknown word definition files
    pub fn load<P1: AsRef<Path>, P2: AsRef<Path>>(
        char_def: P1,
        unk_def: P2,
    ) -> Result<MeCabUnknown, DictionaryLoadError> {
        let char_def = char_def.as_ref();
        let unk_def = unk_def.as_ref();
        let char_err = |e| DictionaryLoadError::InvalidCharDef(char_def.to_path_buf(), e);

        let chars = CharacterCategory::from_file(char_def).map_err(char_err)?;
        let file = fs::File::open(char_def).map_err(|e| char_err(CharacterCategoryError::Io(e)))?;
        let categories = read_category_definition(BufReader::new(file)).map_err(char_err)?;

        if !unk_def.is_file() {
            return Err(DictionaryLoadError::NotFound(unk_def.to_path_buf()));
        }
        let data = fs::read(unk_def).map_err(|cause| DictionaryLoadError::Io {
            cause,
            path: unk_def.to_path_buf(),
        })?;
        Self::from_parts(chars, categories, &data, unk_def.to_path_buf())
    }

    /// Creates the provider from in-memory definitions
    pub fn from_bytes(
        char_def: &[u8],
        unk_def: &[u8],
    ) -> Result<MeCabUnknown, DictionaryLoadError> {
        let path = PathBuf::from("<memory>");
        let char_err = |e| DictionaryLoadError::InvalidCharDef(path.clone(), e);
        let chars = CharacterCategory::from_reader(char_def).map_err(char_err)?;
        let categories = read_category_definition(char_def).map_err(char_err)?;
        Self::from_parts(chars, categories, unk_def, path)
    }

    fn from_parts(
        chars: CharacterCategory,
        categories: HashMap<CategoryType, CategoryInfo>,
        unk_def: &[u8],
        path: PathBuf,
    ) -> Result<MeCabUnknown, DictionaryLoadError> {
        let mut reader = LexiconReader::new();
        reader.read_bytes(unk_def).map_err(|e| match e {
            KeitaisoError::DictionaryCompilationError(e) => {
                DictionaryLoadError::InvalidUnkDef(path.clone(), e.line, e.cause.to_string())
            }
            e => DictionaryLoadError::InvalidUnkDef(path.clone(), 0, e.to_string()),
        })?;

        let mut lists: HashMap<CategoryType, Vec<usize>> = HashMap::new();
        let mut entries = Vec::with_capacity(reader.entries().len());
        for raw in reader.entries() {
            let ctype: CategoryType = raw.surface().parse().map_err(|_| {
                DictionaryLoadError::InvalidUnkDef(
                    path.clone(),
                    raw.line,
                    format!("invalid category type {}", raw.surface()),
                )
            })?;
            if !categories.contains_key(&ctype) {
                return Err(DictionaryLoadError::InvalidUnkDef(
                    path,
                    raw.line,
                    format!("{} is undefined in char definition", raw.surface()),
                ));
            }
            lists.entry(ctype).or_default().push(entries.len());
            entries.push(UnknownEntry {
                left_id: raw.left_id,
                right_id: raw.right_id,
                cost: raw.cost,
                feature: raw.feature.clone(),
            });
        }

        if lists.get(&CategoryType::DEFAULT).map_or(true, |l| l.is_empty()) {
            return Err(DictionaryLoadError::InvalidUnkDef(
                path,
                0,
                "DEFAULT category must have at least one entry".to_owned(),
            ));
        }

        Ok(MeCabUnknown {
            chars,
            categories,
            lists,
            entries,
            max_grouping_size: DEFAULT_MAX_GROUPING_SIZE,
            path,
        })
    }

    /// Sets the maximum number of characters of a grouped unknown word
    pub fn set_max_grouping_size(&mut self, size: usize) {
        self.max_grouping_size = size;
    }

    pub fn max_grouping_size(&self) -> usize {
        self.max_grouping_size
    }

    /// Character categories as defined in char.def
    pub fn character_category(&self) -> &CharacterCategory {
        &self.chars
    }

    fn push_nodes<'a>(
        &'a self,
        ctype: CategoryType,
        end: usize,
        result: &mut Vec<UnknownNode<'a>>,
    ) {
        if let Some(list) = self.lists.get(&ctype) {
            for &idx in list {
                let e = &self.entries[idx];
                result.push(UnknownNode {
                    end,
                    left_id: e.left_id,
                    right_id: e.right_id,
                    cost: e.cost,
                    feature: &e.feature,
                    char_type: ctype,
                    word_id: WordId::unknown(idx as u32),
                });
            }
        }
    }
}

impl UnknownWordProvider for MeCabUnknown {
    fn provide<'a>(
        &'a self,
        sentence: &str,
        offset: usize,
        has_dictionary_match: bool,
        result: &mut Vec<UnknownNode<'a>>,
    ) -> KeitaisoResult<usize> {
        let start = result.len();
        let rest = &sentence[offset..];
        let first = match rest.chars().next() {
            Some(c) => c,
            None => return Ok(0),
        };

        let mut ends: Vec<usize> = Vec::new();
        for ctype in self.chars.get_category_types(first).iter() {
            let cinfo = match self.categories.get(&ctype) {
                Some(ci) => ci,
                None => continue,
            };
            if !cinfo.is_invoke && has_dictionary_match {
                continue;
            }

            // ends of the first characters of the run, one past the grouping limit at most
            let limit = self.max_grouping_size.max(cinfo.length).saturating_add(1);
            ends.clear();
            for (i, c) in rest.char_indices() {
                if ends.len() >= limit || !self.chars.get_category_types(c).contains(ctype) {
                    break;
                }
                ends.push(offset + i + c.len_utf8());
            }

            let mut group_end = None;
            if cinfo.is_group && ends.len() <= self.max_grouping_size {
                if let Some(&end) = ends.last() {
                    self.push_nodes(ctype, end, result);
                    group_end = Some(end);
                }
            }

            for &end in ends.iter().take(cinfo.length) {
                if Some(end) != group_end {
                    self.push_nodes(ctype, end, result);
                }
            }
        }

        if result.len() == start && !has_dictionary_match {
            self.push_nodes(CategoryType::DEFAULT, offset + first.len_utf8(), result);
        }

        Ok(result.len() - start)
    }

    fn check_context_ids(
        &self,
        num_left: usize,
        num_right: usize,
    ) -> Result<(), DictionaryLoadError> {
        for (i, e) in self.entries.iter().enumerate() {
            if e.right_id as usize >= num_left {
                return Err(DictionaryLoadError::InvalidContextId(
                    self.path.clone(),
                    e.right_id as usize,
                    i,
                ));
            }
            if e.left_id as usize >= num_right {
                return Err(DictionaryLoadError::InvalidContextId(
                    self.path.clone(),
                    e.left_id as usize,
                    i,
                ));
            }
        }
        Ok(())
    }

    fn feature(&self, word: WordId) -> Option<&str> {
        if !word.is_unknown() {
            return None;
        }
        self.entries
            .get(word.word() as usize)
            .map(|e| e.feature.as_str())
    }
}

/// Loads category definition lines `NAME invoke group length` of char.def
///
/// Code point lines and comments are skipped.
fn read_category_definition<T: BufRead>(
    reader: T,
) -> Result<HashMap<CategoryType, CategoryInfo>, CharacterCategoryError> {
    let mut categories = HashMap::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = match line.find('#') {
            Some(idx) => &line[..idx],
            None => &line,
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with("0x") {
            continue;
        }

        let cols: Vec<_> = line.split_whitespace().collect();
        if cols.len() < 4 {
            return Err(CharacterCategoryError::InvalidFormat(i));
        }
        let category_type: CategoryType = cols[0]
            .parse()
            .map_err(|_| CharacterCategoryError::InvalidCategoryType(i, cols[0].to_string()))?;
        if categories.contains_key(&category_type) {
            return Err(CharacterCategoryError::MultipleTypeDefinition(
                i,
                cols[0].to_string(),
            ));
        }

        let flag = |s: &str| match s {
            "0" => Ok(false),
            "1" => Ok(true),
            _ => Err(CharacterCategoryError::InvalidFormat(i)),
        };
        categories.insert(
            category_type,
            CategoryInfo {
                is_invoke: flag(cols[1])?,
                is_group: flag(cols[2])?,
                length: cols[3]
                    .parse()
                    .map_err(|_| CharacterCategoryError::InvalidFormat(i))?,
            },
        );
    }

    Ok(categories)
}

#[cfg(test)]
mod test {
    use super::*;
    use claim::{assert_matches, assert_ok};

    const CHAR_DEF: &[u8] = b"\
DEFAULT 0 1 0
SPACE 0 1 0
NUMERIC 1 1 0
ALPHA 1 1 0
KANJI 0 0 2
KATAKANA 1 1 2
0x0020 SPACE
0x0030..0x0039 NUMERIC
0x0041..0x005A ALPHA
0x0061..0x007A ALPHA
0x4E00..0x9FFF KANJI
0x30A1..0x30FF KATAKANA
";

    const UNK_DEF: &[u8] = b"\
DEFAULT,0,0,1000,unk,default
SPACE,0,0,500,unk,space
NUMERIC,1,1,800,unk,numeric
ALPHA,1,1,800,unk,alpha
ALPHA,2,2,900,unk,alpha2
KANJI,2,2,700,unk,kanji
KATAKANA,2,2,600,unk,katakana
";

    fn provider() -> MeCabUnknown {
        MeCabUnknown::from_bytes(CHAR_DEF, UNK_DEF).unwrap()
    }

    fn ends(unk: &MeCabUnknown, text: &str, offset: usize, has_dic: bool) -> Vec<(usize, String)> {
        let mut result = Vec::new();
        unk.provide(text, offset, has_dic, &mut result).unwrap();
        result
            .into_iter()
            .map(|n| (n.end, n.feature.to_owned()))
            .collect()
    }

    #[test]
    fn groups_runs() {
        let unk = provider();
        let nodes = ends(&unk, "123abc", 0, false);
        assert_eq!(nodes, vec![(3, "unk,numeric".to_owned())]);
        let nodes = ends(&unk, "123abc", 3, false);
        assert_eq!(
            nodes,
            vec![(6, "unk,alpha".to_owned()), (6, "unk,alpha2".to_owned())]
        );
    }

    #[test]
    fn lengths_without_group() {
        let unk = provider();
        // 漢字語, KANJI has no grouping, lengths 1 and 2
        let nodes = ends(&unk, "漢字語", 0, false);
        assert_eq!(
            nodes,
            vec![(3, "unk,kanji".to_owned()), (6, "unk,kanji".to_owned())]
        );
    }

    #[test]
    fn group_and_lengths_are_not_duplicated() {
        let unk = provider();
        let nodes = ends(&unk, "カタ", 0, false);
        // group covers both characters, length 2 equals the group and is skipped
        assert_eq!(
            nodes,
            vec![(6, "unk,katakana".to_owned()), (3, "unk,katakana".to_owned())]
        );
    }

    #[test]
    fn invoke_is_respected() {
        let unk = provider();
        assert!(ends(&unk, "漢字", 0, true).is_empty());
        assert_eq!(ends(&unk, "12", 0, true).len(), 1);
    }

    #[test]
    fn default_fallback() {
        let unk = provider();
        let nodes = ends(&unk, "ひら", 0, false);
        assert_eq!(nodes, vec![(6, "unk,default".to_owned())]);
        let nodes = ends(&unk, "@", 0, false);
        assert_eq!(nodes, vec![(1, "unk,default".to_owned())]);
    }

    #[test]
    fn grouping_is_capped() {
        let mut unk = provider();
        unk.set_max_grouping_size(3);
        let nodes = ends(&unk, "1234", 0, false);
        // run is longer than the cap, so no group node, NUMERIC has no lengths
        assert_eq!(nodes, vec![(1, "unk,default".to_owned())]);
        let nodes = ends(&unk, "123", 0, false);
        assert_eq!(nodes, vec![(3, "unk,numeric".to_owned())]);
    }

    #[test]
    fn unlimited_grouping() {
        let mut unk = provider();
        unk.set_max_grouping_size(usize::MAX);
        let nodes = ends(&unk, "1234", 0, false);
        assert_eq!(nodes, vec![(4, "unk,numeric".to_owned())]);
    }

    #[test]
    fn context_ids() {
        let unk = provider();
        assert_ok!(unk.check_context_ids(3, 3));
        assert_matches!(
            unk.check_context_ids(2, 3),
            Err(DictionaryLoadError::InvalidContextId(_, 2, _))
        );
    }

    #[test]
    fn undefined_category_in_unk_def() {
        let res = MeCabUnknown::from_bytes(CHAR_DEF, b"DEFAULT,0,0,1,x\nGREEK,0,0,1,x\n");
        assert_matches!(res, Err(DictionaryLoadError::InvalidUnkDef(_, 2, _)));
    }

    #[test]
    fn default_is_required() {
        let res = MeCabUnknown::from_bytes(CHAR_DEF, b"SPACE,0,0,1,x\n");
        assert_matches!(res, Err(DictionaryLoadError::InvalidUnkDef(_, 0, _)));
    }

    #[test]
    fn duplicate_category() {
        let res = MeCabUnknown::from_bytes(b"DEFAULT 0 1 0\nDEFAULT 1 1 0\n", b"DEFAULT,0,0,1,x\n");
        assert_matches!(
            res,
            Err(DictionaryLoadError::InvalidCharDef(
                _,
                CharacterCategoryError::MultipleTypeDefinition(1, _)
            ))
        );
    }
}
