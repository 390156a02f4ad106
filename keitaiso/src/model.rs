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

use crate::analysis::{DictionaryAccess, Lattice};
use crate::config::{Config, UnknownPolicy};
use crate::dic::connect::ConnectionMatrix;
use crate::dic::lexicon::Lexicon;
use crate::dic::lexicon_set::LexiconSet;
use crate::dic::word_id::WordId;
use crate::dic::{DictionaryInfo, DictionaryInfoIter};
use crate::error::{KeitaisoError, KeitaisoResult};
use crate::output::Writer;
use crate::tagger::Tagger;
use crate::unknown::{MeCabUnknown, SimpleUnknown, UnknownWordProvider};

/// Dictionary entry matching a prefix of the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry<'a> {
    pub word_id: WordId,
    pub surface: &'a str,
    pub left_id: u16,
    pub right_id: u16,
    pub cost: i16,
    pub feature: &'a str,
}

/// Dictionaries, connection matrix and unknown word policy shared by taggers
///
/// A model is immutable after loading and can be shared between threads,
/// either by reference or in an `Arc`.
pub struct Model {
    config: Config,
    lexicons: LexiconSet,
    matrix: ConnectionMatrix,
    unknown: Box<dyn UnknownWordProvider>,
    infos: Vec<DictionaryInfo>,
    writer: Writer,
}

impl Model {
    /// Loads a model given a whitespace separated option string
    pub fn new(args: &str) -> KeitaisoResult<Model> {
        let config = Config::from_args(args)?;
        Model::from_config(&config)
    }

    /// Loads the dictionaries, matrix and unknown word definitions of the config
    pub fn from_config(config: &Config) -> KeitaisoResult<Model> {
        let system = Lexicon::load(&config.system_dict)?;
        let mut lexicons = LexiconSet::new(system)?;
        for path in config.user_dicts.iter() {
            lexicons.append(Lexicon::load(path)?)?;
        }

        let matrix = ConnectionMatrix::from_file(&config.matrix)?;
        lexicons.check_context_ids(matrix.num_left(), matrix.num_right())?;

        let unknown: Box<dyn UnknownWordProvider> = match config.unknown_policy {
            UnknownPolicy::MeCab => {
                let mut unk = MeCabUnknown::load(
                    &config.character_definition_file,
                    &config.unknown_definition_file,
                )?;
                unk.set_max_grouping_size(config.max_grouping_size);
                Box::new(unk)
            }
            UnknownPolicy::Simple => Box::new(SimpleUnknown::from_settings(&config.simple_unknown)),
        };
        unknown.check_context_ids(matrix.num_left(), matrix.num_right())?;

        let writer = Writer::from_config(config)?;
        let infos = lexicons.infos();

        for info in infos.iter() {
            tracing::info!(
                "loaded {} dictionary {} with {} entries",
                info.dic_type.name(),
                info.filename.display(),
                info.size
            );
        }
        tracing::info!(
            "connection matrix {}: {}x{}, unknown word policy {:?}",
            config.matrix.display(),
            matrix.num_left(),
            matrix.num_right(),
            config.unknown_policy
        );

        Ok(Model {
            config: config.clone(),
            lexicons,
            matrix,
            unknown,
            infos,
            writer,
        })
    }

    /// Creates a tagger which borrows this model
    pub fn create_tagger(&self) -> Tagger<&Model> {
        Tagger::with_model(self)
    }

    /// Creates a lattice with the request type and theta of the model options
    pub fn create_lattice(&self) -> Lattice {
        let mut lattice = Lattice::new();
        lattice.set_request_type(self.config.request_type);
        lattice.set_theta(self.config.theta);
        lattice
    }

    /// Loaded dictionaries, the system dictionary first
    pub fn dictionary_info(&self) -> DictionaryInfoIter<'_> {
        DictionaryInfoIter::new(&self.infos)
    }

    /// Dictionary entries which match the text at `offset`
    ///
    /// User dictionaries are searched first, entries of a dictionary
    /// are ordered by length.
    pub fn lookup<'a>(
        &'a self,
        text: &'a str,
        offset: usize,
    ) -> KeitaisoResult<Vec<DictionaryEntry<'a>>> {
        if offset > text.len() || !text.is_char_boundary(offset) {
            return Err(KeitaisoError::InvalidRange(offset, text.len()));
        }
        self.lexicons
            .lookup(text.as_bytes(), offset)
            .map(|e| -> KeitaisoResult<DictionaryEntry<'a>> {
                let (token, feature) = self.lexicons.entry(e.word_id)?;
                Ok(DictionaryEntry {
                    word_id: e.word_id,
                    surface: &text[offset..e.end],
                    left_id: token.left_id,
                    right_id: token.right_id,
                    cost: token.cost,
                    feature,
                })
            })
            .collect()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn writer(&self) -> &Writer {
        &self.writer
    }

    /// Feature of a node, looked up from the dictionary which produced it
    pub fn feature(&self, word_id: WordId) -> Option<&str> {
        if word_id.is_unknown() {
            self.unknown.feature(word_id)
        } else {
            self.lexicons.entry(word_id).ok().map(|(_, f)| f)
        }
    }
}

impl DictionaryAccess for Model {
    fn lexicon(&self) -> &LexiconSet {
        &self.lexicons
    }

    fn connection(&self) -> &ConnectionMatrix {
        &self.matrix
    }

    fn unknown(&self) -> &dyn UnknownWordProvider {
        self.unknown.as_ref()
    }

    fn unknown_feature(&self) -> Option<&str> {
        self.config.unk_feature.as_deref()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn model_is_shareable() {
        assert_send_sync::<Model>();
    }
}
