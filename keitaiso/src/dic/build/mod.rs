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

use std::io::Write;
use std::path::Path;

use crate::dic::build::error::{BuildFailure, DicCompilationCtx};
use crate::dic::build::index::IndexBuilder;
use crate::dic::build::lexicon::LexiconWriter;
use crate::dic::build::report::{DictPartReport, Reporter, StepTimer};
use crate::dic::header::{DictionaryType, Header};
use crate::dic::lexicon::token::Token;
use crate::error::KeitaisoResult;

pub(crate) mod conn;
pub mod error;
pub(crate) mod index;
pub(crate) mod lexicon;
pub(crate) mod parse;
pub mod report;
#[cfg(test)]
mod test;

/// Input of the builder, a file or a buffer already in memory
pub enum DataSource<'a> {
    File(&'a Path),
    Data(&'a [u8]),
}

impl DataSource<'_> {
    /// Name of the source used in build reports
    pub fn name(&self) -> String {
        match self {
            DataSource::File(p) => p.display().to_string(),
            DataSource::Data(d) => format!("<memory: {} bytes>", d.len()),
        }
    }
}

pub trait AsDataSource<'a> {
    fn convert(self) -> DataSource<'a>;
}

impl<'a> AsDataSource<'a> for DataSource<'a> {
    fn convert(self) -> DataSource<'a> {
        self
    }
}

impl<'a> AsDataSource<'a> for &'a Path {
    fn convert(self) -> DataSource<'a> {
        DataSource::File(self)
    }
}

impl<'a> AsDataSource<'a> for &'a [u8] {
    fn convert(self) -> DataSource<'a> {
        DataSource::Data(self)
    }
}

impl<'a, const N: usize> AsDataSource<'a> for &'a [u8; N] {
    fn convert(self) -> DataSource<'a> {
        DataSource::Data(self)
    }
}

/// Builds a binary dictionary from csv lexicon and connection matrix
///
/// User dictionaries usually get only the matrix size through
/// [`DictBuilder::set_matrix_size`] instead of the whole matrix.
pub struct DictBuilder {
    lexicon: lexicon::LexiconReader,
    conn: conn::ConnBuffer,
    header: Header,
    reporter: Reporter,
}

impl DictBuilder {
    fn new_empty(dic_type: DictionaryType) -> Self {
        Self {
            lexicon: lexicon::LexiconReader::new(),
            conn: conn::ConnBuffer::new(),
            header: Header::new(dic_type),
            reporter: Reporter::new(),
        }
    }

    /// Creates a new builder for system dictionary
    pub fn new_system() -> Self {
        Self::new_empty(DictionaryType::System)
    }

    /// Creates a new builder for user dictionary
    pub fn new_user() -> Self {
        Self::new_empty(DictionaryType::User)
    }

    pub fn set_type(&mut self, dic_type: DictionaryType) {
        self.header.dic_type = dic_type;
    }

    pub fn set_charset<T: Into<String>>(&mut self, charset: T) {
        self.header.charset = charset.into();
    }

    /// Declares the matrix dimensions without reading the matrix itself
    pub fn set_matrix_size(&mut self, num_left: u16, num_right: u16) {
        self.header.lsize = num_left as u32;
        self.header.rsize = num_right as u32;
        self.lexicon.set_max_conn_sizes(num_left, num_right);
    }

    /// Read the csv lexicon from either a file or an in-memory buffer
    pub fn read_lexicon<'a, T: AsDataSource<'a> + 'a>(&mut self, data: T) -> KeitaisoResult<usize> {
        let data = data.convert();
        let report = StepTimer::reading(data.name());
        let result = match data {
            DataSource::File(p) => self.lexicon.read_file(p),
            DataSource::Data(d) => self.lexicon.read_bytes(d),
        };
        self.reporter.record_ok(result, report)
    }

    /// Read the connection matrix from either a file or an in-memory buffer
    pub fn read_conn<'a, T: AsDataSource<'a> + 'a>(&mut self, data: T) -> KeitaisoResult<()> {
        let data = data.convert();
        let report = StepTimer::reading(data.name());
        match data {
            DataSource::File(p) => self.conn.read_file(p),
            DataSource::Data(d) => self.conn.read(d),
        }?;
        self.set_matrix_size(self.conn.left(), self.conn.right());
        self.reporter.record(
            self.conn.left() as usize * self.conn.right() as usize,
            report,
        );
        Ok(())
    }

    /// Writes the connection matrix read by [`DictBuilder::read_conn`] in the binary form
    pub fn write_matrix<W: Write>(&mut self, w: &mut W) -> KeitaisoResult<usize> {
        if !self.conn.is_defined() {
            return DicCompilationCtx::memory().err(BuildFailure::MissingMatrix);
        }
        let report = StepTimer::writing("matrix");
        let size = self.conn.write_to(w)?;
        self.reporter.record(size, report);
        Ok(size)
    }

    /// Compile the binary dictionary and write it to the specified sink
    pub fn compile<W: Write>(&mut self, w: &mut W) -> KeitaisoResult<()> {
        if self.header.lsize == 0 || self.header.rsize == 0 {
            return DicCompilationCtx::memory().err(BuildFailure::MissingMatrix);
        }
        let report = StepTimer::reading("validate");
        self.lexicon.validate_entries()?;
        let entries = self.lexicon.entries();
        self.reporter.record(entries.len(), report);

        let report = StepTimer::writing("trie");
        let mut index = IndexBuilder::new();
        for (i, e) in entries.iter().enumerate() {
            index.add(e.surface(), i);
        }
        let index = DicCompilationCtx::memory().transform(index.build())?;
        self.reporter.record(index.trie.len(), report);

        let mut writer = LexiconWriter::new(entries, &index.order, &mut self.reporter);
        self.header.lexsize = index.order.len() as u32;
        self.header.dsize = index.trie.len() as u32;
        self.header.tsize = (index.order.len() * Token::STORAGE_SIZE) as u32;
        self.header.fsize = writer.feature_size() as u32;

        let mut written = self.header.write_to(w)?;
        w.write_all(&index.trie)?;
        written += index.trie.len();
        written += writer.write(w)?;

        tracing::debug!(
            "compiled {} dictionary: {} tokens, {} bytes",
            self.header.dic_type.name(),
            self.header.lexsize,
            written
        );
        Ok(())
    }

    /// Return dictionary build report
    pub fn report(&self) -> &[DictPartReport] {
        self.reporter.reports()
    }
}
