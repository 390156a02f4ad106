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

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::{StringRecord, Trim};
use memmap2::Mmap;

use crate::dic::build::error::{BuildFailure, BuildResult, DicCompilationCtx};
use crate::dic::build::parse::{parse_i16, parse_u16};
use crate::dic::build::report::{Reporter, StepTimer};
use crate::dic::lexicon::token::Token;
use crate::error::KeitaisoResult;

/// A single row of a csv lexicon
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawLexiconEntry {
    pub surface: String,
    pub left_id: u16,
    pub right_id: u16,
    pub cost: i16,
    pub feature: String,
    pub line: usize,
}

impl RawLexiconEntry {
    pub fn surface(&self) -> &str {
        &self.surface
    }
}

/// Reads lexicon rows `surface,left_id,right_id,cost,feature...`
///
/// Everything after the cost is the feature, its columns are joined back with `,`.
pub struct LexiconReader {
    ctx: DicCompilationCtx,
    entries: Vec<RawLexiconEntry>,
    max_left: u16,
    max_right: u16,
}

impl LexiconReader {
    pub fn new() -> Self {
        Self {
            ctx: DicCompilationCtx::memory(),
            entries: Vec::new(),
            max_left: u16::MAX,
            max_right: u16::MAX,
        }
    }

    pub(crate) fn entries(&self) -> &[RawLexiconEntry] {
        &self.entries
    }

    /// Limits the context ids to a matrix of the given size
    pub fn set_max_conn_sizes(&mut self, left: u16, right: u16) {
        self.max_left = left;
        self.max_right = right;
    }

    pub fn read_file(&mut self, path: &Path) -> KeitaisoResult<usize> {
        let file = File::open(path)?;
        let map = unsafe { Mmap::map(&file) }?;
        let filename = path.to_str().unwrap_or("<invalid-utf8>").to_owned();
        let old_name = self.ctx.set_filename(filename);
        let res = self.read_bytes(&map);
        self.ctx.set_filename(old_name);
        res
    }

    pub fn read_bytes(&mut self, data: &[u8]) -> KeitaisoResult<usize> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::None)
            .flexible(true)
            .from_reader(data);
        let mut record = StringRecord::new();
        let mut nread = 0;
        while reader.read_record(&mut record).map_err(|e| {
            let line = e.position().map_or(0, |p| p.line());
            self.ctx.set_line(line as usize);
            self.ctx.to_keitaiso_err(BuildFailure::CsvError(e))
        })? {
            let line = record.position().map_or(0, |p| p.line()) as usize;
            self.ctx.set_line(line);
            if is_blank(&record) {
                continue;
            }
            let entry = self.ctx.transform(parse_record(&record, line))?;
            self.entries.push(entry);
            nread += 1;
        }
        Ok(nread)
    }

    /// Checks context ids of all entries against the matrix size
    pub fn validate_entries(&self) -> KeitaisoResult<()> {
        let mut ctx = DicCompilationCtx::default();
        ctx.set_filename("<entry id>".to_owned());
        for e in self.entries.iter() {
            ctx.set_line(e.line);
            // right id selects the row of the previous node, left id the column of the next one
            if e.right_id >= self.max_left {
                return ctx.err(BuildFailure::InvalidFieldSize {
                    actual: e.right_id as _,
                    expected: self.max_left as _,
                    field: "right_id",
                });
            }
            if e.left_id >= self.max_right {
                return ctx.err(BuildFailure::InvalidFieldSize {
                    actual: e.left_id as _,
                    expected: self.max_right as _,
                    field: "left_id",
                });
            }
        }
        Ok(())
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.len() == 1 && record.get(0).map_or(true, |s| s.trim().is_empty())
}

fn field<'a>(record: &'a StringRecord, idx: usize, name: &'static str) -> BuildResult<&'a str> {
    record.get(idx).ok_or_else(|| BuildFailure::SplitFormatError {
        field: name,
        original: record.iter().collect::<Vec<_>>().join(","),
    })
}

fn parse_record(record: &StringRecord, line: usize) -> BuildResult<RawLexiconEntry> {
    let surface = field(record, 0, "(0) surface")?;
    let left_id = parse_u16(field(record, 1, "(1) left_id")?)?;
    let right_id = parse_u16(field(record, 2, "(2) right_id")?)?;
    let cost = parse_i16(field(record, 3, "(3) cost")?)?;
    // feature may be absent, it is then empty
    let feature = record.iter().skip(4).collect::<Vec<_>>().join(",");

    if surface.is_empty() {
        return Err(BuildFailure::EmptySurface);
    }

    Ok(RawLexiconEntry {
        surface: surface.to_owned(),
        left_id,
        right_id,
        cost,
        feature,
        line,
    })
}

/// Writes the token table and the feature pool in the order given by the index
pub struct LexiconWriter<'a> {
    entries: &'a [RawLexiconEntry],
    order: &'a [usize],
    reporter: &'a mut Reporter,
}

impl<'a> LexiconWriter<'a> {
    pub(crate) fn new(
        entries: &'a [RawLexiconEntry],
        order: &'a [usize],
        reporter: &'a mut Reporter,
    ) -> Self {
        Self {
            entries,
            order,
            reporter,
        }
    }

    /// Size of the feature pool
    pub fn feature_size(&self) -> usize {
        self.order.iter().map(|i| self.entries[*i].feature.len()).sum()
    }

    pub fn write<W: Write>(&mut self, w: &mut W) -> KeitaisoResult<usize> {
        let rep = StepTimer::writing("tokens");
        let mut total = 0;
        let mut offset = 0u32;
        for &i in self.order {
            let e = &self.entries[i];
            let token = Token {
                left_id: e.left_id,
                right_id: e.right_id,
                cost: e.cost,
                feature_offset: offset,
                feature_len: e.feature.len() as u32,
            };
            total += token.write_to(w)?;
            offset += e.feature.len() as u32;
        }
        self.reporter.record(total, rep);

        let rep = StepTimer::writing("features");
        let mut size = 0;
        for &i in self.order {
            let f = self.entries[i].feature.as_bytes();
            w.write_all(f)?;
            size += f.len();
        }
        self.reporter.record(size, rep);

        Ok(total + size)
    }
}
