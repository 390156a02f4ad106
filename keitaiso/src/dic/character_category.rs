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

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use crate::dic::category_type::CategoryType;

/// Character definition errors
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format at line {0}")]
    InvalidFormat(usize),

    #[error("Invalid type {1} at line {0}")]
    InvalidCategoryType(usize, String),

    #[error("Multiple definition of type {1} at line {0}")]
    MultipleTypeDefinition(usize, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Range {
    begin: u32,
    end: u32,
    categories: CategoryType,
}

/// CharacterCategory holds mapping from character to character category type
#[derive(Debug, Default, Clone)]
pub struct CharacterCategory {
    ranges: Vec<Range>,
}

impl CharacterCategory {
    /// Creates a character category from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<CharacterCategory, Error> {
        let reader = BufReader::new(fs::File::open(path)?);
        Self::from_reader(reader)
    }

    pub fn from_reader<T: BufRead>(data: T) -> Result<CharacterCategory, Error> {
        let ranges = Self::read_character_definition(data)?;
        Ok(Self::compile(ranges))
    }

    /// Reads character type definition as a list of Ranges
    ///
    /// Only lines starting with "0x" are read, category definition lines
    /// (`NAME invoke group length`) are left for the unknown word handler.
    ///
    /// Definition example:
    ///     "0x0030..0x0039 NUMERIC"
    ///     "0x3008         KANJI KANJINUMERIC"
    fn read_character_definition<T: BufRead>(reader: T) -> Result<Vec<Range>, Error> {
        let mut ranges: Vec<Range> = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if !line.starts_with("0x") {
                continue;
            }

            let cols: Vec<_> = line.split_whitespace().collect();
            if cols.len() < 2 {
                return Err(Error::InvalidFormat(i));
            }

            let mut r = cols[0].splitn(2, "..");
            let begin = parse_code_point(r.next(), i)?;
            let end = match r.next() {
                Some(v) => parse_code_point(Some(v), i)? + 1,
                None => begin + 1,
            };
            if begin >= end {
                return Err(Error::InvalidFormat(i));
            }

            let mut categories = CategoryType::empty();
            for elem in cols[1..].iter().take_while(|elem| !elem.starts_with('#')) {
                categories |= elem
                    .parse::<CategoryType>()
                    .map_err(|_| Error::InvalidCategoryType(i, elem.to_string()))?;
            }
            if categories.is_empty() {
                return Err(Error::InvalidFormat(i));
            }

            ranges.push(Range {
                begin,
                end,
                categories,
            });
        }

        Ok(ranges)
    }

    /// Transforms possibly overlapping ranges into sorted disjoint ones,
    /// each carrying the union of categories of the ranges covering it
    fn compile(ranges: Vec<Range>) -> CharacterCategory {
        let mut bounds: Vec<u32> = ranges.iter().flat_map(|r| [r.begin, r.end]).collect();
        bounds.sort_unstable();
        bounds.dedup();

        let mut compiled: Vec<Range> = Vec::with_capacity(bounds.len());
        for w in bounds.windows(2) {
            let (begin, end) = (w[0], w[1]);
            let categories = ranges
                .iter()
                .filter(|r| r.begin <= begin && end <= r.end)
                .fold(CategoryType::empty(), |acc, r| acc | r.categories);
            if categories.is_empty() {
                continue;
            }
            match compiled.last_mut() {
                Some(last) if last.end == begin && last.categories == categories => {
                    last.end = end;
                }
                _ => compiled.push(Range {
                    begin,
                    end,
                    categories,
                }),
            }
        }

        CharacterCategory { ranges: compiled }
    }

    /// Returns a set of category types which given char has
    pub fn get_category_types(&self, c: char) -> CategoryType {
        let cp = c as u32;
        let idx = self.ranges.partition_point(|r| r.end <= cp);
        match self.ranges.get(idx) {
            Some(r) if r.begin <= cp => r.categories,
            _ => CategoryType::DEFAULT,
        }
    }
}

fn parse_code_point(v: Option<&str>, line: usize) -> Result<u32, Error> {
    let v = v.ok_or(Error::InvalidFormat(line))?;
    let digits = v.trim_start_matches("0x");
    u32::from_str_radix(digits, 16).map_err(|_| Error::InvalidFormat(line))
}
