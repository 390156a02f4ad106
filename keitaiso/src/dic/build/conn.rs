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
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;

use crate::dic::build::error::{BuildFailure, BuildResult, DicCompilationCtx};
use crate::dic::build::parse::{it_next, parse_i16, parse_u16};
use crate::error::KeitaisoResult;

lazy_static! {
    static ref FIELD_SEP: Regex = Regex::new(r"\s+").unwrap();
}

/// Connection costs read from `matrix.def`
///
/// The first non-blank line is `num_left num_right`, every following one
/// is `left right cost`. Cells which are not listed cost 0.
pub struct ConnBuffer {
    costs: Vec<i16>,
    num_left: u16,
    num_right: u16,
    ctx: DicCompilationCtx,
}

impl ConnBuffer {
    pub fn new() -> Self {
        Self {
            costs: Vec::new(),
            num_left: 0,
            num_right: 0,
            ctx: DicCompilationCtx::memory(),
        }
    }

    pub fn left(&self) -> u16 {
        self.num_left
    }

    pub fn right(&self) -> u16 {
        self.num_right
    }

    pub fn is_defined(&self) -> bool {
        self.num_left > 0 && self.num_right > 0
    }

    /// Size of the binary form written by [`ConnBuffer::write_to`]
    pub fn byte_size(&self) -> usize {
        4 + self.costs.len() * 2
    }

    /// Writes the sizes followed by the cells, `right * num_left + left` order
    pub fn write_to<W: Write>(&self, writer: &mut W) -> KeitaisoResult<usize> {
        writer.write_all(&self.num_left.to_le_bytes())?;
        writer.write_all(&self.num_right.to_le_bytes())?;
        for cost in self.costs.iter() {
            writer.write_all(&cost.to_le_bytes())?;
        }
        Ok(self.byte_size())
    }

    pub fn read_file(&mut self, path: &Path) -> KeitaisoResult<()> {
        let old = self.ctx.set_filename(path.display().to_string());
        let status = File::open(path)
            .map_err(Into::into)
            .and_then(|file| self.read(BufReader::with_capacity(32 * 1024, file)));
        self.ctx.set_filename(old);
        status
    }

    pub fn read<R: BufRead>(&mut self, reader: R) -> KeitaisoResult<()> {
        self.ctx.set_line(0);
        self.num_left = 0;
        self.num_right = 0;
        for line in reader.lines() {
            let line = line?;
            self.ctx.add_line(1);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if self.is_defined() {
                let cell = self.parse_cell(line);
                self.ctx.transform(cell)?;
            } else {
                let sizes = parse_sizes(line);
                let (left, right) = self.ctx.transform(sizes)?;
                self.num_left = left;
                self.num_right = right;
                self.costs.clear();
                self.costs.resize(left as usize * right as usize, 0);
            }
        }
        if !self.is_defined() {
            return self.ctx.err(BuildFailure::MissingMatrix);
        }
        Ok(())
    }

    fn parse_cell(&mut self, line: &str) -> BuildResult<()> {
        let mut items = FIELD_SEP.splitn(line, 3);
        let left = it_next(line, &mut items, "left", parse_u16)?;
        let right = it_next(line, &mut items, "right", parse_u16)?;
        let cost = it_next(line, &mut items, "cost", parse_i16)?;
        check_id(left, self.num_left, "left")?;
        check_id(right, self.num_right, "right")?;
        self.costs[right as usize * self.num_left as usize + left as usize] = cost;
        Ok(())
    }
}

fn parse_sizes(line: &str) -> BuildResult<(u16, u16)> {
    let mut items = FIELD_SEP.splitn(line, 2);
    let left = it_next(line, &mut items, "left_num", parse_u16)?;
    let right = it_next(line, &mut items, "right_num", parse_u16)?;
    if left == 0 {
        return Err(BuildFailure::InvalidConnSize("left", 0));
    }
    if right == 0 {
        return Err(BuildFailure::InvalidConnSize("right", 0));
    }
    Ok((left, right))
}

fn check_id(id: u16, size: u16, field: &'static str) -> BuildResult<()> {
    if id >= size {
        return Err(BuildFailure::InvalidFieldSize {
            actual: id as usize,
            expected: size as usize,
            field,
        });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dic::connect::ConnectionMatrix;
    use crate::dic::storage::Storage;
    use claim::{assert_err, assert_ok};

    fn compile(data: &str) -> ConnectionMatrix {
        let mut parser = ConnBuffer::new();
        assert_ok!(parser.read(data.as_bytes()));
        let mut bytes = Vec::new();
        assert_eq!(assert_ok!(parser.write_to(&mut bytes)), bytes.len());
        assert_ok!(ConnectionMatrix::from_storage(Storage::Owned(bytes)))
    }

    #[test]
    fn cells() {
        let matrix = compile("\n  2 3\n0 0 0\n0 1 1\n1 0 -2\n1 2 3\n\n");
        assert_eq!((matrix.num_left(), matrix.num_right()), (2, 3));
        assert_eq!(matrix.cost(0, 0), 0);
        assert_eq!(matrix.cost(0, 1), 1);
        assert_eq!(matrix.cost(1, 0), -2);
        assert_eq!(matrix.cost(1, 2), 3);
        // not listed
        assert_eq!(matrix.cost(0, 2), 0);
    }

    #[test]
    fn out_of_range_cell() {
        let mut parser = ConnBuffer::new();
        assert_err!(parser.read("2 2\n2 0 5\n".as_bytes()));
        assert_err!(parser.read("2 2\n0 2 5\n".as_bytes()));
    }

    #[test]
    fn missing_header() {
        let mut parser = ConnBuffer::new();
        assert_err!(parser.read("\n\n".as_bytes()));
        assert!(!parser.is_defined());
        assert_err!(parser.read("-1 2\n".as_bytes()));
        assert_err!(parser.read("0 2\n".as_bytes()));
    }

    #[test]
    fn cost_out_of_range() {
        let mut parser = ConnBuffer::new();
        assert_err!(parser.read("1 1\n0 0 40000\n".as_bytes()));
    }
}
