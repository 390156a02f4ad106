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

use thiserror::Error;

use crate::error::{KeitaisoError, KeitaisoResult};

/// Dictionary compilation error with the source position
#[derive(Error, Debug)]
#[error("{file}:{line}\t{cause}")]
pub struct DicBuildError {
    pub file: String,
    pub line: usize,
    pub cause: BuildFailure,
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BuildFailure {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    CsvError(csv::Error),

    #[error("Field {field} did not exist in {original}")]
    SplitFormatError {
        field: &'static str,
        original: String,
    },

    #[error("Invalid i16 literal {0}")]
    InvalidI16Literal(String),

    #[error("Invalid u16 literal {0}")]
    InvalidU16Literal(String),

    #[error("Surface can't be empty")]
    EmptySurface,

    #[error("Connection size {1} was invalid: {0}")]
    InvalidConnSize(&'static str, i64),

    #[error("{field} was {actual}, must be less than {expected}")]
    InvalidFieldSize {
        actual: usize,
        expected: usize,
        field: &'static str,
    },

    #[error("Surface {0} has {1} entries, at most {2} are allowed")]
    TooManyHomographs(String, usize, usize),

    #[error("Dictionary has {0} entries, at most {1} are allowed")]
    TooManyEntries(usize, usize),

    #[error("Connection matrix was not defined")]
    MissingMatrix,

    #[error("Failed to build trie")]
    TrieBuildFailure,
}

#[derive(Default)]
pub struct DicCompilationCtx {
    name: String,
    line: usize,
}

impl DicCompilationCtx {
    pub fn memory() -> Self {
        DicCompilationCtx {
            name: "<memory>".to_owned(),
            line: 0,
        }
    }

    pub fn err<T, E: Into<BuildFailure>>(&self, reason: E) -> KeitaisoResult<T> {
        Err(self.to_keitaiso_err(reason))
    }

    pub fn to_keitaiso_err<E: Into<BuildFailure>>(&self, reason: E) -> KeitaisoError {
        match reason.into() {
            BuildFailure::Io(e) => e.into(),
            reason => DicBuildError {
                file: self.name.clone(),
                line: self.line,
                cause: reason,
            }
            .into(),
        }
    }

    #[inline]
    pub fn transform<T>(&self, result: BuildResult<T>) -> KeitaisoResult<T> {
        result.map_err(|e| self.to_keitaiso_err(e))
    }

    pub fn set_filename(&mut self, new_name: String) -> String {
        std::mem::replace(&mut self.name, new_name)
    }

    pub fn set_line(&mut self, line: usize) -> usize {
        std::mem::replace(&mut self.line, line)
    }

    pub fn add_line(&mut self, diff: usize) {
        self.line += diff;
    }
}

pub type BuildResult<T> = std::result::Result<T, BuildFailure>;
