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

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::dic::build::error::DicBuildError;
use crate::dic::character_category::Error as CharacterCategoryError;
use crate::dic::header::HeaderError;
use crate::dic::lexicon_set::LexiconSetError;

pub type KeitaisoResult<T> = Result<T, KeitaisoError>;

/// Errors which make a dictionary unusable.
///
/// All of them are fatal for model construction: a model is either
/// loaded completely or not at all.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DictionaryLoadError {
    #[error("{path}: {cause}")]
    Io {
        cause: std::io::Error,
        path: PathBuf,
    },

    #[error("no such file or directory: {0}")]
    NotFound(PathBuf),

    #[error("{0}: invalid header: {1}")]
    InvalidHeader(PathBuf, HeaderError),

    #[error("{0}: dictionary file is broken, {1}")]
    Truncated(PathBuf, String),

    #[error("{path}: expected {expected} dictionary, found {actual}")]
    InvalidDictionaryType {
        path: PathBuf,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("matrix of {matrix_left}x{matrix_right} doesn't fit {path} ({dic_left}x{dic_right})")]
    IncompatibleMatrix {
        path: PathBuf,
        matrix_left: usize,
        matrix_right: usize,
        dic_left: usize,
        dic_right: usize,
    },

    #[error("{0}: context id {1} of entry {2} is out of range")]
    InvalidContextId(PathBuf, usize, usize),

    #[error("{0}: {1}")]
    InvalidCharDef(PathBuf, CharacterCategoryError),

    #[error("{0}: invalid unknown word definition at line {1}: {2}")]
    InvalidUnkDef(PathBuf, usize, String),

    #[error("{0}: invalid connection matrix, {1}")]
    InvalidMatrix(PathBuf, String),
}

/// Errors of a single analysis request.
///
/// They never invalidate the model or the tagger, the next request
/// can be served as usual.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum ParseError {
    #[error("empty sentence")]
    EmptySentence,

    #[error("lattice has no sentence")]
    NotInitialized,

    #[error("feature constraint {new_begin}..{new_end} overlaps with {begin}..{end}")]
    OverlappingConstraint {
        begin: usize,
        end: usize,
        new_begin: usize,
        new_end: usize,
    },

    #[error("constraint {0}..{1} is out of the sentence of {2} bytes")]
    ConstraintOutOfRange(usize, usize, usize),

    #[error("constraint position {0} is not a character boundary")]
    NotCharBoundary(usize),

    #[error("End of sentence (EOS) is not connected to beginning of sentence (BOS)")]
    Disconnected,

    #[error("invalid partial input at line {0}: {1}")]
    InvalidPartialInput(usize, String),

    #[error("Input is too long, it can't be more than {1} bytes, was {0}")]
    InputTooLong(usize, usize),
}

/// Keitaiso error
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum KeitaisoError {
    #[error("{context}: {cause}")]
    ErrWithContext {
        context: String,
        cause: Box<KeitaisoError>,
    },

    #[error("{context}: {cause}")]
    Io {
        cause: std::io::Error,
        context: String,
    },

    #[error("Formatting error")]
    FmtError(#[from] std::fmt::Error),

    #[error(transparent)]
    DictionaryLoad(#[from] DictionaryLoadError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Config Error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Lexicon error: {0}")]
    LexiconSetError(#[from] LexiconSetError),

    #[error("Invalid character category type: {0}")]
    InvalidCharacterCategoryType(String),

    #[error("Invalid data format: {1} at line {0}")]
    InvalidDataFormat(usize, String),

    #[error("Invalid range: {0}..{1}")]
    InvalidRange(usize, usize),

    #[error(transparent)]
    DictionaryCompilationError(#[from] DicBuildError),
}

impl From<std::io::Error> for KeitaisoError {
    fn from(e: std::io::Error) -> Self {
        KeitaisoError::Io {
            cause: e,
            context: String::from("IO Error"),
        }
    }
}

impl KeitaisoError {
    pub fn with_context<S: Into<String>>(self, ctx: S) -> Self {
        match self {
            KeitaisoError::Io { cause, .. } => KeitaisoError::Io {
                cause,
                context: ctx.into(),
            },
            cause => KeitaisoError::ErrWithContext {
                cause: Box::new(cause),
                context: ctx.into(),
            },
        }
    }

    /// Returns the analysis error if this error was caused by a single request
    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            KeitaisoError::Parse(e) => Some(e),
            KeitaisoError::ErrWithContext { cause, .. } => cause.as_parse_error(),
            _ => None,
        }
    }
}
