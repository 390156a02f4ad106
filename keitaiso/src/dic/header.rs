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

use nom::{bytes::complete::take, number::complete::le_u32, IResult};
use std::io::Write;
use thiserror::Error;

use crate::error::{KeitaisoError, KeitaisoResult};

/// Dictionary header errors
#[derive(Error, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum HeaderError {
    #[error("dictionary file is broken: expected {expected} bytes, was {actual}")]
    InvalidMagic { expected: usize, actual: usize },

    #[error("incompatible version: {0}")]
    InvalidVersion(u32),

    #[error("unknown dictionary type: {0}")]
    InvalidType(u32),

    #[error("Unable to parse")]
    CannotParse,
}

/// Kind of a binary dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryType {
    System,
    User,
    Unknown,
}

impl DictionaryType {
    pub fn to_u32(self) -> u32 {
        match self {
            DictionaryType::System => 0,
            DictionaryType::User => 1,
            DictionaryType::Unknown => 2,
        }
    }

    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(DictionaryType::System),
            1 => Some(DictionaryType::User),
            2 => Some(DictionaryType::Unknown),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DictionaryType::System => "system",
            DictionaryType::User => "user",
            DictionaryType::Unknown => "unknown",
        }
    }
}

/// Dictionary header
///
/// Describes the sizes of the three body parts (double array, token table
/// and feature pool) and the context id space the dictionary was compiled for.
/// The first field is the magic number xor-ed with the full file size.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Header {
    pub version: u32,
    pub dic_type: DictionaryType,
    pub lexsize: u32,
    pub lsize: u32,
    pub rsize: u32,
    pub dsize: u32,
    pub tsize: u32,
    pub fsize: u32,
    pub charset: String,
}

impl Header {
    pub const MAGIC_ID: u32 = 0xef71_8f77;
    pub const VERSION: u32 = 102;
    const CHARSET_SIZE: usize = 32;
    const PADDING_SIZE: usize = 8;
    pub const STORAGE_SIZE: usize = 4 * 10 + Header::CHARSET_SIZE + Header::PADDING_SIZE;

    /// Creates an empty header of the given type
    pub fn new(dic_type: DictionaryType) -> Self {
        Self {
            version: Header::VERSION,
            dic_type,
            lexsize: 0,
            lsize: 0,
            rsize: 0,
            dsize: 0,
            tsize: 0,
            fsize: 0,
            charset: String::from("utf-8"),
        }
    }

    /// Creates a new header from a dictionary bytes
    ///
    /// `bytes` must be the whole dictionary file, its length is checked
    /// against the magic number.
    pub fn parse(bytes: &[u8]) -> Result<Header, HeaderError> {
        let (_rest, (fields, charset)) =
            header_parser(bytes).map_err(|_| HeaderError::CannotParse)?;
        let [magic, version, dic_type, lexsize, lsize, rsize, dsize, tsize, fsize, _] = fields;

        let expected = (magic ^ Header::MAGIC_ID) as usize;
        if expected != bytes.len() {
            return Err(HeaderError::InvalidMagic {
                expected,
                actual: bytes.len(),
            });
        }
        if version != Header::VERSION {
            return Err(HeaderError::InvalidVersion(version));
        }
        let dic_type =
            DictionaryType::from_u32(dic_type).ok_or(HeaderError::InvalidType(dic_type))?;

        Ok(Header {
            version,
            dic_type,
            lexsize,
            lsize,
            rsize,
            dsize,
            tsize,
            fsize,
            charset,
        })
    }

    /// Size of the dictionary body which follows the header
    pub fn body_size(&self) -> usize {
        self.dsize as usize + self.tsize as usize + self.fsize as usize
    }

    /// Size of the whole dictionary file
    pub fn file_size(&self) -> usize {
        Header::STORAGE_SIZE + self.body_size()
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> KeitaisoResult<usize> {
        if self.charset.len() >= Header::CHARSET_SIZE {
            return Err(KeitaisoError::InvalidDataFormat(
                Header::CHARSET_SIZE,
                self.charset.clone(),
            ));
        }

        let magic = (self.file_size() as u32) ^ Header::MAGIC_ID;
        let fields = [
            magic,
            self.version,
            self.dic_type.to_u32(),
            self.lexsize,
            self.lsize,
            self.rsize,
            self.dsize,
            self.tsize,
            self.fsize,
            0,
        ];
        for f in fields.iter() {
            w.write_all(&f.to_le_bytes())?;
        }
        w.write_all(self.charset.as_bytes())?;
        let padding = Header::CHARSET_SIZE - self.charset.len() + Header::PADDING_SIZE;
        w.write_all(&vec![0; padding])?;
        Ok(Header::STORAGE_SIZE)
    }
}

/// Create String from UTF-8 bytes up to NUL byte or end of slice (whichever is first)
fn nul_terminated_str_from_slice(buf: &[u8]) -> String {
    let str_bytes: &[u8] = if let Some(nul_idx) = buf.iter().position(|b| *b == 0) {
        &buf[..nul_idx]
    } else {
        buf
    };
    String::from_utf8_lossy(str_bytes).to_string()
}

fn charset_parser(input: &[u8]) -> IResult<&[u8], String> {
    let (rest, charset_bytes) = take(Header::CHARSET_SIZE)(input)?;
    let (rest, _) = take(Header::PADDING_SIZE)(rest)?;
    Ok((rest, nul_terminated_str_from_slice(charset_bytes)))
}

fn header_parser(input: &[u8]) -> IResult<&[u8], ([u32; 10], String)> {
    let mut fields = [0u32; 10];
    let mut rest = input;
    for f in fields.iter_mut() {
        let (r, v) = le_u32(rest)?;
        *f = v;
        rest = r;
    }
    let (rest, charset) = charset_parser(rest)?;
    Ok((rest, (fields, charset)))
}
