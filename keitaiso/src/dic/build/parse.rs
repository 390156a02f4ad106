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

use std::str::FromStr;

use crate::dic::build::error::{BuildFailure, BuildResult};

#[inline(always)]
pub fn it_next<'a, I, T, F>(
    orig: &'a str,
    data: &mut I,
    field: &'static str,
    f: F,
) -> BuildResult<T>
where
    I: Iterator<Item = &'a str>,
    F: FnOnce(&'a str) -> BuildResult<T>,
    T: 'a,
{
    match data.next() {
        Some(s) => f(s),
        None => Err(BuildFailure::SplitFormatError {
            original: orig.trim_end().to_owned(),
            field,
        }),
    }
}

#[inline]
pub(crate) fn parse_i16(data: &str) -> BuildResult<i16> {
    match i16::from_str(data.trim()) {
        Ok(v) => Ok(v),
        Err(_) => Err(BuildFailure::InvalidI16Literal(data.to_owned())),
    }
}

#[inline]
pub(crate) fn parse_u16(data: &str) -> BuildResult<u16> {
    match u16::from_str(data.trim()) {
        Ok(v) => Ok(v),
        Err(_) => Err(BuildFailure::InvalidU16Literal(data.to_owned())),
    }
}
