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

//! Constrained analysis
//!
//! A boundary constraint tells whether a token may (or must) start and end at a byte position.
//! A feature constraint forces a span to be a single token with a matching feature.
//!
//! Partial input (request type PARTIAL) is a sequence of lines `surface[\tfeature]`
//! terminated by `EOS`. Surfaces are concatenated to get the sentence, every line
//! becomes a token boundary and lines with a feature become feature constraints.

use crate::error::ParseError;

/// Constraint on a byte position of the sentence
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoundaryConstraint {
    /// No constraint
    Any,
    /// A token must begin or end here
    TokenBoundary,
    /// No token can begin or end here
    InsideToken,
}

impl Default for BoundaryConstraint {
    fn default() -> Self {
        BoundaryConstraint::Any
    }
}

/// Span `[begin, end)` which must be a single token with a matching feature
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureConstraint {
    pub begin: usize,
    pub end: usize,
    pub feature: String,
}

impl FeatureConstraint {
    fn overlaps(&self, begin: usize, end: usize) -> bool {
        self.begin < end && begin < self.end
    }

    pub(crate) fn check_overlap(&self, begin: usize, end: usize) -> Result<(), ParseError> {
        if self.overlaps(begin, end) && !(self.begin == begin && self.end == end) {
            return Err(ParseError::OverlappingConstraint {
                begin: self.begin,
                end: self.end,
                new_begin: begin,
                new_end: end,
            });
        }
        Ok(())
    }
}

/// Checks whether `feature` conforms to `pattern`
///
/// Both are compared CSV field-wise over the shorter length.
/// A `*` in the pattern matches any field.
pub fn partial_match(pattern: &str, feature: &str) -> bool {
    pattern
        .split(',')
        .zip(feature.split(','))
        .all(|(p, f)| p == "*" || p == f)
}

/// Token of a partially annotated sentence
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PartialToken {
    pub begin: usize,
    pub end: usize,
    pub feature: Option<String>,
}

/// Splits partial input into the sentence and its tokens
pub(crate) fn parse_partial_input(input: &str) -> Result<(String, Vec<PartialToken>), ParseError> {
    let mut sentence = String::with_capacity(input.len());
    let mut tokens = Vec::new();
    for (i, line) in input.lines().enumerate() {
        if line == "EOS" {
            break;
        }
        let (surface, feature) = match line.split_once('\t') {
            Some((s, f)) => (s, Some(f)),
            None => (line, None),
        };
        if surface.is_empty() {
            if feature.is_some() {
                return Err(ParseError::InvalidPartialInput(
                    i + 1,
                    "token with a feature must have a surface".to_owned(),
                ));
            }
            continue;
        }
        let begin = sentence.len();
        sentence.push_str(surface);
        tokens.push(PartialToken {
            begin,
            end: sentence.len(),
            feature: feature.filter(|f| !f.is_empty()).map(|f| f.to_owned()),
        });
    }
    Ok((sentence, tokens))
}
