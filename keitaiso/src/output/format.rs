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

use std::fmt::Write;
use std::str::Chars;

use crate::analysis::{Lattice, NodeRef};
use crate::config::ConfigError;

/// Part of a compiled template
#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Literal(String),
    Surface,
    Feature,
    Field(usize),
    Fields(char, Vec<usize>),
    WordCost,
    Stat,
    Begin,
    End,
    Length,
    LeftId,
    RightId,
    TotalCost,
    ConnectionCost,
    NodeId,
    BestMark,
    Prob,
    Alpha,
    Beta,
    Sentence,
    SentenceLength,
}

/// Compiled output template
///
/// | escape | |
/// |---|---|
/// | `%m`, `%pS` | surface |
/// | `%H` | feature |
/// | `%f[N]` | N-th feature field |
/// | `%F<c>[N,M..]` | listed feature fields joined by `<c>` |
/// | `%c`, `%pw` | word cost |
/// | `%s` | node stat |
/// | `%ps`, `%pe`, `%pl` | begin, end and length in bytes |
/// | `%phl`, `%phr` | left and right context ids |
/// | `%pC` | cost from BOS |
/// | `%pc` | connection cost from the best predecessor |
/// | `%pn` | node id |
/// | `%pb` | `*` if the node is on the best path |
/// | `%pP`, `%pA`, `%pB` | marginal probability, alpha and beta |
/// | `%S`, `%L` | sentence and its length in bytes |
/// | `%%` | `%` |
///
/// `\t`, `\n`, `\s` and `\\` are expanded as well.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    pieces: Vec<Piece>,
}

fn invalid(template: &str, what: String) -> ConfigError {
    ConfigError::InvalidFormat(format!("{}: {:?}", what, template))
}

fn unescape(c: Option<char>, template: &str) -> Result<char, ConfigError> {
    match c {
        Some('t') => Ok('\t'),
        Some('n') => Ok('\n'),
        Some('s') => Ok(' '),
        Some('\\') => Ok('\\'),
        Some(c) => Err(invalid(template, format!("unknown escape \\{}", c))),
        None => Err(invalid(template, "dangling \\".to_owned())),
    }
}

fn parse_indices(chars: &mut Chars, template: &str) -> Result<Vec<usize>, ConfigError> {
    if chars.next() != Some('[') {
        return Err(invalid(template, "expected [ after field escape".to_owned()));
    }
    let mut body = String::new();
    loop {
        match chars.next() {
            Some(']') => break,
            Some(c) => body.push(c),
            None => return Err(invalid(template, "unclosed [".to_owned())),
        }
    }
    body.split(',')
        .map(|n| {
            n.trim()
                .parse::<usize>()
                .map_err(|_| invalid(template, format!("invalid field index {:?}", n)))
        })
        .collect()
}

fn parse_percent(chars: &mut Chars, template: &str) -> Result<Option<Piece>, ConfigError> {
    let piece = match chars.next() {
        Some('%') => return Ok(None),
        Some('m') => Piece::Surface,
        Some('H') => Piece::Feature,
        Some('c') => Piece::WordCost,
        Some('s') => Piece::Stat,
        Some('S') => Piece::Sentence,
        Some('L') => Piece::SentenceLength,
        Some('f') => {
            let idx = parse_indices(chars, template)?;
            if idx.len() != 1 {
                return Err(invalid(template, "%f takes a single index".to_owned()));
            }
            Piece::Field(idx[0])
        }
        Some('F') => {
            let sep = match chars.next() {
                Some(c) => c,
                None => return Err(invalid(template, "%F needs a separator".to_owned())),
            };
            Piece::Fields(sep, parse_indices(chars, template)?)
        }
        Some('p') => match chars.next() {
            Some('S') => Piece::Surface,
            Some('s') => Piece::Begin,
            Some('e') => Piece::End,
            Some('l') => Piece::Length,
            Some('C') => Piece::TotalCost,
            Some('w') => Piece::WordCost,
            Some('c') => Piece::ConnectionCost,
            Some('n') => Piece::NodeId,
            Some('b') => Piece::BestMark,
            Some('P') => Piece::Prob,
            Some('A') => Piece::Alpha,
            Some('B') => Piece::Beta,
            Some('h') => match chars.next() {
                Some('l') => Piece::LeftId,
                Some('r') => Piece::RightId,
                c => {
                    let what = format!("unknown escape %ph{}", c.unwrap_or(' '));
                    return Err(invalid(template, what));
                }
            },
            c => return Err(invalid(template, format!("unknown escape %p{}", c.unwrap_or(' ')))),
        },
        Some(c) => return Err(invalid(template, format!("unknown escape %{}", c))),
        None => return Err(invalid(template, "dangling %".to_owned())),
    };
    Ok(Some(piece))
}

impl Template {
    pub fn parse(template: &str) -> Result<Template, ConfigError> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => literal.push(unescape(chars.next(), template)?),
                '%' => match parse_percent(&mut chars, template)? {
                    None => literal.push('%'),
                    Some(piece) => {
                        if !literal.is_empty() {
                            pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                        }
                        pieces.push(piece);
                    }
                },
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Ok(Template { pieces })
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Renders the template for a node of the lattice
    pub fn render(&self, lattice: &Lattice, node: &NodeRef, out: &mut String) -> std::fmt::Result {
        for piece in self.pieces.iter() {
            match piece {
                Piece::Literal(s) => out.push_str(s),
                Piece::Surface => out.push_str(node.surface()),
                Piece::Feature => out.push_str(node.feature()),
                Piece::Field(n) => out.push_str(node.feature().split(',').nth(*n).unwrap_or("")),
                Piece::Fields(sep, indices) => {
                    let fields: Vec<&str> = node.feature().split(',').collect();
                    for (i, n) in indices.iter().enumerate() {
                        if i != 0 {
                            out.push(*sep);
                        }
                        out.push_str(fields.get(*n).copied().unwrap_or(""));
                    }
                }
                Piece::WordCost => write!(out, "{}", node.word_cost())?,
                Piece::Stat => write!(out, "{}", node.stat().as_u8())?,
                Piece::Begin => write!(out, "{}", node.begin())?,
                Piece::End => write!(out, "{}", node.end())?,
                Piece::Length => write!(out, "{}", node.len())?,
                Piece::LeftId => write!(out, "{}", node.left_id())?,
                Piece::RightId => write!(out, "{}", node.right_id())?,
                Piece::TotalCost => write!(out, "{}", node.total_cost())?,
                Piece::ConnectionCost => write!(out, "{}", lattice.connection_cost(node.id()))?,
                Piece::NodeId => write!(out, "{}", node.id())?,
                Piece::BestMark => out.push(if node.is_best() { '*' } else { ' ' }),
                Piece::Prob => write!(out, "{:.6}", node.prob())?,
                Piece::Alpha => write!(out, "{:.6}", node.alpha())?,
                Piece::Beta => write!(out, "{:.6}", node.beta())?,
                Piece::Sentence => out.push_str(lattice.sentence()),
                Piece::SentenceLength => write!(out, "{}", lattice.len())?,
            }
        }
        Ok(())
    }

    /// Renders the template without a node, only literals and sentence escapes produce output
    pub fn render_sentence(&self, sentence: &str, out: &mut String) -> std::fmt::Result {
        for piece in self.pieces.iter() {
            match piece {
                Piece::Literal(s) => out.push_str(s),
                Piece::Sentence => out.push_str(sentence),
                Piece::SentenceLength => write!(out, "{}", sentence.len())?,
                _ => {}
            }
        }
        Ok(())
    }
}
