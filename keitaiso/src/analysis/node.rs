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

use std::fmt::{Display, Formatter};
use std::ops::{Deref, Range};

use crate::dic::category_type::CategoryType;
use crate::dic::word_id::WordId;

/// Index of a node in the lattice arena
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(idx: usize) -> NodeId {
        NodeId(idx as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Origin of a node
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeStat {
    /// Word from a dictionary
    Normal,
    /// Generated by the unknown word provider, or forced by a feature constraint
    Unknown,
    Bos,
    Eos,
}

impl NodeStat {
    /// Numeric form, as printed by `%s`
    pub fn as_u8(self) -> u8 {
        match self {
            NodeStat::Normal => 0,
            NodeStat::Unknown => 1,
            NodeStat::Bos => 2,
            NodeStat::Eos => 3,
        }
    }
}

/// A candidate morpheme occupying the byte span `[begin, end)` of the sentence
///
/// Sentinels are empty: BOS sits at 0 and EOS at the sentence length.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) begin: usize,
    pub(crate) end: usize,
    pub(crate) left_id: u16,
    pub(crate) right_id: u16,
    pub(crate) word_cost: i32,
    pub(crate) stat: NodeStat,
    pub(crate) word_id: WordId,
    pub(crate) char_type: CategoryType,
    pub(crate) feature: Range<usize>,
    pub(crate) total_cost: i64,
    pub(crate) prev: Option<NodeId>,
    pub(crate) is_best: bool,
    pub(crate) lpath: Range<usize>,
    pub(crate) alpha: f64,
    pub(crate) beta: f64,
    pub(crate) prob: f64,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Byte index of the first byte
    pub fn begin(&self) -> usize {
        self.begin
    }

    /// Byte index one past the last byte
    pub fn end(&self) -> usize {
        self.end
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn left_id(&self) -> u16 {
        self.left_id
    }

    pub fn right_id(&self) -> u16 {
        self.right_id
    }

    /// Emission cost
    pub fn word_cost(&self) -> i32 {
        self.word_cost
    }

    /// Cost of the best path from BOS up to and including this node
    pub fn total_cost(&self) -> i64 {
        self.total_cost
    }

    pub fn stat(&self) -> NodeStat {
        self.stat
    }

    pub fn word_id(&self) -> WordId {
        self.word_id
    }

    /// Category of the characters an unknown node was generated for
    pub fn char_type(&self) -> CategoryType {
        self.char_type
    }

    /// Best predecessor, `None` only for BOS
    pub fn prev(&self) -> Option<NodeId> {
        self.prev
    }

    /// Is this node on the current best (or current N-best) path
    pub fn is_best(&self) -> bool {
        self.is_best
    }

    /// Forward log score, only with marginal probabilities
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Backward log score, only with marginal probabilities
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Marginal probability, only with marginal probabilities
    pub fn prob(&self) -> f64 {
        self.prob
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self.stat, NodeStat::Bos | NodeStat::Eos)
    }

    pub fn is_unknown(&self) -> bool {
        self.stat == NodeStat::Unknown
    }

    /// Indices of the paths ending at this node, see [`crate::analysis::Lattice::lpaths`]
    pub fn lpath_range(&self) -> Range<usize> {
        self.lpath.clone()
    }
}

/// An edge `lnode -> rnode` of the lattice
///
/// Only stored for N-best and marginal probability requests.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    pub lnode: NodeId,
    pub rnode: NodeId,
    /// Connection cost plus the emission cost of `rnode`
    pub cost: i32,
    pub prob: f64,
}

/// A node together with the text it was built from
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    node: &'a Node,
    sentence: &'a str,
    features: &'a str,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(node: &'a Node, sentence: &'a str, features: &'a str) -> NodeRef<'a> {
        NodeRef {
            node,
            sentence,
            features,
        }
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    /// Part of the sentence covered by this node, empty for sentinels
    pub fn surface(&self) -> &'a str {
        &self.sentence[self.node.begin..self.node.end]
    }

    /// Comma separated feature string
    pub fn feature(&self) -> &'a str {
        &self.features[self.node.feature.clone()]
    }
}

impl Deref for NodeRef<'_> {
    type Target = Node;

    fn deref(&self) -> &Self::Target {
        self.node
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.node.id)
            .field("begin", &self.node.begin)
            .field("end", &self.node.end)
            .field("surface", &self.surface())
            .field("feature", &self.feature())
            .field("total_cost", &self.node.total_cost)
            .finish()
    }
}
