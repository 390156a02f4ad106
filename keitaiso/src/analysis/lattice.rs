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

use std::io::Write;

use crate::analysis::constraint::{BoundaryConstraint, FeatureConstraint};
use crate::analysis::nbest::NBestGenerator;
use crate::analysis::node::{Node, NodeId, NodeRef, NodeStat, Path};
use crate::analysis::RequestType;
use crate::dic::category_type::CategoryType;
use crate::dic::connect::ConnectionMatrix;
use crate::dic::word_id::WordId;
use crate::error::{KeitaisoResult, ParseError};

pub const DEFAULT_THETA: f64 = 0.75;

/// Feature of the BOS and EOS nodes
pub(crate) const SENTINEL_FEATURE: &str = "BOS/EOS,*,*,*,*,*,*,*,*";

/// Lattice of a single sentence
///
/// Nodes live in an arena and are referred to by [`NodeId`].
/// They are indexed twice: by the byte position they begin at and by
/// the byte position they end at. BOS is the only member of `end_nodes(0)`,
/// EOS is the only member of `begin_nodes(len)`.
///
/// During the successive analysis, inner vectors are not dropped, so
/// buffers are reused between sentences.
pub struct Lattice {
    pub(crate) sentence: String,
    pub(crate) partial_source: Option<String>,
    pub(crate) nodes: Vec<Node>,
    pub(crate) paths: Vec<Path>,
    pub(crate) features: String,
    pub(crate) begin_nodes: Vec<Vec<NodeId>>,
    pub(crate) end_nodes: Vec<Vec<NodeId>>,
    pub(crate) size: usize,
    pub(crate) best: Vec<NodeId>,
    pub(crate) request_type: RequestType,
    pub(crate) theta: f64,
    pub(crate) z: f64,
    pub(crate) boundaries: Vec<BoundaryConstraint>,
    pub(crate) feature_constraints: Vec<FeatureConstraint>,
    pub(crate) nbest: Option<NBestGenerator>,
    pub(crate) what: Option<String>,
}

impl Default for Lattice {
    fn default() -> Self {
        Lattice {
            sentence: String::new(),
            partial_source: None,
            nodes: Vec::new(),
            paths: Vec::new(),
            features: String::new(),
            begin_nodes: Vec::new(),
            end_nodes: Vec::new(),
            size: 0,
            best: Vec::new(),
            request_type: RequestType::ONE_BEST,
            theta: DEFAULT_THETA,
            z: 0.0,
            boundaries: Vec::new(),
            feature_constraints: Vec::new(),
            nbest: None,
            what: None,
        }
    }
}

impl Lattice {
    pub fn new() -> Lattice {
        Lattice::default()
    }

    fn reset_vec<T>(data: &mut Vec<Vec<T>>, target: usize) {
        for v in data.iter_mut() {
            v.clear();
        }
        let cur_len = data.len();
        if cur_len <= target {
            data.reserve(target - cur_len);
            for _ in cur_len..target {
                data.push(Vec::with_capacity(8))
            }
        }
    }

    /// Drops analysis results, keeps the sentence and the constraints
    pub(crate) fn reset_analysis(&mut self) {
        self.nodes.clear();
        self.paths.clear();
        self.features.clear();
        self.best.clear();
        self.nbest = None;
        self.what = None;
        self.z = 0.0;
        self.size = 0;
    }

    /// Prepares buckets for `size` positions
    pub(crate) fn reset_buckets(&mut self, size: usize) {
        Self::reset_vec(&mut self.begin_nodes, size);
        Self::reset_vec(&mut self.end_nodes, size);
        self.size = size;
    }

    /// Removes the sentence, all nodes and all constraints
    ///
    /// Request type and theta are kept.
    pub fn clear(&mut self) {
        self.reset_analysis();
        self.sentence.clear();
        self.partial_source = None;
        self.boundaries.clear();
        self.feature_constraints.clear();
    }

    /// Sets the sentence to analyze
    ///
    /// Previous results and constraints are dropped.
    pub fn set_sentence(&mut self, sentence: &str) {
        self.clear();
        self.sentence.push_str(sentence);
    }

    /// The analyzed sentence
    ///
    /// For partial input this is the concatenation of surfaces once the lattice is built.
    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    /// Sentence length in bytes
    pub fn len(&self) -> usize {
        self.sentence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentence.is_empty()
    }

    /// Number of positions of a built lattice (sentence length + 1), 0 before analysis
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the lattice holds the result of a successful analysis
    pub fn is_available(&self) -> bool {
        !self.best.is_empty()
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn set_request_type(&mut self, request_type: RequestType) {
        self.request_type = request_type;
    }

    pub fn add_request_type(&mut self, request_type: RequestType) {
        self.request_type.insert(request_type);
    }

    pub fn remove_request_type(&mut self, request_type: RequestType) {
        self.request_type.remove(request_type);
    }

    pub fn has_request_type(&self, request_type: RequestType) -> bool {
        self.request_type.contains(request_type)
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn set_theta(&mut self, theta: f64) {
        self.theta = theta;
    }

    /// Log of the partition function, only with marginal probabilities
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Message of the last failed analysis
    pub fn what(&self) -> Option<&str> {
        self.what.as_deref()
    }

    pub fn set_what<S: Into<String>>(&mut self, what: S) {
        self.what = Some(what.into());
    }

    fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef::new(&self.nodes[id.index()], &self.sentence, &self.features)
    }

    /// Looks up a node by its id
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.nodes.get(id.index()).map(|n| NodeRef::new(n, &self.sentence, &self.features))
    }

    /// All nodes in the creation order (which is the begin order), BOS first and EOS last
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.nodes
            .iter()
            .map(move |n| NodeRef::new(n, &self.sentence, &self.features))
    }

    /// Number of nodes including sentinels
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes beginning at the byte position `pos`
    pub fn begin_nodes(&self, pos: usize) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.bucket(&self.begin_nodes, pos)
    }

    /// Nodes ending at the byte position `pos`
    pub fn end_nodes(&self, pos: usize) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.bucket(&self.end_nodes, pos)
    }

    fn bucket<'a>(
        &'a self,
        data: &'a [Vec<NodeId>],
        pos: usize,
    ) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let ids: &[NodeId] = if pos < self.size {
            &data[pos]
        } else {
            &[]
        };
        ids.iter().map(move |id| self.node_ref(*id))
    }

    pub fn bos_node(&self) -> Option<NodeRef<'_>> {
        self.best.first().map(|id| self.node_ref(*id))
    }

    pub fn eos_node(&self) -> Option<NodeRef<'_>> {
        self.best.last().map(|id| self.node_ref(*id))
    }

    /// Nodes of the best path (or of the current N-best path) from the BOS successor to EOS
    pub fn best_path(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.best.iter().skip(1).map(move |id| self.node_ref(*id))
    }

    /// Cost of the current best path
    pub fn best_cost(&self) -> Option<i64> {
        self.eos_node().map(|n| n.total_cost())
    }

    /// All stored paths, only with N-best or marginal requests
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// Paths ending at the node
    pub fn lpaths(&self, id: NodeId) -> &[Path] {
        match self.nodes.get(id.index()) {
            Some(n) => &self.paths[n.lpath_range()],
            None => &[],
        }
    }

    /// Connection cost from the best predecessor
    pub fn connection_cost(&self, id: NodeId) -> i64 {
        let node = &self.nodes[id.index()];
        match node.prev() {
            Some(p) => {
                node.total_cost() - self.nodes[p.index()].total_cost() - node.word_cost() as i64
            }
            None => 0,
        }
    }

    pub(crate) fn add_node(&mut self, mut node: Node, feature: &str) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let start = self.features.len();
        self.features.push_str(feature);
        node.id = id;
        node.feature = start..self.features.len();
        self.nodes.push(node);
        id
    }

    pub(crate) fn sentinel(stat: NodeStat, pos: usize) -> Node {
        Node {
            id: NodeId::new(0),
            begin: pos,
            end: pos,
            left_id: 0,
            right_id: 0,
            word_cost: 0,
            stat,
            word_id: if stat == NodeStat::Bos {
                WordId::BOS
            } else {
                WordId::EOS
            },
            char_type: CategoryType::empty(),
            feature: 0..0,
            total_cost: 0,
            prev: None,
            is_best: false,
            lpath: 0..0,
            alpha: 0.0,
            beta: 0.0,
            prob: 0.0,
        }
    }

    /// Marks `path` (BOS..=EOS) as the current best path
    pub(crate) fn set_best(&mut self, path: Vec<NodeId>) {
        for id in self.best.iter() {
            self.nodes[id.index()].is_best = false;
        }
        for id in path.iter() {
            self.nodes[id.index()].is_best = true;
        }
        self.best = path;
    }

    /// Moves to the next N-best path
    ///
    /// The first call gives the best path. Returns `false` when paths are exhausted
    /// or the lattice was not built with the NBEST request.
    pub fn next(&mut self) -> bool {
        let mut gen = match self.nbest.take() {
            Some(g) => g,
            None => return false,
        };
        let found = gen.next(&self.nodes, &self.paths);
        self.nbest = Some(gen);
        match found {
            Some((mut path, cost)) => {
                tracing::trace!("next path with cost {}", cost);
                let bos = self.best.first().copied().unwrap_or_else(|| NodeId::new(0));
                path.insert(0, bos);
                self.set_best(path);
                true
            }
            None => false,
        }
    }

    fn check_position(&self, pos: usize) -> Result<(), ParseError> {
        if pos > self.sentence.len() {
            return Err(ParseError::ConstraintOutOfRange(pos, pos, self.sentence.len()));
        }
        if !self.sentence.is_char_boundary(pos) {
            return Err(ParseError::NotCharBoundary(pos));
        }
        Ok(())
    }

    fn ensure_boundaries(&mut self) {
        let size = self.sentence.len() + 1;
        if self.boundaries.len() != size {
            self.boundaries.clear();
            self.boundaries.resize(size, BoundaryConstraint::Any);
        }
    }

    /// Sets the boundary constraint of a byte position
    pub fn set_boundary_constraint(
        &mut self,
        pos: usize,
        constraint: BoundaryConstraint,
    ) -> Result<(), ParseError> {
        self.check_position(pos)?;
        self.ensure_boundaries();
        self.boundaries[pos] = constraint;
        Ok(())
    }

    pub fn boundary_constraint(&self, pos: usize) -> BoundaryConstraint {
        self.boundaries.get(pos).copied().unwrap_or_default()
    }

    /// Forces `[begin, end)` to be a single token with a feature matching `feature`
    ///
    /// Both ends become token boundaries and inner positions can't be boundaries.
    /// Setting the same span again replaces the feature,
    /// a span overlapping another one is an error.
    pub fn set_feature_constraint<S: Into<String>>(
        &mut self,
        begin: usize,
        end: usize,
        feature: S,
    ) -> Result<(), ParseError> {
        if begin >= end || end > self.sentence.len() {
            return Err(ParseError::ConstraintOutOfRange(begin, end, self.sentence.len()));
        }
        self.check_position(begin)?;
        self.check_position(end)?;
        for c in self.feature_constraints.iter() {
            c.check_overlap(begin, end)?;
        }

        let feature = feature.into();
        let idx = self.feature_constraints.partition_point(|c| c.begin < begin);
        match self.feature_constraints.get_mut(idx) {
            Some(c) if c.begin == begin => c.feature = feature,
            _ => self.feature_constraints.insert(idx, FeatureConstraint { begin, end, feature }),
        }

        self.ensure_boundaries();
        self.boundaries[begin] = BoundaryConstraint::TokenBoundary;
        self.boundaries[end] = BoundaryConstraint::TokenBoundary;
        for b in &mut self.boundaries[begin + 1..end] {
            *b = BoundaryConstraint::InsideToken;
        }
        Ok(())
    }

    /// Feature constraint of the span beginning at `pos`
    pub fn feature_constraint(&self, pos: usize) -> Option<&FeatureConstraint> {
        let idx = self.feature_constraints.partition_point(|c| c.begin < pos);
        self.feature_constraints.get(idx).filter(|c| c.begin == pos)
    }

    pub fn has_constraints(&self) -> bool {
        !self.boundaries.is_empty() || !self.feature_constraints.is_empty()
    }

    /// Writes all nodes with the connection costs to their left neighbours
    pub fn dump<W: Write>(&self, conn: &ConnectionMatrix, out: &mut W) -> KeitaisoResult<()> {
        for node in self.nodes() {
            let surface = if node.is_sentinel() {
                "(null)"
            } else {
                node.surface()
            };
            write!(
                out,
                "{}: {} {} {} {} {} {} {} {} {}:",
                node.id(),
                node.begin(),
                node.end(),
                surface,
                node.word_id(),
                node.feature(),
                node.left_id(),
                node.right_id(),
                node.word_cost(),
                node.total_cost(),
            )?;

            if node.stat() != NodeStat::Bos {
                for l_node in self.end_nodes(node.begin()) {
                    let connect_cost = conn.cost(l_node.right_id(), node.left_id());
                    write!(out, " {}", connect_cost)?;
                }
            }

            writeln!(out)?;
        }
        Ok(())
    }
}
