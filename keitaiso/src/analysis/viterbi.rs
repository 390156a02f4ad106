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

use std::borrow::Cow;

use itertools::Itertools;

use crate::analysis::constraint::{parse_partial_input, partial_match, BoundaryConstraint};
use crate::analysis::lattice::{Lattice, SENTINEL_FEATURE};
use crate::analysis::marginal;
use crate::analysis::nbest::NBestGenerator;
use crate::analysis::node::{Node, NodeId, NodeStat, Path};
use crate::analysis::{DictionaryAccess, RequestType};
use crate::dic::category_type::CategoryType;
use crate::dic::connect::ConnectionMatrix;
use crate::dic::word_id::WordId;
use crate::error::{KeitaisoResult, ParseError};
use crate::unknown::UnknownNode;

/// Sentences are limited by the size of node ids
pub const MAX_SENTENCE_LENGTH: usize = u32::MAX as usize / 2;

/// Node which is not yet in the lattice
#[derive(Debug, Clone)]
struct Candidate<'m> {
    end: usize,
    left_id: u16,
    right_id: u16,
    cost: i32,
    stat: NodeStat,
    word_id: WordId,
    char_type: CategoryType,
    feature: Cow<'m, str>,
}

impl<'m> Candidate<'m> {
    fn unknown(node: UnknownNode<'m>, feature: Option<&'m str>) -> Candidate<'m> {
        Candidate {
            end: node.end,
            left_id: node.left_id,
            right_id: node.right_id,
            cost: node.cost as i32,
            stat: NodeStat::Unknown,
            word_id: node.word_id,
            char_type: node.char_type,
            feature: Cow::Borrowed(feature.unwrap_or(node.feature)),
        }
    }
}

impl Lattice {
    /// Builds the lattice of the current sentence and finds the best path
    ///
    /// Nodes are connected in the order of their begin position.
    /// Each node keeps the predecessor with the minimal total cost,
    /// the first seen one wins when costs are equal.
    pub(crate) fn analyze<D: DictionaryAccess + ?Sized>(&mut self, dic: &D) -> KeitaisoResult<()> {
        self.reset_analysis();
        if self.has_request_type(RequestType::PARTIAL) {
            self.prepare_partial()?;
        }
        if self.sentence.is_empty() {
            return Err(ParseError::EmptySentence.into());
        }
        if self.sentence.len() > MAX_SENTENCE_LENGTH {
            return Err(ParseError::InputTooLong(self.sentence.len(), MAX_SENTENCE_LENGTH).into());
        }
        let constrained = self.prepare_constraints()?;

        let sentence = std::mem::take(&mut self.sentence);
        let result = self.build(dic, &sentence, constrained);
        self.sentence = sentence;
        result?;

        if self.has_request_type(RequestType::MARGINAL_PROB) {
            marginal::forward_backward(self);
        }
        if self.has_request_type(RequestType::NBEST) {
            if let Some(eos) = self.best.last() {
                self.nbest = Some(NBestGenerator::new(&self.nodes[eos.index()]));
            }
        }

        tracing::debug!(
            "analyzed {} bytes: {} nodes, {} paths, best cost {:?}",
            self.sentence.len(),
            self.nodes.len(),
            self.paths.len(),
            self.best_cost()
        );
        Ok(())
    }

    fn build<D: DictionaryAccess + ?Sized>(
        &mut self,
        dic: &D,
        sentence: &str,
        constrained: bool,
    ) -> KeitaisoResult<()> {
        let len = sentence.len();
        let bytes = sentence.as_bytes();
        let conn = dic.connection();
        let keep_paths = self.request_type.needs_paths();
        let unk_feature = dic.unknown_feature();

        self.reset_buckets(len + 1);
        let bos = self.add_node(Lattice::sentinel(NodeStat::Bos, 0), SENTINEL_FEATURE);
        self.end_nodes[0].push(bos);

        let mut candidates: Vec<Candidate> = Vec::new();
        let mut unknown: Vec<UnknownNode> = Vec::new();

        for pos in 0..len {
            if self.end_nodes[pos].is_empty() {
                continue;
            }
            candidates.clear();

            let lexicon = dic.lexicon();
            for e in lexicon.lookup(bytes, pos) {
                if let Ok((token, feature)) = lexicon.entry(e.word_id) {
                    candidates.push(Candidate {
                        end: e.end,
                        left_id: token.left_id,
                        right_id: token.right_id,
                        cost: token.cost as i32,
                        stat: NodeStat::Normal,
                        word_id: e.word_id,
                        char_type: CategoryType::empty(),
                        feature: Cow::Borrowed(feature),
                    });
                }
            }

            unknown.clear();
            dic.unknown()
                .provide(sentence, pos, !candidates.is_empty(), &mut unknown)?;
            candidates.extend(unknown.drain(..).map(|u| Candidate::unknown(u, unk_feature)));

            if constrained {
                self.filter_candidates(dic, sentence, pos, &mut candidates)?;
            }

            for c in candidates.drain(..) {
                self.connect(conn, pos, c, keep_paths);
            }
        }

        self.connect_eos(conn, len, keep_paths)
    }

    /// Inserts a node beginning at `pos`, linking it to its best predecessor
    fn connect(
        &mut self,
        conn: &ConnectionMatrix,
        pos: usize,
        c: Candidate,
        keep_paths: bool,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let path_start = self.paths.len();
        let mut best: Option<(NodeId, i64)> = None;

        for &lid in self.end_nodes[pos].iter() {
            let l_node = &self.nodes[lid.index()];
            let connect_cost = conn.cost(l_node.right_id(), c.left_id) as i32;
            let new_cost = l_node.total_cost() + connect_cost as i64 + c.cost as i64;
            if best.map_or(true, |(_, cost)| new_cost < cost) {
                best = Some((lid, new_cost));
            }
            if keep_paths {
                self.paths.push(Path {
                    lnode: lid,
                    rnode: id,
                    cost: connect_cost + c.cost,
                    prob: 0.0,
                });
            }
        }

        let (prev, total_cost) = match best {
            Some((p, cost)) => (Some(p), cost),
            None => (None, i64::MAX),
        };
        let node = Node {
            id,
            begin: pos,
            end: c.end,
            left_id: c.left_id,
            right_id: c.right_id,
            word_cost: c.cost,
            stat: c.stat,
            word_id: c.word_id,
            char_type: c.char_type,
            feature: 0..0,
            total_cost,
            prev,
            is_best: false,
            lpath: path_start..self.paths.len(),
            alpha: 0.0,
            beta: 0.0,
            prob: 0.0,
        };
        let id = self.add_node(node, &c.feature);
        self.begin_nodes[pos].push(id);
        if c.stat != NodeStat::Eos {
            self.end_nodes[c.end].push(id);
        }
        id
    }

    fn connect_eos(
        &mut self,
        conn: &ConnectionMatrix,
        len: usize,
        keep_paths: bool,
    ) -> KeitaisoResult<()> {
        if self.end_nodes[len].is_empty() {
            return Err(ParseError::Disconnected.into());
        }
        let eos = Candidate {
            end: len,
            left_id: 0,
            right_id: 0,
            cost: 0,
            stat: NodeStat::Eos,
            word_id: WordId::EOS,
            char_type: CategoryType::empty(),
            feature: Cow::Borrowed(SENTINEL_FEATURE),
        };
        let eos = self.connect(conn, len, eos, keep_paths);

        let mut path = Vec::new();
        let mut cur = Some(eos);
        while let Some(id) = cur {
            path.push(id);
            cur = self.nodes[id.index()].prev();
        }
        path.reverse();
        self.set_best(path);
        Ok(())
    }

    /// Replaces partial input with the plain sentence and sets the constraints it describes
    fn prepare_partial(&mut self) -> Result<(), ParseError> {
        let source = match self.partial_source.take() {
            Some(s) => s,
            None => std::mem::take(&mut self.sentence),
        };
        let parsed = parse_partial_input(&source);
        self.partial_source = Some(source);
        let (sentence, tokens) = parsed?;

        self.sentence = sentence;
        self.boundaries.clear();
        self.feature_constraints.clear();
        for t in tokens {
            self.set_boundary_constraint(t.begin, BoundaryConstraint::TokenBoundary)?;
            self.set_boundary_constraint(t.end, BoundaryConstraint::TokenBoundary)?;
            if let Some(f) = t.feature {
                self.set_feature_constraint(t.begin, t.end, f)?;
            }
        }
        Ok(())
    }

    /// Validates constraints, returns if there are any
    fn prepare_constraints(&mut self) -> Result<bool, ParseError> {
        if !self.has_constraints() {
            return Ok(false);
        }
        for (a, b) in self.feature_constraints.iter().tuple_windows() {
            a.check_overlap(b.begin, b.end)?;
        }
        let len = self.sentence.len();
        if self.boundaries.len() != len + 1 {
            // sentence has changed since the constraints were set
            if !self.boundaries.is_empty() {
                return Err(ParseError::ConstraintOutOfRange(
                    self.boundaries.len() - 1,
                    self.boundaries.len() - 1,
                    len,
                ));
            }
            self.boundaries.resize(len + 1, BoundaryConstraint::Any);
        }
        self.boundaries[0] = BoundaryConstraint::TokenBoundary;
        self.boundaries[len] = BoundaryConstraint::TokenBoundary;
        Ok(true)
    }

    /// Keeps only candidates which conform to the constraints at `pos`
    ///
    /// When nothing conforms, unknown words spanning to the next possible boundary are tried,
    /// then a bare node carrying the constraint feature.
    fn filter_candidates<'m, D: DictionaryAccess + ?Sized>(
        &self,
        dic: &'m D,
        sentence: &str,
        pos: usize,
        candidates: &mut Vec<Candidate<'m>>,
    ) -> KeitaisoResult<()> {
        let len = sentence.len();
        let strong = (pos + 1..=len)
            .find(|&p| self.boundaries[p] == BoundaryConstraint::TokenBoundary)
            .unwrap_or(len);
        let weak = (pos + 1..=strong)
            .find(|&p| {
                sentence.is_char_boundary(p)
                    && self.boundaries[p] != BoundaryConstraint::InsideToken
            })
            .unwrap_or(strong);
        let pattern = self.feature_constraint(pos).map(|c| c.feature.as_str());
        let conforms = |c: &Candidate| {
            c.end <= strong
                && self.boundaries[c.end] != BoundaryConstraint::InsideToken
                && pattern.map_or(true, |p| partial_match(p, &c.feature))
        };

        for c in candidates.iter_mut() {
            if c.stat == NodeStat::Unknown && c.end > strong {
                c.end = strong;
            }
        }
        let kept: Vec<Candidate<'m>> = candidates
            .drain(..)
            .filter(|c| conforms(c))
            .unique_by(|c| (c.end, c.word_id))
            .collect();
        *candidates = kept;
        if !candidates.is_empty() {
            return Ok(());
        }

        let mut unknown = Vec::new();
        dic.unknown().provide(sentence, pos, false, &mut unknown)?;
        let unk_feature = dic.unknown_feature();
        candidates.extend(
            unknown
                .into_iter()
                .map(|u| {
                    let mut c = Candidate::unknown(u, unk_feature);
                    c.end = weak;
                    c
                })
                .filter(|c| conforms(c))
                .unique_by(|c| c.word_id),
        );
        if !candidates.is_empty() {
            return Ok(());
        }

        candidates.push(Candidate {
            end: weak,
            left_id: 0,
            right_id: 0,
            cost: 0,
            stat: NodeStat::Unknown,
            word_id: WordId::CONSTRAINED,
            char_type: CategoryType::DEFAULT,
            feature: Cow::Owned(pattern.unwrap_or("*").to_owned()),
        });
        Ok(())
    }
}
