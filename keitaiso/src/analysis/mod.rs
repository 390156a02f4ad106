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

use std::ops::Deref;

use bitflags::bitflags;

use crate::dic::connect::ConnectionMatrix;
use crate::dic::lexicon_set::LexiconSet;
use crate::unknown::UnknownWordProvider;

pub mod constraint;
pub mod lattice;
mod marginal;
pub mod nbest;
pub mod node;
mod viterbi;

pub use constraint::{BoundaryConstraint, FeatureConstraint};
pub use lattice::Lattice;
pub use node::{Node, NodeId, NodeRef, NodeStat, Path};

bitflags! {
    /// What an analysis request should compute
    ///
    /// Values are compatible with the MeCab request type flags.
    #[derive(Default)]
    pub struct RequestType: u32 {
        /// Only the best path
        const ONE_BEST = 1;
        /// Keep all connections for the N-best search
        const NBEST = 2;
        /// Sentence is a partially annotated text, see [`constraint`]
        const PARTIAL = 4;
        /// Compute marginal probabilities of nodes and paths
        const MARGINAL_PROB = 8;
        /// Output alternative morphemes
        const ALTERNATIVE = 16;
        /// Output all morphemes of the lattice instead of the best path
        const ALL_MORPHS = 32;
        /// Copy the sentence into the lattice
        const ALLOCATE_SENTENCE = 64;
    }
}

impl RequestType {
    /// Paths between nodes have to be stored for these requests
    pub fn needs_paths(self) -> bool {
        self.intersects(RequestType::NBEST | RequestType::MARGINAL_PROB)
    }
}

/// Provides access to dictionary data
pub trait DictionaryAccess {
    fn lexicon(&self) -> &LexiconSet;
    fn connection(&self) -> &ConnectionMatrix;
    fn unknown(&self) -> &dyn UnknownWordProvider;

    /// Replaces the feature of all unknown words if present
    fn unknown_feature(&self) -> Option<&str> {
        None
    }
}

impl<T> DictionaryAccess for T
where
    T: Deref,
    <T as Deref>::Target: DictionaryAccess,
{
    fn lexicon(&self) -> &LexiconSet {
        <T as Deref>::deref(self).lexicon()
    }

    fn connection(&self) -> &ConnectionMatrix {
        <T as Deref>::deref(self).connection()
    }

    fn unknown(&self) -> &dyn UnknownWordProvider {
        <T as Deref>::deref(self).unknown()
    }

    fn unknown_feature(&self) -> Option<&str> {
        <T as Deref>::deref(self).unknown_feature()
    }
}
