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
use std::sync::Arc;

use crate::analysis::{Lattice, RequestType};
use crate::error::KeitaisoResult;
use crate::model::Model;

/// Analyzes sentences with a shared model
///
/// A tagger keeps the request configuration and a lattice which is reused
/// between requests. Use one tagger per thread and share the model.
pub struct Tagger<M: Deref<Target = Model>> {
    model: M,
    lattice: Lattice,
    request_type: RequestType,
    theta: f64,
    nbest: usize,
    what: Option<String>,
}

impl Tagger<Arc<Model>> {
    /// Creates a tagger which owns its model
    pub fn new(args: &str) -> KeitaisoResult<Self> {
        let model = Arc::new(Model::new(args)?);
        Ok(Tagger::with_model(model))
    }
}

impl<M: Deref<Target = Model>> Tagger<M> {
    /// Creates a tagger with the request configuration of the model options
    pub fn with_model(model: M) -> Self {
        let config = model.config();
        let request_type = config.request_type;
        let theta = config.theta;
        let nbest = config.nbest;
        Tagger {
            model,
            lattice: Lattice::new(),
            request_type,
            theta,
            nbest,
            what: None,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Lattice of the last request
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    fn prepare(&mut self, text: &str, extra: RequestType) {
        self.lattice.set_sentence(text);
        self.lattice.set_request_type(self.request_type | extra);
        self.lattice.set_theta(self.theta);
    }

    fn analyze(&mut self) -> KeitaisoResult<()> {
        let result = self.lattice.analyze(&*self.model);
        self.what = result.as_ref().err().map(|e| e.to_string());
        result
    }

    /// Analyzes the text and formats the best path
    ///
    /// If the number of results was set above one, the N best paths are formatted instead.
    pub fn parse(&mut self, text: &str) -> KeitaisoResult<String> {
        if self.nbest > 1 {
            return self.parse_nbest(self.nbest, text);
        }
        self.prepare(text, RequestType::empty());
        self.analyze()?;
        let mut out = String::new();
        self.model.writer().write_lattice(&self.lattice, &mut out)?;
        Ok(out)
    }

    /// Analyzes the text, nodes of the best path are available with [`Lattice::best_path`]
    pub fn parse_to_nodes(&mut self, text: &str) -> KeitaisoResult<&Lattice> {
        self.prepare(text, RequestType::empty());
        self.analyze()?;
        Ok(&self.lattice)
    }

    /// Analyzes the sentence of the lattice with its own request type and theta
    ///
    /// Returns false when the analysis failed, the reason is in [`Lattice::what`].
    pub fn parse_lattice(&self, lattice: &mut Lattice) -> bool {
        match self.try_parse_lattice(lattice) {
            Ok(()) => true,
            Err(e) => {
                lattice.set_what(e.to_string());
                false
            }
        }
    }

    pub fn try_parse_lattice(&self, lattice: &mut Lattice) -> KeitaisoResult<()> {
        lattice.analyze(&*self.model)
    }

    /// Formats the `n` best paths followed by the end of N-best marker
    pub fn parse_nbest(&mut self, n: usize, text: &str) -> KeitaisoResult<String> {
        self.parse_nbest_init(text)?;
        let writer = self.model.writer();
        let mut out = String::new();
        for _ in 0..n {
            if !self.lattice.next() {
                break;
            }
            writer.write_lattice(&self.lattice, &mut out)?;
        }
        writer.write_eon(&self.lattice, &mut out)?;
        Ok(out)
    }

    /// Starts a lazy N-best enumeration, paths are taken with [`Tagger::next`]
    pub fn parse_nbest_init(&mut self, text: &str) -> KeitaisoResult<()> {
        self.prepare(text, RequestType::NBEST);
        self.analyze()
    }

    /// Moves to the next best path, false when there are no more paths
    pub fn next(&mut self) -> bool {
        self.lattice.next()
    }

    /// Formats the next best path
    pub fn next_string(&mut self) -> KeitaisoResult<Option<String>> {
        if !self.lattice.next() {
            return Ok(None);
        }
        self.format_lattice(&self.lattice).map(Some)
    }

    /// Formats the current path of an analyzed lattice
    pub fn format_lattice(&self, lattice: &Lattice) -> KeitaisoResult<String> {
        let mut out = String::new();
        self.model.writer().write_lattice(lattice, &mut out)?;
        Ok(out)
    }

    /// Message of the last failed request
    pub fn what(&self) -> Option<&str> {
        self.what.as_deref()
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn set_theta(&mut self, theta: f64) {
        self.theta = theta;
    }

    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    pub fn set_request_type(&mut self, request_type: RequestType) {
        self.request_type = request_type;
    }

    fn set_flag(&mut self, flag: RequestType, value: bool) {
        self.request_type.set(flag, value);
    }

    pub fn partial(&self) -> bool {
        self.request_type.contains(RequestType::PARTIAL)
    }

    pub fn set_partial(&mut self, partial: bool) {
        self.set_flag(RequestType::PARTIAL, partial)
    }

    pub fn all_morphs(&self) -> bool {
        self.request_type.contains(RequestType::ALL_MORPHS)
    }

    pub fn set_all_morphs(&mut self, all_morphs: bool) {
        self.set_flag(RequestType::ALL_MORPHS, all_morphs)
    }

    pub fn marginal(&self) -> bool {
        self.request_type.contains(RequestType::MARGINAL_PROB)
    }

    pub fn set_marginal(&mut self, marginal: bool) {
        self.set_flag(RequestType::MARGINAL_PROB, marginal)
    }

    /// Number of results of [`Tagger::parse`]
    pub fn nbest(&self) -> usize {
        self.nbest
    }

    /// Values above one also set the NBEST request
    pub fn set_nbest(&mut self, nbest: usize) {
        self.nbest = nbest.max(1);
        if self.nbest > 1 {
            self.request_type |= RequestType::NBEST;
        }
    }
}
