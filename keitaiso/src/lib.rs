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

//! Lattice-based morphological analyzer
//!
//! Dictionaries, the connection matrix and the unknown word policy are loaded
//! once into a [`Model`](model/struct.Model.html), which is shared by any number of
//! [`Tagger`](tagger/struct.Tagger.html)s. A tagger builds a lattice of candidate
//! words for each sentence and finds the best path, the N best paths
//! or marginal probabilities of words.
//!
//! ```no_run
//! use keitaiso::prelude::*;
//!
//! let model = Model::new("-d /path/to/dic")?;
//! let mut tagger = model.create_tagger();
//! print!("{}", tagger.parse("すもももももももものうち")?);
//! # Ok::<(), KeitaisoError>(())
//! ```

pub mod analysis;
pub mod config;
pub mod dic;
pub mod error;
pub mod model;
pub mod output;
pub mod tagger;
pub mod unknown;

pub mod prelude {
    pub use crate::{
        analysis::{Lattice, NodeRef, NodeStat, RequestType},
        error::{KeitaisoError, KeitaisoResult},
        model::Model,
        tagger::Tagger,
    };
}
