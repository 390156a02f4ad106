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

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use structopt::StructOpt;
use thiserror::Error;

use crate::analysis::lattice::DEFAULT_THETA;
use crate::analysis::RequestType;
use crate::unknown::simple::SimpleUnknownSettings;
use crate::unknown::DEFAULT_MAX_GROUPING_SIZE;

pub const DEFAULT_SETTING_FILE: &str = "keitaiso.json";
const DEFAULT_SYSTEM_DICT: &str = "sys.dic";
const DEFAULT_MATRIX_BIN: &str = "matrix.bin";
const DEFAULT_MATRIX_DEF: &str = "matrix.def";
const DEFAULT_CHAR_DEF_FILE: &str = "char.def";
const DEFAULT_UNK_DEF_FILE: &str = "unk.def";

const KNOWN_KEYS: &[&str] = &[
    "systemDict",
    "userDict",
    "matrix",
    "characterDefinitionFile",
    "unknownDefinitionFile",
    "unknownPolicy",
    "simpleUnknown",
    "maxGroupingSize",
    "theta",
    "outputFormats",
    "nodeFormat",
    "unkFormat",
    "bosFormat",
    "eosFormat",
    "eonFormat",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("{0}")]
    Options(#[from] structopt::clap::Error),

    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Argument {0} is missing")]
    MissingArgument(String),
}

/// Options of a model and of its taggers
///
/// They are given as a single string which is split on whitespace,
/// so values can't contain spaces. Use `\s` in format templates instead.
#[derive(StructOpt, Debug, Clone, PartialEq)]
#[structopt(name = "keitaiso")]
pub struct Options {
    /// Dictionary directory
    #[structopt(short = "d", long = "dicdir", parse(from_os_str))]
    pub dicdir: Option<PathBuf>,

    /// Config file in JSON format, `<dicdir>/keitaiso.json` is used if present
    #[structopt(short = "r", long = "rcfile", parse(from_os_str))]
    pub rcfile: Option<PathBuf>,

    /// User dictionary, can be repeated or comma separated
    #[structopt(short = "u", long = "userdic", number_of_values = 1)]
    pub userdic: Vec<String>,

    /// Named output format: wakati, dump, none or one from the config file
    #[structopt(short = "O", long = "output-format-type")]
    pub output_format_type: Option<String>,

    #[structopt(short = "F", long = "node-format")]
    pub node_format: Option<String>,

    #[structopt(short = "U", long = "unk-format")]
    pub unk_format: Option<String>,

    #[structopt(short = "B", long = "bos-format")]
    pub bos_format: Option<String>,

    #[structopt(short = "E", long = "eos-format")]
    pub eos_format: Option<String>,

    /// Printed after the last of N-best results
    #[structopt(short = "S", long = "eon-format")]
    pub eon_format: Option<String>,

    /// Number of results
    #[structopt(short = "N", long = "nbest", default_value = "1")]
    pub nbest: usize,

    /// Temperature of marginal probabilities
    #[structopt(short = "t", long = "theta")]
    pub theta: Option<f64>,

    /// Input is partially annotated
    #[structopt(short = "p", long = "partial")]
    pub partial: bool,

    /// Output all morphemes of the lattice
    #[structopt(short = "a", long = "all-morphs")]
    pub all_morphs: bool,

    /// Compute marginal probabilities
    #[structopt(short = "m", long = "marginal")]
    pub marginal: bool,

    #[structopt(short = "C", long = "allocate-sentence")]
    pub allocate_sentence: bool,

    /// Deprecated, 1 is the same as -N2 and 2 the same as -m
    #[structopt(short = "l", long = "lattice-level", default_value = "0")]
    pub lattice_level: u32,

    /// Maximal number of characters grouped into a single unknown word
    #[structopt(short = "M", long = "max-grouping-size")]
    pub max_grouping_size: Option<usize>,

    /// Feature of all unknown words
    #[structopt(short = "x", long = "unk-feature")]
    pub unk_feature: Option<String>,
}

impl Options {
    /// Parses a whitespace separated option string
    pub fn parse(args: &str) -> Result<Options, ConfigError> {
        let argv = std::iter::once("keitaiso").chain(args.split_whitespace());
        Ok(Options::from_iter_safe(argv)?)
    }

    pub fn request_type(&self) -> RequestType {
        let mut request = RequestType::ONE_BEST;
        if self.partial {
            request |= RequestType::PARTIAL;
        }
        if self.all_morphs {
            request |= RequestType::ALL_MORPHS;
        }
        if self.marginal || self.lattice_level >= 2 {
            request |= RequestType::MARGINAL_PROB;
        }
        if self.nbest >= 2 || self.lattice_level >= 1 {
            request |= RequestType::NBEST;
        }
        if self.allocate_sentence {
            request |= RequestType::ALLOCATE_SENTENCE;
        }
        request
    }

    fn user_dicts(&self) -> impl Iterator<Item = &str> + '_ {
        self.userdic
            .iter()
            .flat_map(|u| u.split(','))
            .filter(|u| !u.is_empty())
    }

    fn templates(&self) -> FormatTemplates {
        FormatTemplates {
            node: self.node_format.clone(),
            unk: self.unk_format.clone(),
            bos: self.bos_format.clone(),
            eos: self.eos_format.clone(),
            eon: self.eon_format.clone(),
        }
    }
}

/// Unknown word policy selected with `unknownPolicy`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    MeCab,
    Simple,
}

impl Default for UnknownPolicy {
    fn default() -> Self {
        UnknownPolicy::MeCab
    }
}

/// Templates of an output format, unset ones fall back to defaults
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatTemplates {
    pub node: Option<String>,
    pub unk: Option<String>,
    pub bos: Option<String>,
    pub eos: Option<String>,
    pub eon: Option<String>,
}

impl FormatTemplates {
    /// Fills unset templates from `other`
    pub fn or(self, other: FormatTemplates) -> FormatTemplates {
        FormatTemplates {
            node: self.node.or(other.node),
            unk: self.unk.or(other.unk),
            bos: self.bos.or(other.bos),
            eos: self.eos.or(other.eos),
            eon: self.eon.or(other.eon),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == FormatTemplates::default()
    }
}

/// Struct corresponds with raw config json file.
/// You must use field names defined here as json object key.
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Default)]
pub struct RawConfig {
    systemDict: Option<PathBuf>,
    userDict: Option<Vec<PathBuf>>,
    matrix: Option<PathBuf>,
    characterDefinitionFile: Option<PathBuf>,
    unknownDefinitionFile: Option<PathBuf>,
    unknownPolicy: Option<UnknownPolicy>,
    simpleUnknown: Option<SimpleUnknownSettings>,
    maxGroupingSize: Option<usize>,
    theta: Option<f64>,
    outputFormats: Option<HashMap<String, FormatTemplates>>,
    nodeFormat: Option<String>,
    unkFormat: Option<String>,
    bosFormat: Option<String>,
    eosFormat: Option<String>,
    eonFormat: Option<String>,
}

impl RawConfig {
    /// Reads a config file, unknown keys are skipped with a warning
    pub fn from_file(path: &Path) -> Result<RawConfig, ConfigError> {
        let file = File::open(path)?;
        let value: Value = serde_json::from_reader(BufReader::new(file))?;
        RawConfig::from_value(value, path)
    }

    fn from_value(mut value: Value, path: &Path) -> Result<RawConfig, ConfigError> {
        match value.as_object_mut() {
            Some(obj) => {
                let unknown: Vec<String> = obj
                    .keys()
                    .filter(|k| !KNOWN_KEYS.contains(&k.as_str()))
                    .cloned()
                    .collect();
                for key in unknown {
                    tracing::warn!("{}: ignoring unknown config entry {}", path.display(), key);
                    obj.remove(&key);
                }
            }
            None => {
                return Err(ConfigError::InvalidFormat(format!(
                    "{}: config must be a JSON object",
                    path.display()
                )))
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    fn templates(&self) -> FormatTemplates {
        FormatTemplates {
            node: self.nodeFormat.clone(),
            unk: self.unkFormat.clone(),
            bos: self.bosFormat.clone(),
            eos: self.eosFormat.clone(),
            eon: self.eonFormat.clone(),
        }
    }
}

/// Setting data resolved from options, the config file and defaults
///
/// Options have priority over the config file which has priority over defaults.
/// Relative paths are resolved against the dictionary directory.
#[derive(Debug, Clone)]
pub struct Config {
    pub dicdir: PathBuf,
    pub system_dict: PathBuf,
    pub user_dicts: Vec<PathBuf>,
    pub matrix: PathBuf,
    pub character_definition_file: PathBuf,
    pub unknown_definition_file: PathBuf,
    pub unknown_policy: UnknownPolicy,
    pub simple_unknown: SimpleUnknownSettings,
    pub max_grouping_size: usize,
    pub unk_feature: Option<String>,
    pub theta: f64,
    pub request_type: RequestType,
    pub nbest: usize,
    pub output_format_type: Option<String>,
    pub output_formats: HashMap<String, FormatTemplates>,
    pub templates: FormatTemplates,
}

impl Config {
    /// Config from a whitespace separated option string
    pub fn from_args(args: &str) -> Result<Config, ConfigError> {
        Config::from_options(&Options::parse(args)?)
    }

    pub fn from_options(options: &Options) -> Result<Config, ConfigError> {
        let dicdir = match &options.dicdir {
            Some(d) => d.clone(),
            None => return Err(ConfigError::MissingArgument("dicdir".to_owned())),
        };
        if !dicdir.is_dir() {
            return Err(ConfigError::FileNotFound(dicdir));
        }

        let rcfile = match &options.rcfile {
            Some(f) if f.is_file() => Some(f.clone()),
            Some(f) => return Err(ConfigError::FileNotFound(f.clone())),
            None => Some(dicdir.join(DEFAULT_SETTING_FILE)).filter(|f| f.is_file()),
        };
        let raw = match rcfile {
            Some(f) => RawConfig::from_file(&f)?,
            None => RawConfig::default(),
        };
        Config::resolve(options, raw, dicdir)
    }

    fn resolve(options: &Options, raw: RawConfig, dicdir: PathBuf) -> Result<Config, ConfigError> {
        let templates = options.templates().or(raw.templates());

        let system_dict = Config::join_if_relative(
            &dicdir,
            raw.systemDict.unwrap_or_else(|| PathBuf::from(DEFAULT_SYSTEM_DICT)),
        );

        // prioritize cli option > config file
        let user_dicts = if options.userdic.is_empty() {
            raw.userDict.unwrap_or_default()
        } else {
            options.user_dicts().map(PathBuf::from).collect()
        };
        let user_dicts = user_dicts
            .into_iter()
            .map(|p| Config::join_if_relative(&dicdir, p))
            .collect();

        let matrix = match raw.matrix {
            Some(p) => Config::join_if_relative(&dicdir, p),
            None => {
                let bin = dicdir.join(DEFAULT_MATRIX_BIN);
                if bin.is_file() {
                    bin
                } else {
                    dicdir.join(DEFAULT_MATRIX_DEF)
                }
            }
        };

        let character_definition_file = Config::join_if_relative(
            &dicdir,
            raw.characterDefinitionFile
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CHAR_DEF_FILE)),
        );
        let unknown_definition_file = Config::join_if_relative(
            &dicdir,
            raw.unknownDefinitionFile
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UNK_DEF_FILE)),
        );

        let unknown_policy = raw.unknownPolicy.unwrap_or_default();
        if unknown_policy == UnknownPolicy::MeCab && raw.simpleUnknown.is_some() {
            tracing::warn!("simpleUnknown is ignored with the mecab unknown word policy");
        }

        let theta = options.theta.or(raw.theta).unwrap_or(DEFAULT_THETA);
        if !theta.is_finite() || theta <= 0.0 {
            return Err(ConfigError::InvalidFormat(format!(
                "theta must be a positive number, was {}",
                theta
            )));
        }

        let max_grouping_size = options
            .max_grouping_size
            .or(raw.maxGroupingSize)
            .unwrap_or(DEFAULT_MAX_GROUPING_SIZE);

        Ok(Config {
            dicdir,
            system_dict,
            user_dicts,
            matrix,
            character_definition_file,
            unknown_definition_file,
            unknown_policy,
            simple_unknown: raw.simpleUnknown.unwrap_or_default(),
            max_grouping_size,
            unk_feature: options.unk_feature.clone(),
            theta,
            request_type: options.request_type(),
            nbest: options.nbest.max(1),
            output_format_type: options.output_format_type.clone(),
            output_formats: raw.outputFormats.unwrap_or_default(),
            templates,
        })
    }

    /// Resolves given path to a path relative to dicdir if its relative
    pub fn complete_path<P: Into<PathBuf>>(&self, file_path: P) -> PathBuf {
        Config::join_if_relative(&self.dicdir, file_path.into())
    }

    fn join_if_relative(dicdir: &Path, file_path: PathBuf) -> PathBuf {
        if file_path.is_absolute() {
            file_path
        } else {
            dicdir.join(&file_path)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use claim::{assert_matches, assert_ok};
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn parse_options() {
        let opts = assert_ok!(Options::parse("-d /tmp/dic -u a.dic,b.dic -u c.dic -N 3 -m"));
        assert_eq!(opts.dicdir, Some(PathBuf::from("/tmp/dic")));
        assert_eq!(opts.user_dicts().collect::<Vec<_>>(), ["a.dic", "b.dic", "c.dic"]);
        assert_eq!(opts.nbest, 3);
        let req = opts.request_type();
        let expected = RequestType::ONE_BEST | RequestType::NBEST | RequestType::MARGINAL_PROB;
        assert!(req.contains(expected));
        assert!(!req.contains(RequestType::PARTIAL));
    }

    #[test]
    fn lattice_level() {
        let opts = assert_ok!(Options::parse("-l 1"));
        assert_eq!(opts.request_type(), RequestType::ONE_BEST | RequestType::NBEST);
        let opts = assert_ok!(Options::parse("--lattice-level 2"));
        assert!(opts.request_type().contains(RequestType::MARGINAL_PROB));
    }

    #[test]
    fn invalid_options() {
        assert_matches!(Options::parse("--no-such-option"), Err(ConfigError::Options(_)));
        assert_matches!(Options::parse("-N many"), Err(ConfigError::Options(_)));
    }

    #[test]
    fn missing_dicdir() {
        assert_matches!(Config::from_args("-N 2"), Err(ConfigError::MissingArgument(_)));
        assert_matches!(
            Config::from_args("-d /no/such/keitaiso/dir"),
            Err(ConfigError::FileNotFound(_))
        );
    }

    #[test]
    fn defaults() {
        let dir = TempDir::new().unwrap();
        let args = format!("-d {}", dir.path().display());
        let cfg = assert_ok!(Config::from_args(&args));
        assert_eq!(cfg.system_dict, dir.path().join("sys.dic"));
        assert_eq!(cfg.matrix, dir.path().join("matrix.def"));
        assert_eq!(cfg.unknown_policy, UnknownPolicy::MeCab);
        assert_eq!(cfg.max_grouping_size, DEFAULT_MAX_GROUPING_SIZE);
        assert_eq!(cfg.theta, DEFAULT_THETA);
        assert_eq!(cfg.nbest, 1);
        assert!(cfg.user_dicts.is_empty());
        assert!(cfg.templates.is_empty());
    }

    #[test]
    fn config_file_and_priority() {
        let dir = TempDir::new().unwrap();
        let mut f = File::create(dir.path().join(DEFAULT_SETTING_FILE)).unwrap();
        write!(
            f,
            r#"{{
                "systemDict": "system.dic",
                "userDict": ["u1.dic"],
                "unknownPolicy": "simple",
                "simpleUnknown": {{ "cost": 500 }},
                "theta": 0.5,
                "maxGroupingSize": 4,
                "nodeFormat": "%m\n",
                "outputFormats": {{ "surface": {{ "node": "%m|" }} }},
                "somethingElse": 1
            }}"#
        )
        .unwrap();
        drop(f);

        let args = format!("-d {} -u u2.dic -t 0.25", dir.path().display());
        let cfg = assert_ok!(Config::from_args(&args));
        assert_eq!(cfg.system_dict, dir.path().join("system.dic"));
        assert_eq!(cfg.user_dicts, vec![dir.path().join("u2.dic")]);
        assert_eq!(cfg.unknown_policy, UnknownPolicy::Simple);
        assert_eq!(cfg.simple_unknown.cost, 500);
        assert_eq!(cfg.simple_unknown.feature, "*");
        assert_eq!(cfg.theta, 0.25);
        assert_eq!(cfg.max_grouping_size, 4);
        assert_eq!(cfg.templates.node.as_deref(), Some("%m\n"));
        assert!(cfg.output_formats.contains_key("surface"));
    }

    #[test]
    fn matrix_bin_preferred() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join(DEFAULT_MATRIX_BIN)).unwrap();
        let args = format!("-d {}", dir.path().display());
        let cfg = assert_ok!(Config::from_args(&args));
        assert_eq!(cfg.matrix, dir.path().join(DEFAULT_MATRIX_BIN));
    }

    #[test]
    fn config_must_be_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rc.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        let args = format!("-d {} -r {}", dir.path().display(), path.display());
        assert_matches!(Config::from_args(&args), Err(ConfigError::InvalidFormat(_)));
    }
}
