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

//! Formatting of analysis results

use std::collections::HashMap;

use crate::analysis::{Lattice, NodeRef, NodeStat, RequestType};
use crate::config::{Config, ConfigError, FormatTemplates};
use crate::error::{KeitaisoResult, ParseError};

pub mod format;

pub use format::Template;

pub const DEFAULT_NODE_FORMAT: &str = "%m\\t%H\\n";
pub const DEFAULT_EOS_FORMAT: &str = "EOS\\n";

const DUMP_FORMAT: &str = "%pn %m %H %ps %pe %phl %phr %s %pw %pC %pc %pb %pP %pA %pB\\n";

/// Templates of a built-in output format
pub fn builtin_format(name: &str) -> Option<FormatTemplates> {
    let set = |node: &str, bos: &str, eos: &str| FormatTemplates {
        node: Some(node.to_owned()),
        unk: None,
        bos: Some(bos.to_owned()),
        eos: Some(eos.to_owned()),
        eon: None,
    };
    match name {
        "wakati" => Some(set("%m ", "", "\\n")),
        "dump" => Some(set(DUMP_FORMAT, DUMP_FORMAT, DUMP_FORMAT)),
        "none" => Some(FormatTemplates::default()),
        _ => None,
    }
}

/// Renders lattices with the node, unknown node, BOS, EOS and end of N-best templates
#[derive(Debug, Clone)]
pub struct Writer {
    node: Template,
    unk: Template,
    bos: Template,
    eos: Template,
    eon: Template,
}

impl Writer {
    /// Compiles the templates, unset ones get the defaults
    ///
    /// The unknown node template defaults to the node template.
    pub fn new(templates: &FormatTemplates) -> Result<Writer, ConfigError> {
        let node = templates.node.as_deref().unwrap_or(DEFAULT_NODE_FORMAT);
        let unk = templates.unk.as_deref().unwrap_or(node);
        Ok(Writer {
            node: Template::parse(node)?,
            unk: Template::parse(unk)?,
            bos: Template::parse(templates.bos.as_deref().unwrap_or(""))?,
            eos: Template::parse(templates.eos.as_deref().unwrap_or(DEFAULT_EOS_FORMAT))?,
            eon: Template::parse(templates.eon.as_deref().unwrap_or(""))?,
        })
    }

    /// Writer of a named format, formats of the config file come before built-in ones
    pub fn named(
        name: &str,
        formats: &HashMap<String, FormatTemplates>,
    ) -> Result<Writer, ConfigError> {
        match formats.get(name).cloned().or_else(|| builtin_format(name)) {
            Some(t) => Writer::new(&t),
            None => Err(ConfigError::InvalidFormat(format!("unknown output format {}", name))),
        }
    }

    /// A named format (`-O`) takes the place of all individual templates
    pub fn from_config(config: &Config) -> Result<Writer, ConfigError> {
        match &config.output_format_type {
            Some(name) => {
                if !config.templates.is_empty() {
                    tracing::warn!(
                        "output format {} overrides node, unk, bos, eos and eon formats",
                        name
                    );
                }
                Writer::named(name, &config.output_formats)
            }
            None => Writer::new(&config.templates),
        }
    }

    fn write_node(&self, lattice: &Lattice, node: &NodeRef, out: &mut String) -> std::fmt::Result {
        match node.stat() {
            NodeStat::Bos => self.bos.render(lattice, node, out),
            NodeStat::Eos => self.eos.render(lattice, node, out),
            NodeStat::Unknown => self.unk.render(lattice, node, out),
            NodeStat::Normal => self.node.render(lattice, node, out),
        }
    }

    /// Writes the current path of an analyzed lattice
    ///
    /// With the ALL_MORPHS request all nodes are written in the order of their begin position.
    pub fn write_lattice(&self, lattice: &Lattice, out: &mut String) -> KeitaisoResult<()> {
        let (bos, eos) = match (lattice.bos_node(), lattice.eos_node()) {
            (Some(b), Some(e)) => (b, e),
            _ => return Err(ParseError::NotInitialized.into()),
        };
        self.write_node(lattice, &bos, out)?;
        if lattice.has_request_type(RequestType::ALL_MORPHS) {
            for pos in 0..lattice.len() {
                for node in lattice.begin_nodes(pos) {
                    self.write_node(lattice, &node, out)?;
                }
            }
        } else {
            for node in lattice.best_path().filter(|n| !n.is_sentinel()) {
                self.write_node(lattice, &node, out)?;
            }
        }
        self.write_node(lattice, &eos, out)?;
        Ok(())
    }

    /// Writes the EOS line for input that produced no lattice
    ///
    /// Node escapes of the EOS template render as nothing.
    pub fn write_empty(&self, sentence: &str, out: &mut String) -> KeitaisoResult<()> {
        self.eos.render_sentence(sentence, out)?;
        Ok(())
    }

    /// Writes the end of N-best marker
    pub fn write_eon(&self, lattice: &Lattice, out: &mut String) -> KeitaisoResult<()> {
        if let Some(eos) = lattice.eos_node() {
            self.eon.render(lattice, &eos, out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use claim::{assert_matches, assert_ok};

    #[test]
    fn builtin_names() {
        assert!(builtin_format("wakati").is_some());
        assert!(builtin_format("dump").is_some());
        assert_eq!(builtin_format("none"), Some(FormatTemplates::default()));
        assert!(builtin_format("chasen").is_none());
    }

    #[test]
    fn named_formats() {
        let mut formats = HashMap::new();
        formats.insert(
            "surface".to_owned(),
            FormatTemplates {
                node: Some("%m|".to_owned()),
                ..FormatTemplates::default()
            },
        );
        assert_ok!(Writer::named("surface", &formats));
        assert_ok!(Writer::named("wakati", &formats));
        assert_matches!(Writer::named("chasen", &formats), Err(ConfigError::InvalidFormat(_)));
    }

    #[test]
    fn invalid_template_fails_at_construction() {
        let t = FormatTemplates {
            eos: Some("%z".to_owned()),
            ..FormatTemplates::default()
        };
        assert_matches!(Writer::new(&t), Err(ConfigError::InvalidFormat(_)));
    }

    #[test]
    fn empty_input_uses_eos_template() {
        let mut out = String::new();
        let writer = assert_ok!(Writer::new(&FormatTemplates::default()));
        assert_ok!(writer.write_empty("", &mut out));
        assert_eq!(out, "EOS\n");

        out.clear();
        let wakati = assert_ok!(Writer::named("wakati", &HashMap::new()));
        assert_ok!(wakati.write_empty("", &mut out));
        assert_eq!(out, "\n");

        out.clear();
        let custom = FormatTemplates {
            eos: Some("<%S/>\\n".to_owned()),
            ..FormatTemplates::default()
        };
        assert_ok!(assert_ok!(Writer::new(&custom)).write_empty("未解析", &mut out));
        assert_eq!(out, "<未解析/>\n");
    }

    #[test]
    fn not_analyzed() {
        let lattice = Lattice::new();
        let mut out = String::new();
        let writer = assert_ok!(Writer::new(&FormatTemplates::default()));
        assert!(writer.write_lattice(&lattice, &mut out).is_err());
    }
}
