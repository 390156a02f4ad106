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

mod build;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use keitaiso::analysis::DictionaryAccess;
use keitaiso::config::{Config, Options};
use keitaiso::prelude::*;

const LOG_ENV: &str = "KEITAISO_LOG";

/// A lattice-based morphological analyzer
#[derive(StructOpt)]
#[structopt(name = "keitaiso")]
struct Cli {
    /// Input text files: If not present, read from STDIN
    #[structopt(parse(from_os_str))]
    files: Vec<PathBuf>,

    /// Output text file: If not present, use stdout
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output_file: Option<PathBuf>,

    /// Prints the loaded dictionaries and exits
    #[structopt(short = "D", long = "dictionary-info")]
    dictionary_info: bool,

    /// Writes the whole lattice of each sentence to stderr
    #[structopt(long = "dump-lattice")]
    dump_lattice: bool,

    #[structopt(flatten)]
    options: Options,
}

fn main() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if build::is_build_mode() {
        build::build_main();
        return;
    }

    let args: Cli = Cli::from_args();
    if let Err(e) = run(args) {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn run(args: Cli) -> KeitaisoResult<()> {
    let config = Config::from_options(&args.options)?;
    let model = Model::from_config(&config)?;

    // output: stdout or file
    let mut writer: Box<dyn Write> = match &args.output_file {
        Some(output_path) => Box::new(BufWriter::new(File::create(output_path).map_err(|e| {
            KeitaisoError::from(e).with_context(format!("failed to open {}", output_path.display()))
        })?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    if args.dictionary_info {
        for info in model.dictionary_info() {
            writeln!(writer, "{}", info)?;
        }
        writer.flush()?;
        return Ok(());
    }

    let mut tagger = model.create_tagger();

    // input: stdin or files
    let readers: Vec<Box<dyn BufRead>> = if args.files.is_empty() {
        vec![Box::new(BufReader::new(io::stdin()))]
    } else {
        args.files
            .iter()
            .map(|p| -> KeitaisoResult<Box<dyn BufRead>> {
                let file = File::open(p).map_err(|e| {
                    KeitaisoError::from(e).with_context(format!("failed to open {}", p.display()))
                })?;
                Ok(Box::new(BufReader::new(file)))
            })
            .collect::<KeitaisoResult<_>>()?
    };

    for reader in readers {
        if tagger.partial() {
            analyze_partial(&mut tagger, reader, &mut writer, args.dump_lattice)?;
        } else {
            for line in reader.lines() {
                analyze_sentence(&mut tagger, &line?, &mut writer, args.dump_lattice)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Partial input is a block of `surface[\tfeature]` lines terminated by `EOS`
fn analyze_partial<W: Write>(
    tagger: &mut Tagger<&Model>,
    reader: Box<dyn BufRead>,
    writer: &mut W,
    dump: bool,
) -> KeitaisoResult<()> {
    let mut block = String::new();
    for line in reader.lines() {
        let line = line?;
        block.push_str(&line);
        block.push('\n');
        if line == "EOS" {
            analyze_sentence(tagger, &block, writer, dump)?;
            block.clear();
        }
    }
    if !block.trim().is_empty() {
        analyze_sentence(tagger, &block, writer, dump)?;
    }
    Ok(())
}

fn analyze_sentence<W: Write>(
    tagger: &mut Tagger<&Model>,
    input: &str,
    writer: &mut W,
    dump: bool,
) -> KeitaisoResult<()> {
    if input.is_empty() {
        return write_empty(tagger, input, writer);
    }
    match tagger.parse(input) {
        Ok(result) => writer.write_all(result.as_bytes())?,
        Err(e) if e.as_parse_error().is_some() => {
            tracing::warn!("failed to analyze {:?}: {}", input, e);
            return write_empty(tagger, input, writer);
        }
        Err(e) => return Err(e),
    }
    if dump {
        let model = tagger.model();
        tagger.lattice().dump(model.connection(), &mut io::stderr())?;
    }
    Ok(())
}

/// Input without a lattice still ends with the configured EOS line
fn write_empty<W: Write>(
    tagger: &Tagger<&Model>,
    input: &str,
    writer: &mut W,
) -> KeitaisoResult<()> {
    let mut out = String::new();
    tagger.model().writer().write_empty(input, &mut out)?;
    writer.write_all(out.as_bytes())?;
    Ok(())
}
