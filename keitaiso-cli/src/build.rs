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

use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use structopt::StructOpt;

use keitaiso::dic::build::report::DictPartReport;
use keitaiso::dic::build::DictBuilder;
use keitaiso::dic::lexicon::Lexicon;
use keitaiso::error::{KeitaisoError, KeitaisoResult};

/// Whether the first argument is `build` or `ubuild`
///
/// An existing file with that name is analyzed instead.
pub fn is_build_mode() -> bool {
    let mut args = std::env::args_os();
    let _ = args.next();
    match args.next() {
        Some(x) => (x == "build" || x == "ubuild") && !Path::new(&x).exists(),
        None => false,
    }
}

#[derive(StructOpt)]
#[structopt(name = "keitaiso")]
enum BuildCli {
    /// Builds system dictionary
    #[structopt(name = "build")]
    System {
        #[structopt(flatten)]
        common: BuildCmd,

        /// Path to matrix definition (matrix.def)
        #[structopt(short, long, parse(from_os_str))]
        matrix: PathBuf,

        /// Also writes the matrix in the binary form (matrix.bin)
        #[structopt(long = "matrix-bin", parse(from_os_str))]
        matrix_bin: Option<PathBuf>,
    },

    /// Builds user dictionary
    #[structopt(name = "ubuild")]
    User {
        #[structopt(flatten)]
        common: BuildCmd,

        /// Path to system dictionary, user entries are checked against its matrix size
        #[structopt(short = "s", long = "system", parse(from_os_str))]
        dictionary: PathBuf,
    },
}

#[derive(StructOpt)]
struct BuildCmd {
    /// Input csv files
    #[structopt(required = true, parse(from_os_str))]
    inputs: Vec<PathBuf>,

    /// Where to place compiled dictionary.
    /// If there was an existing one it will be overwritten.
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output_file: PathBuf,

    /// Charset to record in the dictionary header
    #[structopt(short = "c", long = "charset", default_value = "utf-8")]
    charset: String,
}

pub fn build_main() {
    let args: BuildCli = BuildCli::from_args();

    let result = match args {
        BuildCli::System {
            common,
            matrix,
            matrix_bin,
        } => build_system(common, matrix, matrix_bin),
        BuildCli::User { common, dictionary } => build_user(common, dictionary),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}

fn read_inputs(builder: &mut DictBuilder, cmd: &BuildCmd) -> KeitaisoResult<()> {
    builder.set_charset(cmd.charset.as_str());
    for d in cmd.inputs.iter() {
        builder
            .read_lexicon(d.as_path())
            .map_err(|e| e.with_context(format!("failed to read {}", d.display())))?;
    }
    Ok(())
}

fn write_dictionary(builder: &mut DictBuilder, output: &Path) -> KeitaisoResult<()> {
    let file = output_file(output)?;
    let mut buf_writer = BufWriter::with_capacity(16 * 1024, file);
    builder.compile(&mut buf_writer)?;
    buf_writer.flush()?;
    Ok(())
}

fn build_system(cmd: BuildCmd, matrix: PathBuf, matrix_bin: Option<PathBuf>) -> KeitaisoResult<()> {
    let mut builder = DictBuilder::new_system();
    builder
        .read_conn(matrix.as_path())
        .map_err(|e| e.with_context(format!("failed to read {}", matrix.display())))?;
    read_inputs(&mut builder, &cmd)?;
    write_dictionary(&mut builder, &cmd.output_file)?;

    if let Some(path) = matrix_bin {
        let mut buf_writer = BufWriter::new(output_file(&path)?);
        builder.write_matrix(&mut buf_writer)?;
        buf_writer.flush()?;
    }
    print_stats(builder.report());
    Ok(())
}

fn build_user(cmd: BuildCmd, system: PathBuf) -> KeitaisoResult<()> {
    let dict = Lexicon::load(&system)?;
    let header = dict.header();
    let too_large = |v: u32| KeitaisoError::InvalidRange(v as usize, u16::MAX as usize);
    let num_left = u16::try_from(header.lsize).map_err(|_| too_large(header.lsize))?;
    let num_right = u16::try_from(header.rsize).map_err(|_| too_large(header.rsize))?;

    let mut builder = DictBuilder::new_user();
    builder.set_matrix_size(num_left, num_right);
    read_inputs(&mut builder, &cmd)?;
    write_dictionary(&mut builder, &cmd.output_file)?;
    print_stats(builder.report());
    Ok(())
}

fn print_stats(report: &[DictPartReport]) {
    for part in report {
        eprintln!("{}", part);
    }
}

fn output_file(p: &Path) -> KeitaisoResult<File> {
    File::create(p).map_err(|e| {
        KeitaisoError::from(e).with_context(format!("failed to open {} for writing", p.display()))
    })
}
