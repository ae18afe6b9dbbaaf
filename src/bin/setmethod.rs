//! Rewrite the `<method>` entries of one group.
//!
//! Run with: `setmethod -i adioscfg.xml --in-place READ_METHOD MPI verbose=1`

use anyhow::Result;
use clap::Parser;
use config_patcher::cli::{self, CommonArgs};
use config_patcher::{Patch, Variant};
use std::path::PathBuf;

/// Set the method and params of every `<method>` entry in GROUP.
#[derive(Parser, Debug)]
#[command(name = "setmethod", version, about, long_about = None)]
struct Args {
    /// Input XML config
    #[arg(short, long, default_value = Variant::Method.default_file())]
    infile: PathBuf,

    #[command(flatten)]
    common: CommonArgs,

    /// Group name
    group: String,

    /// New method
    method: String,

    /// New params
    #[arg(default_value = Variant::Method.default_params())]
    params: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_logging(&args.common.log_level)?;

    let patch = Patch::new(args.group, args.method, args.params);
    let opts = args
        .common
        .into_options(Variant::Method, args.infile, patch);
    cli::execute(&opts)?;
    Ok(())
}
