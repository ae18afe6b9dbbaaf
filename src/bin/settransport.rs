//! Rewrite the `<transport>` entries of one group.
//!
//! Run with: `settransport -i writer.xml -o patched.xml FLEXPATH`

use anyhow::Result;
use clap::Parser;
use config_patcher::cli::{self, CommonArgs};
use config_patcher::patch::{TRANSPORT_DEFAULT_GROUP, TRANSPORT_DEFAULT_METHOD};
use config_patcher::{Patch, Variant};
use std::path::PathBuf;

/// Set the method and params of every `<transport>` entry in a group.
#[derive(Parser, Debug)]
#[command(name = "settransport", version, about, long_about = None)]
struct Args {
    /// Input XML config
    #[arg(short, long, default_value = Variant::Transport.default_file())]
    infile: PathBuf,

    /// Group name
    #[arg(long, default_value = TRANSPORT_DEFAULT_GROUP)]
    group: String,

    #[command(flatten)]
    common: CommonArgs,

    /// New method
    #[arg(default_value = TRANSPORT_DEFAULT_METHOD)]
    method: String,

    /// New params
    #[arg(default_value = Variant::Transport.default_params())]
    params: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_logging(&args.common.log_level)?;

    let patch = Patch::new(args.group, args.method, args.params);
    let opts = args
        .common
        .into_options(Variant::Transport, args.infile, patch);
    cli::execute(&opts)?;
    Ok(())
}
