//! Pieces shared by the `setmethod` and `settransport` binaries.

use crate::patch::{self, MissingGroup, Patch, PatchOptions, Report, Variant};
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Flags both binaries accept.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Output file [default: same as --infile]
    #[arg(short, long, value_name = "OUTFILE")]
    pub outfile: Option<PathBuf>,

    /// Allow the output to overwrite the input file
    #[arg(long)]
    pub in_place: bool,

    /// Treat entries without a `group` attribute as non-matching instead of failing
    #[arg(long)]
    pub skip_missing_group: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,
}

impl CommonArgs {
    pub fn into_options(self, variant: Variant, infile: PathBuf, patch: Patch) -> PatchOptions {
        let outfile = self.outfile.unwrap_or_else(|| infile.clone());
        let missing_group = if self.skip_missing_group {
            MissingGroup::Skip
        } else {
            MissingGroup::Fail
        };
        PatchOptions::new(variant, patch)
            .infile(infile)
            .outfile(outfile)
            .in_place(self.in_place)
            .missing_group(missing_group)
    }
}

/// Logs go to stderr, stdout is kept for the progress lines.
pub fn init_logging(level: &str) -> Result<()> {
    let log_level = level.parse().unwrap_or(Level::WARN);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

pub fn execute(opts: &PatchOptions) -> Result<Report> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    patch::run(opts, &mut out).with_context(|| {
        format!(
            "failed to patch <{}> entries of {}",
            opts.variant.tag(),
            opts.infile.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Harness {
        #[command(flatten)]
        common: CommonArgs,
    }

    #[test]
    fn test_outfile_defaults_to_infile() {
        let args = Harness::parse_from(["prog"]);
        let opts = args.common.into_options(
            Variant::Method,
            PathBuf::from("cfg.xml"),
            Patch::new("g", "m", "p"),
        );
        assert_eq!(opts.outfile, PathBuf::from("cfg.xml"));
        assert!(!opts.in_place);
        assert_eq!(opts.missing_group, MissingGroup::Fail);
    }

    #[test]
    fn test_flags() {
        let args = Harness::parse_from([
            "prog",
            "-o",
            "out.xml",
            "--in-place",
            "--skip-missing-group",
            "-l",
            "debug",
        ]);
        assert_eq!(args.common.log_level, "debug");
        let opts = args.common.into_options(
            Variant::Transport,
            PathBuf::from("writer.xml"),
            Patch::new("writer", "POSIX", "verbose=3"),
        );
        assert_eq!(opts.outfile, PathBuf::from("out.xml"));
        assert!(opts.in_place);
        assert_eq!(opts.missing_group, MissingGroup::Skip);
    }
}
