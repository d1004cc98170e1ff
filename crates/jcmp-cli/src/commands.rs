use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;

use jcmp_codec::FsLoader;
use jcmp_diff::DiffNode;
use jcmp_fs::{compare_files, compare_folders, FolderComparison};
use jcmp_params::IdParamTree;

use crate::cli::*;
use crate::render::{render_stats, render_tree};
use crate::settings::Settings;

/// Exit status when the inputs differ.
pub const DIFFERENT_EXIT: u8 = 1;
/// Exit status when the run failed.
pub const ERROR_EXIT: u8 = 2;

/// How a successful run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Same,
    Different,
}

impl Outcome {
    fn of(unchanged: bool) -> Self {
        if unchanged { Self::Same } else { Self::Different }
    }

    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Same => ExitCode::SUCCESS,
            Self::Different => ExitCode::from(DIFFERENT_EXIT),
        }
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<Outcome> {
    match cli.command {
        Command::Files(args) => {
            let settings = Settings::load(cli.config.as_deref())?.with_flags(&args.flags);
            cmd_files(args, &settings, &cli.format, cli.silent)
        }
        Command::Folders(args) => {
            let settings = Settings::load(cli.config.as_deref())?.with_flags(&args.flags);
            cmd_folders(args, &settings, &cli.format, cli.silent)
        }
        Command::Params(args) => cmd_params(args),
    }
}

fn cmd_files(
    args: CompareArgs,
    settings: &Settings,
    format: &OutputFormat,
    silent: bool,
) -> anyhow::Result<Outcome> {
    let options = settings.to_options(silent)?;
    let delta = compare_files(&args.one, &args.two, &options).with_context(|| {
        format!("cannot compare {} with {}", args.one.display(), args.two.display())
    })?;
    print_delta(&delta, format);
    Ok(Outcome::of(delta.is_unchanged()))
}

fn cmd_folders(
    args: CompareArgs,
    settings: &Settings,
    format: &OutputFormat,
    silent: bool,
) -> anyhow::Result<Outcome> {
    let options = settings.to_options(silent)?;
    match compare_folders(&args.one, &args.two, &options, &FsLoader) {
        Ok(comparison) => {
            print_folders(&comparison, format);
            Ok(Outcome::of(comparison.is_unchanged()))
        }
        Err(failure) => {
            if !failure.partial.is_unchanged() {
                print_folders(&failure.partial, format);
            }
            Err(anyhow::Error::new(failure)).with_context(|| {
                format!("cannot compare {} with {}", args.one.display(), args.two.display())
            })
        }
    }
}

fn cmd_params(args: ParamsArgs) -> anyhow::Result<Outcome> {
    let tree = IdParamTree::load(&args.idparams)
        .context("cannot load identification parameters")?;
    print!("{}", tree.describe());
    println!("{} {} rules resolved", "✓".green().bold(), tree.len());
    Ok(Outcome::Same)
}

fn print_delta(delta: &DiffNode, format: &OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", delta.to_json_pretty()),
        OutputFormat::Text => {
            print!("{}", render_tree(delta));
            if !delta.is_unchanged() {
                println!("{}", render_stats(&delta.stats()));
            }
        }
    }
}

fn print_folders(comparison: &FolderComparison, format: &OutputFormat) {
    print_delta(&comparison.delta, format);
    if let OutputFormat::Text = format {
        println!(
            "Compared {} files ({} only in first, {} only in second)",
            comparison.compared.len().to_string().bold(),
            comparison.only_in_first.len(),
            comparison.only_in_second.len(),
        );
        if comparison.stopped {
            println!(
                "{} stopped early, {} files skipped",
                "!".yellow().bold(),
                comparison.skipped
            );
        }
    }
}
