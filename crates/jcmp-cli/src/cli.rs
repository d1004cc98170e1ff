use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "jcmp",
    about = "jcmp -- structural comparison of JSON and XML documents",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML settings file supplying defaults for the comparison flags
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare two documents
    Files(CompareArgs),
    /// Compare the documents of two folders, pairing them by file name
    Folders(CompareArgs),
    /// Resolve identification parameters and print their tree
    Params(ParamsArgs),
}

#[derive(Args)]
pub struct CompareArgs {
    pub one: PathBuf,
    pub two: PathBuf,
    #[command(flatten)]
    pub flags: ComparisonFlags,
}

/// Flags shared by the comparing commands. Unset flags keep the settings value.
#[derive(Args, Clone, Debug, Default)]
pub struct ComparisonFlags {
    /// Identification parameters: inline JSON or a path to a JSON file
    #[arg(long)]
    pub idparams: Option<String>,
    /// Compare XML documents instead of JSON
    #[arg(long)]
    pub xml: bool,
    /// Skip duplicate-identity checks
    #[arg(long)]
    pub fast: bool,
    /// Key objects without an identity rule by their position
    #[arg(long)]
    pub index_fallback: bool,
    /// Fail instead of showing raw objects that have no alias template
    #[arg(long)]
    pub no_raw: bool,
    /// Number of folder workers
    #[arg(long)]
    pub parallel: Option<usize>,
    /// Stop a folder run at the first differing file
    #[arg(long)]
    pub stop_at_first: bool,
    /// Comma-separated file names to leave out of folder runs
    #[arg(long)]
    pub ignore: Option<String>,
}

#[derive(Args)]
pub struct ParamsArgs {
    /// Inline JSON or a path to a JSON file
    pub idparams: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_files() {
        let cli = Cli::try_parse_from(["jcmp", "files", "a.json", "b.json"]).unwrap();
        if let Command::Files(args) = cli.command {
            assert_eq!(args.one, PathBuf::from("a.json"));
            assert_eq!(args.two, PathBuf::from("b.json"));
            assert!(args.flags.idparams.is_none());
            assert!(!args.flags.xml);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_folders_with_flags() {
        let cli = Cli::try_parse_from([
            "jcmp", "folders", "left", "right",
            "--xml", "--fast", "--parallel", "8", "--stop-at-first",
            "--ignore", "a.xml,b.xml", "--idparams", r#"{"_use": ["id"]}"#,
        ]).unwrap();
        if let Command::Folders(args) = cli.command {
            assert!(args.flags.xml);
            assert!(args.flags.fast);
            assert!(args.flags.stop_at_first);
            assert_eq!(args.flags.parallel, Some(8));
            assert_eq!(args.flags.ignore, Some("a.xml,b.xml".into()));
            assert_eq!(args.flags.idparams, Some(r#"{"_use": ["id"]}"#.into()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_lenient_flags() {
        let cli = Cli::try_parse_from([
            "jcmp", "files", "a", "b", "--index-fallback", "--no-raw",
        ]).unwrap();
        if let Command::Files(args) = cli.command {
            assert!(args.flags.index_fallback);
            assert!(args.flags.no_raw);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_params() {
        let cli = Cli::try_parse_from(["jcmp", "params", "ids.json"]).unwrap();
        if let Command::Params(args) = cli.command {
            assert_eq!(args.idparams, "ids.json");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn files_needs_two_paths() {
        assert!(Cli::try_parse_from(["jcmp", "files", "a.json"]).is_err());
    }

    #[test]
    fn parallel_must_be_a_number() {
        assert!(Cli::try_parse_from(["jcmp", "folders", "a", "b", "--parallel", "many"]).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "jcmp", "files", "a", "b", "--verbose", "--format", "json", "--config", "jcmp.toml",
        ]).unwrap();
        assert!(cli.verbose);
        assert!(!cli.silent);
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.config, Some(PathBuf::from("jcmp.toml")));
    }

    #[test]
    fn verbose_and_silent_conflict() {
        assert!(Cli::try_parse_from(["jcmp", "--verbose", "--silent", "params", "{}"]).is_err());
    }
}
