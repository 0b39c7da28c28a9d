//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use h5mirror_core::DEFAULT_WORKERS;

/// Mirror directory-listing web servers to local storage.
///
/// h5mirror walks h5ai-style index pages under a root URL, collects every
/// downloadable file, and mirrors the tree locally. Listing pages are cached
/// and completed downloads are recorded, so interrupted runs resume where
/// they left off.
#[derive(Parser, Debug)]
#[command(name = "h5mirror")]
#[command(author, version, about)]
#[command(group(clap::ArgGroup::new("source").required(true).args(["url", "file"])))]
pub struct Args {
    /// Root URL of the listing tree to mirror
    #[arg(short, long)]
    pub url: Option<String>,

    /// File of `URL [depth]` lines, one listing tree per line
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Maximum recursion depth for listing crawls
    #[arg(short, long, default_value_t = 4)]
    pub depth: u32,

    /// Concurrent download workers (1-64)
    #[arg(short, long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub workers: u8,

    /// Output directory for downloads, or filename for export
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Directory holding cached listing pages
    #[arg(long, default_value = "url_cache", value_name = "DIR")]
    pub cache_dir: PathBuf,

    /// Directory holding completed-download ledgers
    #[arg(long, default_value = "downloaded_db", value_name = "DIR")]
    pub ledger_dir: PathBuf,

    /// Save discovered URLs to a file instead of downloading
    #[arg(long)]
    pub export_only: bool,

    /// Skip directory structure (flat downloads; bare URLs on export)
    #[arg(long)]
    pub flat: bool,

    /// Proceed without the interactive confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Resolves the output path for the selected mode.
    ///
    /// Downloads default to `./files`; export defaults to `urls.txt`.
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            if self.export_only {
                PathBuf::from("urls.txt")
            } else {
                PathBuf::from("./files")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_url_with_defaults_parses_successfully() {
        let args = Args::try_parse_from(["h5mirror", "-u", "http://host/files/"]).unwrap();
        assert_eq!(args.url.as_deref(), Some("http://host/files/"));
        assert!(args.file.is_none());
        assert_eq!(args.depth, 4);
        assert_eq!(args.workers, 4); // DEFAULT_WORKERS
        assert_eq!(args.cache_dir, PathBuf::from("url_cache"));
        assert_eq!(args.ledger_dir, PathBuf::from("downloaded_db"));
        assert!(!args.export_only);
        assert!(!args.flat);
        assert!(!args.yes);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_requires_url_or_file() {
        let result = Args::try_parse_from(["h5mirror"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_url_and_file_are_mutually_exclusive() {
        let result =
            Args::try_parse_from(["h5mirror", "-u", "http://host/", "-f", "urls.txt"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_file_source_parses() {
        let args = Args::try_parse_from(["h5mirror", "--file", "roots.txt"]).unwrap();
        assert_eq!(args.file, Some(PathBuf::from("roots.txt")));
        assert!(args.url.is_none());
    }

    #[test]
    fn test_cli_depth_flag() {
        let args =
            Args::try_parse_from(["h5mirror", "-u", "http://host/", "-d", "2"]).unwrap();
        assert_eq!(args.depth, 2);

        let args =
            Args::try_parse_from(["h5mirror", "-u", "http://host/", "--depth", "0"]).unwrap();
        assert_eq!(args.depth, 0);
    }

    #[test]
    fn test_cli_workers_range_enforced() {
        let args =
            Args::try_parse_from(["h5mirror", "-u", "http://host/", "-w", "64"]).unwrap();
        assert_eq!(args.workers, 64);

        let result = Args::try_parse_from(["h5mirror", "-u", "http://host/", "-w", "0"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );

        let result = Args::try_parse_from(["h5mirror", "-u", "http://host/", "-w", "65"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_mode_flags() {
        let args = Args::try_parse_from([
            "h5mirror",
            "-u",
            "http://host/",
            "--export-only",
            "--flat",
            "-y",
        ])
        .unwrap();
        assert!(args.export_only);
        assert!(args.flat);
        assert!(args.yes);
    }

    #[test]
    fn test_cli_output_defaults_per_mode() {
        let args = Args::try_parse_from(["h5mirror", "-u", "http://host/"]).unwrap();
        assert_eq!(args.output_path(), PathBuf::from("./files"));

        let args =
            Args::try_parse_from(["h5mirror", "-u", "http://host/", "--export-only"]).unwrap();
        assert_eq!(args.output_path(), PathBuf::from("urls.txt"));
    }

    #[test]
    fn test_cli_explicit_output_wins_over_defaults() {
        let args =
            Args::try_parse_from(["h5mirror", "-u", "http://host/", "-o", "mirror"]).unwrap();
        assert_eq!(args.output_path(), PathBuf::from("mirror"));

        let args = Args::try_parse_from([
            "h5mirror",
            "-u",
            "http://host/",
            "--export-only",
            "-o",
            "found.txt",
        ])
        .unwrap();
        assert_eq!(args.output_path(), PathBuf::from("found.txt"));
    }

    #[test]
    fn test_cli_storage_dirs_are_overridable() {
        let args = Args::try_parse_from([
            "h5mirror",
            "-u",
            "http://host/",
            "--cache-dir",
            "/tmp/cache",
            "--ledger-dir",
            "/tmp/db",
        ])
        .unwrap();
        assert_eq!(args.cache_dir, PathBuf::from("/tmp/cache"));
        assert_eq!(args.ledger_dir, PathBuf::from("/tmp/db"));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["h5mirror", "-u", "http://host/", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["h5mirror", "-u", "http://host/", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["h5mirror", "-u", "http://host/", "-q"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        // --help causes early exit, so we check it returns an error with Help kind
        let result = Args::try_parse_from(["h5mirror", "--help"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        // --version causes early exit, so we check it returns an error with Version kind
        let result = Args::try_parse_from(["h5mirror", "--version"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayVersion
        );
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["h5mirror", "-u", "http://host/", "--bogus"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::UnknownArgument
        );
    }
}
