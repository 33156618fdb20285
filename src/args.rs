use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Tailwind build descriptor CLI - inspect, validate and resolve `tailwind.config` files
#[derive(Parser, Debug)]
#[command(name = "tailwind-descriptor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Descriptor file (JSON or YAML); defaults to the bundled project descriptor
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        global = true,
        env = "TAILWIND_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short = 'v', long = "verbose", global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the descriptor or the resolved theme
    Show(ShowArgs),
    /// Validate content globs, safelist patterns and theme tokens
    Check,
    /// Scan content files and resolve the classes the build would emit
    Scan(ScanArgs),
    /// Write the project descriptor to a file
    Init(InitArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Arguments for the show command
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Print the base theme with `theme.extend` merged in
    #[arg(long = "theme", default_value_t = false)]
    pub theme: bool,
}

/// Arguments for the scan command
#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    /// Directory content globs are resolved against (default: the descriptor's directory)
    #[arg(short = 'r', long = "root", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Newline-separated list of classes the build tool can generate
    #[arg(short = 'u', long = "universe", value_name = "PATH")]
    pub universe: Option<PathBuf>,

    /// Where to write the JSON manifest
    #[arg(
        short = 'm',
        long = "manifest",
        value_name = "PATH",
        default_value = "tailwind-manifest.json"
    )]
    pub manifest: PathBuf,

    /// Show a progress bar while scanning
    #[arg(long = "progress", default_value_t = false)]
    pub progress: bool,

    /// Resolve but don't write the manifest
    #[arg(long = "dry-run", default_value_t = false)]
    pub dry_run: bool,
}

impl ScanArgs {
    /// Validate that the arguments are consistent
    pub fn validate(&self) -> Result<(), String> {
        if let Some(root) = &self.root {
            if !root.is_dir() {
                return Err(format!("Root '{}' is not a directory", root.display()));
            }
        }

        if self.manifest.is_dir() {
            return Err(format!(
                "Manifest path '{}' is a directory",
                self.manifest.display()
            ));
        }

        Ok(())
    }
}

/// Arguments for the init command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Output path; the extension picks JSON or YAML
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        default_value = "tailwind.config.json"
    )]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long = "force", default_value_t = false)]
    pub force: bool,
}
