pub mod args;
pub mod config;
pub mod errors;
pub mod logging;
pub mod manifest;
pub mod resolve;
pub mod safelist;
pub mod scanner;
pub mod theme;
pub mod validate;

pub use args::{Cli, Commands, InitArgs, OutputFormat, ScanArgs, ShowArgs};
pub use config::{ConfigDescriptor, ConfigFormat, PatternRule, SafelistRule, ThemeExtend};
pub use errors::{DescriptorError, Result};
pub use manifest::{Manifest, ManifestBuilder};
pub use resolve::{resolve, ClassSource, ClassUniverse, Resolution};
pub use safelist::Safelist;
pub use scanner::{ScanResult, Scanner, SecurityConfig};
pub use theme::Theme;
pub use validate::{validate, Issue, Severity, ValidationReport};

use std::path::{Path, PathBuf};

/// Result of the scan command
#[derive(Debug)]
pub struct ScanOutcome {
    pub scan: ScanResult,
    pub resolution: Resolution,
    pub manifest: Manifest,
    /// Where the manifest was written, unless this was a dry run
    pub manifest_path: Option<PathBuf>,
}

/// Load the descriptor at `path`, or the bundled project descriptor
pub fn load_descriptor(path: Option<&Path>) -> Result<ConfigDescriptor> {
    match path {
        Some(path) => ConfigDescriptor::from_file(path),
        None => ConfigDescriptor::load(),
    }
}

/// Render the descriptor, or its resolved theme, for printing
pub fn show(config_path: Option<&Path>, args: &ShowArgs) -> Result<String> {
    let descriptor = load_descriptor(config_path)?;

    if args.theme {
        let theme = Theme::base().extended(&descriptor.theme.extend);
        return match args.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&theme)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(&theme)?),
        };
    }

    match args.format {
        OutputFormat::Json => descriptor.to_json_string(),
        OutputFormat::Yaml => descriptor.to_yaml_string(),
    }
}

/// Load and validate a descriptor
pub fn check(config_path: Option<&Path>) -> Result<ValidationReport> {
    let descriptor = load_descriptor(config_path)?;
    Ok(validate(&descriptor))
}

/// Scan the descriptor's content, resolve retained classes and build the manifest
pub fn scan(config_path: Option<&Path>, args: &ScanArgs) -> Result<ScanOutcome> {
    args.validate().map_err(|message| DescriptorError::ConfigError { message })?;

    let descriptor = load_descriptor(config_path)?;
    validate(&descriptor).into_result()?;

    let root = match (&args.root, config_path) {
        (Some(root), _) => root.clone(),
        (None, Some(path)) => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        (None, None) => PathBuf::from("."),
    };

    tracing::info!(root = %root.display(), globs = ?descriptor.content, "scanning content");

    let scan = Scanner::new(&root, &descriptor.content)
        .with_progress(args.progress)
        .scan()?;

    // Without a class list, anything the scan found counts as generatable
    let universe = match &args.universe {
        Some(path) => ClassUniverse::from_file(path)?,
        None => scan.classes().collect(),
    };

    let resolution = resolve(&descriptor, &scan, &universe)?;

    let mut builder = ManifestBuilder::new(&resolution).with_scan(&scan);
    if let Some(path) = config_path {
        builder = builder.with_descriptor(path);
    }
    let manifest = builder.build();

    let manifest_path = if args.dry_run {
        None
    } else {
        manifest.write_to(&args.manifest)?;
        Some(args.manifest.clone())
    };

    Ok(ScanOutcome {
        scan,
        resolution,
        manifest,
        manifest_path,
    })
}

/// Write the project descriptor to `args.output`
pub fn init(args: &InitArgs) -> Result<PathBuf> {
    let format = ConfigFormat::from_path(&args.output)?;

    if args.output.exists() && !args.force {
        return Err(DescriptorError::OutputError {
            path: args.output.display().to_string(),
            message: "file exists (use --force to overwrite)".to_string(),
        });
    }

    let content = ConfigDescriptor::load()?.to_string_as(format)?;

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    manifest::write_atomic(&args.output, &content).map_err(|e| DescriptorError::OutputError {
        path: args.output.display().to_string(),
        message: e.to_string(),
    })?;

    tracing::info!(path = %args.output.display(), "wrote descriptor");
    Ok(args.output.clone())
}
