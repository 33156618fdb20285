use anyhow::{bail, Context};
use clap::Parser;
use tailwind_descriptor::{logging, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose)?;

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Show(args) => {
            let rendered = tailwind_descriptor::show(config, &args)
                .context("Failed to render descriptor")?;
            println!("{}", rendered.trim_end());
        }
        Commands::Check => {
            let report = tailwind_descriptor::check(config).context("Failed to load descriptor")?;
            for issue in &report.issues {
                println!("{}", issue);
            }
            if !report.is_ok() {
                bail!("descriptor has {} error(s)", report.errors().count());
            }
            println!("Descriptor OK ({} warning(s))", report.warnings().count());
        }
        Commands::Scan(args) => {
            let outcome = tailwind_descriptor::scan(config, &args).context("Scan failed")?;
            println!("Scan successful!");
            println!("  - Scanned {} files", outcome.scan.files.len());
            println!("  - Found {} candidates", outcome.scan.candidates.len());
            println!("  - Retained {} classes", outcome.resolution.retained.len());
            if outcome.resolution.matches_everything {
                println!("  - Safelist matches everything; unused classes are not eliminated");
            }
            if let Some(path) = outcome.manifest_path {
                println!("  - Manifest: {}", path.display());
            }
        }
        Commands::Init(args) => {
            let path = tailwind_descriptor::init(&args).context("Init failed")?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
