use clap::{Parser, Subcommand};
use kickstart::{collate, config, generate, output, render::Renderer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kickstart")]
#[command(about = "Pattern library collator and styleguide generator")]
#[command(long_about = "\
Pattern library collator and styleguide generator

Pattern files are Handlebars templates. Directories become collections,
ordered by numeric prefix, and snippet markers split a file into several
patterns with their own notes.

Project structure:

  my-kit/
  ├── kickstart.toml                # Config (optional)
  └── src/
      ├── data/
      │   └── colors.yaml           # {{data.colors.primary}} in any template
      ├── pages/
      │   ├── _intro.html           # Partial for pages: {{> intro}}
      │   └── index.html            # → public/index.html
      └── patterns/
          ├── 01-atoms/             # Collection \"Atoms\", first
          │   ├── button.html       # Pattern atoms-button
          │   └── button.md         # Its notes
          └── 02-molecules/
              └── card.html         # {{> atoms-button}} or {{atoms-button \"big\"}}

Snippet markers:
  <!-- snippet:html name -->  ...  <!-- endsnippet -->
  <!-- snippet:markdown name --> notes for 'name' <!-- endsnippet -->
  <!-- snippet:remove --> dropped from output <!-- endsnippet -->

Run 'kickstart gen-config' to generate a documented kickstart.toml.")]
#[command(version)]
struct Cli {
    /// Project directory containing kickstart.toml
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Log progress at info level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Collate patterns, data and lineage into the styleguide manifest
    Collate,
    /// Render the styleguide and pages from an existing manifest
    Compile,
    /// Run the full pipeline: collate → compile
    Build,
    /// Collate without writing anything and report diagnostics
    Check {
        /// Exit non-zero when any diagnostic is reported
        #[arg(long)]
        strict: bool,
    },
    /// Print a stock kickstart.toml with all options documented
    GenConfig,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let project = &cli.project;

    match cli.command {
        Command::Collate => {
            let config = config::load_config(project)?;
            let mut renderer = Renderer::new(config.indent());
            let manifest = collate::collate(&config, project, &mut renderer)?.manifest();
            collate::write_manifest(&manifest, &config.manifest_path(project))?;
            output::print_collate_output(&manifest);
        }
        Command::Compile => {
            let config = config::load_config(project)?;
            let manifest = collate::read_manifest(&config.manifest_path(project))?;
            let mut renderer = Renderer::new(config.indent());
            let mut diagnostics = generate::register_manifest(&mut renderer, &manifest);
            let mut report = generate::generate(&manifest, &config, project, &mut renderer)?;
            diagnostics.append(&mut report.diagnostics);
            report.diagnostics = diagnostics;
            output::print_generate_output(&report);
        }
        Command::Build => {
            let config = config::load_config(project)?;
            let mut renderer = Renderer::new(config.indent());

            println!("==> Stage 1: Collating {}", config.pattern_base(project).display());
            let manifest = collate::collate(&config, project, &mut renderer)?.manifest();
            let manifest_path = config.manifest_path(project);
            collate::write_manifest(&manifest, &manifest_path)?;
            output::print_collate_output(&manifest);

            let site_dir = config.site_dir(project);
            println!("==> Stage 2: Compiling → {}", site_dir.display());
            let report = generate::generate(&manifest, &config, project, &mut renderer)?;
            output::print_generate_output(&report);

            println!("==> Build complete: {}", site_dir.display());
        }
        Command::Check { strict } => {
            let config = config::load_config(project)?;
            let mut renderer = Renderer::new(config.indent());
            println!("==> Checking {}", config.pattern_base(project).display());
            let manifest = collate::collate(&config, project, &mut renderer)?.manifest();
            output::print_collate_output(&manifest);

            let strict = strict || config.lineage.strict;
            if strict && !manifest.diagnostics.is_empty() {
                return Err(format!(
                    "{} diagnostic(s) reported in strict mode",
                    manifest.diagnostics.len()
                )
                .into());
            }
            println!("==> Patterns are valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
