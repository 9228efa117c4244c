//! msggen CLI
//!
//! Compiles schema modules to C++ headers, or dumps the parsed IR for
//! inspection.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use msggen::{compile, parser, validate};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "msggen")]
#[command(about = "Compile Python-esque type descriptions to C++ message types")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a module and dump its IR as JSON
    Parse {
        /// Schema module to read
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Generate a C++ header from a module
    Generate {
        /// Schema module to read
        #[arg(short, long)]
        file: PathBuf,

        /// Directory the header is written into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// C++ namespace wrapping the generated types
        #[arg(short, long, default_value = "")]
        namespace: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Parse { file } => {
            let source = fs::read_to_string(&file)?;
            let module = parser::parse(&source, &module_name(&file))?;
            validate::validate(&module)?;
            println!("{}", serde_json::to_string_pretty(&module)?);
        }
        Commands::Generate {
            file,
            out_dir,
            namespace,
        } => {
            let source = fs::read_to_string(&file)?;
            let (header, cycles) = compile(&source, &module_name(&file), &namespace)?;
            for cycle in &cycles {
                tracing::warn!("{}", cycle);
            }

            let out_path = out_dir.join(&header.file_name);
            if let Ok(existing) = fs::read_to_string(&out_path) {
                if existing == header.contents {
                    tracing::info!("{} is up to date", out_path.display());
                    return Ok(());
                }
            }
            fs::create_dir_all(&out_dir)?;
            fs::write(&out_path, &header.contents)?;
            tracing::info!(
                "wrote {} ({} types)",
                out_path.display(),
                header.type_count
            );
        }
    }
    Ok(())
}

/// Module name from the input file stem
fn module_name(file: &Path) -> String {
    file.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "module".to_string())
}
