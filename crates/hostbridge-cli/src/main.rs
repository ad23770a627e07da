//! hostbridge CLI - Layout code generator
//!
//! Commands:
//! - `hostbridge generate-header` - Generate C headers from Rust `#[repr(C)]` structs
//! - `hostbridge generate-csharp` - Generate C# `[StructLayout]` mirrors of the same structs

use clap::{Parser, Subcommand};

mod csharp_gen;
mod header_gen;
mod layout;

#[derive(Parser)]
#[command(name = "hostbridge")]
#[command(
    author,
    version,
    about = "Layout code generator for hostbridge boundaries",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate C header from Rust #[repr(C)] structs
    GenerateHeader {
        /// Path to Rust source file containing #[repr(C)] structs
        #[arg(short, long)]
        source: String,

        /// Output path for generated C header (default: layout.h)
        #[arg(short, long, default_value = "layout.h")]
        output: String,
    },

    /// Generate C# structs with sequential layout from Rust #[repr(C)] structs
    GenerateCsharp {
        /// Path to Rust source file containing #[repr(C)] structs
        #[arg(short, long)]
        source: String,

        /// Output path for generated C# file (default: Layout.cs)
        #[arg(short, long, default_value = "Layout.cs")]
        output: String,

        /// Namespace of the generated types
        #[arg(short, long, default_value = "HostBridge.Interop")]
        namespace: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::GenerateHeader { source, output } => {
            header_gen::run(&source, &output)?;
        }
        Commands::GenerateCsharp {
            source,
            output,
            namespace,
        } => {
            csharp_gen::run(&source, &output, &namespace)?;
        }
    }

    Ok(())
}
