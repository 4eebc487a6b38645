pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};

#[cfg(feature = "cli")]
mod cli {
    use clap::{Parser, Subcommand};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "iframe-repost")]
    #[command(about = "Re-post iframe GET navigations as POST form submissions")]
    pub struct CliConfig {
        #[command(subcommand)]
        pub command: Command,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Emit logs as JSON")]
        pub json_logs: bool,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Post every frame of a TOML document, one after another
        Run {
            /// Path to the TOML document
            #[arg(short, long, default_value = "frames.toml")]
            config: String,

            /// Print results as JSON instead of form markup
            #[arg(long)]
            json: bool,

            /// Show what would be posted without dispatching anything
            #[arg(long)]
            dry_run: bool,

            /// Override the pause between frames from the document
            #[arg(long)]
            delay_ms: Option<u64>,
        },
        /// Show the destination and form fields a single URL turns into
        Decode {
            url: String,

            #[arg(long)]
            json: bool,
        },
    }
}
