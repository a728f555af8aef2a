mod commands;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_MANIFEST_ERROR};
use iospack_schema::PackageOverrides;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "iospack",
    version,
    about = "Generate iOS packages for progressive web apps"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the iOS package options derived from a web manifest.
    Options {
        /// Path to the manifest JSON file.
        #[arg(default_value = "manifest.json")]
        manifest: PathBuf,
        /// URL the manifest was served from; base for relative URLs.
        #[arg(long)]
        manifest_url: Option<String>,
        #[command(flatten)]
        overrides: OverrideArgs,
    },
    /// Fetch the generated package for a prepared request.
    Generate {
        /// Request id handed out by the build service.
        #[arg(allow_negative_numbers = true)]
        request_id: Option<i64>,
        /// Artifact service URL (overrides config file).
        #[arg(long)]
        remote: Option<String>,
        /// Bearer token for the artifact service.
        #[arg(long)]
        token: Option<String>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Debug, Args)]
struct OverrideArgs {
    /// Replace the derived app name.
    #[arg(long)]
    app_name: Option<String>,
    /// Replace the derived app URL.
    #[arg(long)]
    app_url: Option<String>,
    /// Replace the derived icon URL.
    #[arg(long)]
    icon_url: Option<String>,
    #[arg(long)]
    splash_color: Option<String>,
    #[arg(long)]
    progress_bar_color: Option<String>,
    #[arg(long)]
    status_bar_color: Option<String>,
    /// URL the app may navigate to outside its scope (repeatable).
    #[arg(long = "permitted-url")]
    permitted_urls: Vec<String>,
}

impl From<OverrideArgs> for PackageOverrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            app_name: args.app_name,
            app_url: args.app_url,
            icon_url: args.icon_url,
            splash_color: args.splash_color,
            progress_bar_color: args.progress_bar_color,
            status_bar_color: args.status_bar_color,
            permitted_urls: (!args.permitted_urls.is_empty()).then_some(args.permitted_urls),
        }
    }
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("IOSPACK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;

    let result = match cli.command {
        Commands::Options {
            manifest,
            manifest_url,
            overrides,
        } => commands::options::run(
            &manifest,
            manifest_url.as_deref(),
            overrides.into(),
            json_output,
        ),
        Commands::Generate {
            request_id,
            remote,
            token,
        } => commands::generate::run(
            request_id,
            remote.as_deref(),
            token.as_deref(),
            json_output,
        ),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("failed to parse manifest")
                || msg.starts_with("failed to read manifest")
            {
                EXIT_MANIFEST_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
