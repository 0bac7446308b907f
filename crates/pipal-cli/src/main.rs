//! pipal CLI: course materials, submissions and problem verification.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use pipal_client::ClientError;

mod commands;

#[derive(Parser)]
#[command(name = "pipal", version, about = "Course companion: fetch materials, submit work, verify problems")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the course server
    Login {
        /// Your email address (prompted when missing)
        #[arg(long)]
        email: Option<String>,

        /// Your password (prompted when missing)
        #[arg(long)]
        password: Option<String>,
    },

    /// Show the logged-in user
    Whoami,

    /// Fetch new updates to the course materials
    Update,

    /// Submit an assignment
    Submit {
        /// Assignment file, named after the assignment
        file: PathBuf,
    },

    /// Verify a solution against a problem's checks
    Verify {
        /// Problem name
        problem: String,

        /// Workspace file with the solution's definitions
        #[arg(long)]
        env: Option<PathBuf>,

        /// Local problem directory (defaults to the configured one, else the server)
        #[arg(long)]
        problems_dir: Option<PathBuf>,
    },

    /// Validate problem files
    Validate {
        /// Path to a problem file or a directory of problems
        #[arg(long)]
        problems: PathBuf,
    },

    /// List problems in a local problem directory
    Problems {
        /// Problem directory (defaults to the configured one)
        #[arg(long)]
        problems_dir: Option<PathBuf>,
    },

    /// Create a starter config and an example problem
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pipal=info".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Login { email, password } => {
            commands::login::execute(email, password, config).await
        }
        Commands::Whoami => commands::whoami::execute(config).await,
        Commands::Update => commands::update::execute(config).await,
        Commands::Submit { file } => commands::submit::execute(file, config).await,
        Commands::Verify {
            problem,
            env,
            problems_dir,
        } => match commands::verify::execute(problem, env, problems_dir, config).await {
            Ok(verdict) => process::exit(verdict.exit_code()),
            Err(e) => Err(e),
        },
        Commands::Validate { problems } => commands::validate::execute(problems),
        Commands::Problems { problems_dir } => commands::problems::execute(problems_dir, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        if matches!(e.downcast_ref::<ClientError>(), Some(ClientError::InvalidCredentials)) {
            eprintln!("ERROR: Invalid credentials");
            process::exit(2);
        }
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
