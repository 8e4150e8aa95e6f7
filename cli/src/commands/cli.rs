use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "autoforge",
    version,
    about = "Multi-agent repository builder service"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP service
    Serve(ServeArgs),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Bind host; the config file value applies when left at the default
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Bind port; the config file value applies when left at the default
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Session id for the server state file; generated when omitted
    #[arg(long)]
    pub session_id: Option<String>,
}
