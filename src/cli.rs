use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "survey-api")]
#[command(about = "Event survey and preference poll backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Command {
    /// Run the HTTP server (default)
    #[default]
    Serve,

    /// Apply pending migrations to DATABASE_URL and exit
    Migrate,

    /// Create the default roles and the configured administrator, then exit
    Seed,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or_default()
    }
}
