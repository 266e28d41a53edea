//! Command execution implementations

use super::Commands;
use super::{cube, inspect, pack, unpack};

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Inspect { path } => inspect::execute(path),
            Commands::Pack { source, destination } => pack::execute(source, destination),
            Commands::Unpack {
                source,
                destination,
                embed,
            } => unpack::execute(source, destination, *embed),
            Commands::Cube { destination, settings } => cube::execute(destination, settings.as_deref()),
        }
    }
}
