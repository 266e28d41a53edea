use clap::Subcommand;
use std::path::PathBuf;

pub mod cube;
pub mod execute;
pub mod inspect;
pub mod pack;
pub mod unpack;

#[derive(Subcommand)]
pub enum Commands {
    /// Print the container layout and document summary of a .glb or .gltf file
    Inspect {
        /// File to inspect
        path: PathBuf,
    },

    /// Pack a .gltf file and its external resources into a single .glb
    Pack {
        /// Source .gltf file
        #[arg(short, long)]
        source: PathBuf,

        /// Output .glb file
        #[arg(short, long)]
        destination: PathBuf,
    },

    /// Unpack a .glb into a .gltf and a sibling .bin
    Unpack {
        /// Source .glb file
        #[arg(short, long)]
        source: PathBuf,

        /// Output .gltf file
        #[arg(short, long)]
        destination: PathBuf,

        /// Store the buffer as a base64 data URI instead of a .bin file
        #[arg(long)]
        embed: bool,
    },

    /// Export a textured demo cube through the document builder
    Cube {
        /// Output file (.glb or .gltf)
        #[arg(short, long)]
        destination: PathBuf,

        /// Export settings file (TOML)
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}
