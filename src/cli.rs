use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kitbag")]
#[command(author, version, about = "Image downsizing and relation helpers for web backends")]
pub struct Cli {
    /// Path to config file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Shrink an image file in place to fit inside a box
    Downsize {
        /// Image file to rewrite
        #[arg(required = true)]
        path: PathBuf,

        /// Maximum width (defaults to images.max_width)
        #[arg(long)]
        max_width: Option<u32>,

        /// Maximum height (defaults to images.max_height)
        #[arg(long)]
        max_height: Option<u32>,
    },

    /// Write a copy of an image whose longer side is at most max-size
    Thumbnail {
        /// Source image
        input: PathBuf,

        /// Destination; its extension picks the output format
        output: PathBuf,

        /// Longest side in pixels (defaults to images.max_size)
        #[arg(long)]
        max_size: Option<u32>,
    },

    /// Print an image as base64 in its own format
    Base64 {
        /// Image file to encode
        path: PathBuf,

        /// Downsize first so the longer side is at most this many pixels
        #[arg(long)]
        max_size: Option<u32>,
    },

    /// Manage tags
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Print the server domain resolved from network.allowed_hosts
    Domain,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum TagCommands {
    /// Create a tag
    Create {
        /// Unique tag name
        name: String,
    },

    /// List all tags as JSON
    List,
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user
    Create {
        first_name: String,
        last_name: String,
    },

    /// Replace a user's tags with exactly the given set
    SetTags {
        user_id: String,
        /// Tag IDs; duplicates are ignored, none clears every tag
        tag_ids: Vec<String>,
    },

    /// List a user's tags as JSON
    Tags { user_id: String },

    /// Store an avatar image for a user
    SetAvatar {
        user_id: String,
        /// Image file to upload
        image: PathBuf,
    },
}
