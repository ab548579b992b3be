mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, TagCommands, UserCommands};
use kb_core::config::Config;
use kb_core::network::server_domain;
use kb_core::{TagId, UserId};
use kb_db::models::Tag;
use kb_db::pool::{get_conn, DbPool};
use kb_db::queries::{tags, users};
use kb_db::relation::set_user_tags;
use kitbag::images::AvatarService;
use serde::Serialize;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "kitbag=trace,kb_images=trace,kb_db=debug,kb_core=debug".to_string()
        } else {
            "kitbag=info,kb_images=info,kb_db=warn,kb_core=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load_or_default(cli.config.as_deref());

    match cli.command {
        Commands::Downsize {
            path,
            max_width,
            max_height,
        } => {
            let max_width = max_width.unwrap_or(config.images.max_width);
            let max_height = max_height.unwrap_or(config.images.max_height);
            let changed = kb_images::downsize_and_save(&path, max_width, max_height)
                .with_context(|| format!("Failed to downsize {}", path.display()))?;
            if changed {
                println!("Downsized {} to fit {}x{}", path.display(), max_width, max_height);
            } else {
                println!("{} already fits {}x{}", path.display(), max_width, max_height);
            }
            Ok(())
        }
        Commands::Thumbnail {
            input,
            output,
            max_size,
        } => thumbnail(&input, &output, max_size.unwrap_or(config.images.max_size)),
        Commands::Base64 { path, max_size } => {
            let encoded = kb_images::image_to_base64(&path, max_size)
                .with_context(|| format!("Failed to encode {}", path.display()))?;
            println!("{encoded}");
            Ok(())
        }
        Commands::Tag { command } => run_tag(command, &config),
        Commands::User { command } => run_user(command, &config),
        Commands::Domain => {
            let network = &config.network;
            println!("{}", server_domain(&network.allowed_hosts, &network.default_domain));
            Ok(())
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("kitbag {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn thumbnail(input: &Path, output: &Path, max_size: u32) -> Result<()> {
    let (img, _) = kb_images::load_image(input)
        .with_context(|| format!("Failed to load {}", input.display()))?;
    let (resized, img) = kb_images::maybe_downsize(img, max_size)?;

    let format = kb_images::ImageFormatTag::from_path(output)?;
    let data = kb_images::encode_image(&img, format)?;
    std::fs::write(output, data)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let state = if resized { "resized" } else { "unchanged" };
    println!(
        "{} -> {} ({}x{}, {})",
        input.display(),
        output.display(),
        img.width(),
        img.height(),
        state
    );
    Ok(())
}

fn open_db(config: &Config) -> Result<DbPool> {
    let path = &config.database.path;
    kb_db::pool::open(&config.database)
        .with_context(|| format!("Failed to open database {}", path.display()))
}

#[derive(Serialize)]
struct TagView {
    id: String,
    name: String,
}

impl From<Tag> for TagView {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id.to_string(),
            name: tag.name,
        }
    }
}

fn print_tags(list: Vec<Tag>) -> Result<()> {
    let views: Vec<TagView> = list.into_iter().map(TagView::from).collect();
    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}

fn parse_user_id(s: &str) -> Result<UserId> {
    s.parse()
        .with_context(|| format!("Invalid user ID: {s}"))
}

fn run_tag(command: TagCommands, config: &Config) -> Result<()> {
    let pool = open_db(config)?;
    let conn = get_conn(&pool)?;

    match command {
        TagCommands::Create { name } => {
            let tag = tags::create_tag(&conn, &name)?;
            println!("{}", tag.id);
        }
        TagCommands::List => print_tags(tags::list_tags(&conn)?)?,
    }
    Ok(())
}

fn run_user(command: UserCommands, config: &Config) -> Result<()> {
    let pool = open_db(config)?;

    match command {
        UserCommands::Create {
            first_name,
            last_name,
        } => {
            let conn = get_conn(&pool)?;
            let user = users::create_user(&conn, &first_name, &last_name)?;
            println!("{}", user.id);
        }
        UserCommands::SetTags { user_id, tag_ids } => {
            let user_id = parse_user_id(&user_id)?;
            let tag_ids = tag_ids
                .iter()
                .map(|s| {
                    s.parse::<TagId>()
                        .with_context(|| format!("Invalid tag ID: {s}"))
                })
                .collect::<Result<Vec<_>>>()?;

            let conn = get_conn(&pool)?;
            let delta = set_user_tags(&conn, user_id, &tag_ids)?;
            println!(
                "Added {} tag(s), removed {} tag(s)",
                delta.added.len(),
                delta.removed.len()
            );
        }
        UserCommands::Tags { user_id } => {
            let user_id = parse_user_id(&user_id)?;
            let conn = get_conn(&pool)?;
            if users::get_user(&conn, user_id)?.is_none() {
                anyhow::bail!("User not found: {}", user_id);
            }
            print_tags(tags::list_user_tags(&conn, user_id)?)?;
        }
        UserCommands::SetAvatar { user_id, image } => {
            let user_id = parse_user_id(&user_id)?;
            let data = std::fs::read(&image)
                .with_context(|| format!("Failed to read {}", image.display()))?;
            let file_name = image
                .file_name()
                .and_then(|n| n.to_str())
                .context("Image path has no file name")?;

            let service = AvatarService::from_config(&config.images, pool);
            let stored = service.set_avatar(user_id, file_name, &data)?;
            println!("{} ({}x{})", stored.path, stored.width, stored.height);
        }
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        println!("No config file given; defaults are valid");
        return Ok(());
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = Config::from_json(&contents)?;

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("Configuration is valid");
    } else {
        println!("Configuration has {} warning(s):", warnings.len());
        for w in &warnings {
            println!("  - {w}");
        }
    }
    Ok(())
}
