//! `fbgraph`: Facebook Graph API command-line client.
//!
//! Subcommands:
//!
//! - **`me`**: the user owning the access token.
//! - **`albums`**: that user's albums.
//! - **`photos`**: photos of an album.
//! - **`node`**: any node by kind and id.
//! - **`create-album`**: create an album for the current user.
//! - **`download`**: fetch the default-size image of a photo.
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use fbgraph::{
    Album, GraphClient, GraphConfig, GraphError, NodeKind, Photo, SimpleAuthorizer, User,
};
use serde::Serialize;
use tracing::info;

/// fbgraph: Facebook Graph API client
///
/// Endpoint and timeouts come from FBGRAPH_BASE_URL, FBGRAPH_TIMEOUT_SECS and
/// FBGRAPH_USER_AGENT.
#[derive(Parser)]
#[command(name = "fbgraph", version, about, long_about = None)]
struct Cli {
    /// OAuth access token sent with every request.
    #[arg(long, env = "FBGRAPH_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the user that owns the access token.
    Me,

    /// List the current user's albums.
    Albums,

    /// List the photos of an album.
    Photos {
        /// Album id.
        album_id: String,
    },

    /// Fetch any node by kind and id.
    ///
    /// Examples:
    ///   fbgraph node user 100001234
    ///   fbgraph node photo 10150146071831729
    Node {
        /// Node kind: user | album | photo
        kind: NodeKind,

        /// Node id.
        id: String,
    },

    /// Create an album for the current user and print it with its new id.
    CreateAlbum {
        /// Album name.
        #[arg(short = 'n', long)]
        name: String,

        /// Album description, sent as the album message.
        #[arg(short = 'd', long)]
        description: Option<String>,
    },

    /// Download the default-size image of a photo.
    Download {
        /// Photo id.
        photo_id: String,

        /// Where to write the image. Defaults to stdout.
        #[arg(short = 'o', long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fbgraph=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = GraphConfig::from_env().unwrap_or_else(|e| fatal(&e.to_string()));
    let client = GraphClient::new(&config).unwrap_or_else(|e| fatal(&e.to_string()));
    let auth = SimpleAuthorizer::new(cli.access_token);

    match cli.command {
        Command::Me => print_json(&or_fatal(User::get_me(&client, &auth))),

        Command::Albums => {
            let me = User::with_id(fbgraph::user::ME);
            print_json(&or_fatal(me.albums(&client, &auth)));
        }

        Command::Photos { album_id } => {
            let album = Album::with_id(album_id);
            print_json(&or_fatal(album.photos(&client, &auth)));
        }

        Command::Node { kind, id } => match kind {
            NodeKind::User => print_json(&or_fatal(User::from_id(&client, &auth, &id))),
            NodeKind::Album => print_json(&or_fatal(Album::from_id(&client, &auth, &id))),
            NodeKind::Photo => print_json(&or_fatal(Photo::from_id(&client, &auth, &id))),
        },

        Command::CreateAlbum { name, description } => {
            let me = or_fatal(User::get_me(&client, &auth));
            let mut album = Album::new(name);
            album.description = description;
            or_fatal(client.append_connected(&me, &mut album, &auth));
            info!(id = %album.node.id, "album created");
            print_json(&album);
        }

        Command::Download { photo_id, output } => {
            let photo = or_fatal(Photo::from_id(&client, &auth, &photo_id));
            let bytes = or_fatal(photo.download_default_size(&client, &auth));
            match output {
                Some(path) => {
                    fs::write(&path, &bytes).unwrap_or_else(|e| {
                        fatal(&format!("failed to write {}: {}", path.display(), e))
                    });
                    info!(bytes = bytes.len(), path = %path.display(), "photo saved");
                }
                None => io::stdout()
                    .write_all(&bytes)
                    .unwrap_or_else(|e| fatal(&format!("failed to write stdout: {}", e))),
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fatal(&format!("failed to encode output: {}", e)),
    }
}

fn or_fatal<T>(result: Result<T, GraphError>) -> T {
    result.unwrap_or_else(|e| fatal(&e.to_string()))
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("fbgraph: {}", msg);
    process::exit(2);
}
