//! drivekit CLI - Command line access to Google Drive.
//!
//! Authorize once with `drivekit auth`, then list, copy, move, download,
//! upload, update and share files.

mod store;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use drivekit_client::{
    AuthManager, CopyRequest, DriveClient, DriveConfig, DriveFile, DriveQuery, FileList, ItemKind,
    ListParams, MatchMode, MetadataUpdate, MoveParams, NewPermission, Parent, Quoting, Role,
    UploadMetadata,
};

#[derive(Parser)]
#[command(name = "drivekit")]
#[command(about = "drivekit - Google Drive from the command line")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (JSON).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// OAuth2 client ID (overrides the config file).
    #[arg(long, global = true)]
    client_id: Option<String>,

    /// OAuth2 client secret (overrides the config file).
    #[arg(long, global = true)]
    client_secret: Option<String>,

    /// Credential file (default: <config dir>/drivekit/credentials.json).
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize access to Google Drive.
    Auth {
        /// Print the consent URL instead of opening a browser.
        #[arg(long)]
        no_browser: bool,
    },

    /// Forget the stored credential.
    Logout,

    /// Show the authorized account and storage usage.
    About,

    /// List files and folders.
    Ls(ListArgs),

    /// Find files by name.
    Find {
        /// Name to search for.
        name: String,

        /// Parent folder ID ("all" for any).
        #[arg(short, long)]
        folder: Option<String>,

        /// Match mode: exact, contains or not_equal.
        #[arg(short, long, default_value = "exact")]
        r#match: MatchMode,
    },

    /// Show file metadata.
    Stat {
        file_id: String,

        /// Partial response selector.
        #[arg(long, default_value = "id,name,mimeType,size,createdTime,modifiedTime,parents,md5Checksum,starred,trashed,description,webViewLink")]
        fields: String,
    },

    /// Copy a file.
    Cp {
        file_id: String,

        /// Name of the copy.
        #[arg(short, long)]
        name: Option<String>,

        /// Target folder ID.
        #[arg(short, long)]
        to: Option<String>,
    },

    /// Delete a file permanently.
    Rm { file_id: String },

    /// Download a file.
    Get {
        file_id: String,

        /// Destination file path.
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Upload a file.
    Put {
        /// Source file to upload.
        source: PathBuf,

        /// Name in Drive (default: source file name when --to is given).
        #[arg(short, long)]
        name: Option<String>,

        /// Target folder ID.
        #[arg(short, long)]
        to: Option<String>,

        /// Content type of the upload.
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
    },

    /// Move a file between folders.
    Mv {
        file_id: String,

        /// Folder to add as parent.
        #[arg(short, long)]
        to: Option<String>,

        /// Folder to remove as parent.
        #[arg(short, long)]
        from: Option<String>,
    },

    /// Update file metadata.
    Update {
        file_id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        starred: Option<bool>,

        #[arg(long)]
        trashed: Option<bool>,
    },

    /// Manage sharing permissions.
    #[command(subcommand)]
    Perms(PermsCommand),

    /// Generate shell completions.
    Completions { shell: Shell },
}

#[derive(Args)]
struct ListArgs {
    /// Parent folder ID ("all" for any).
    #[arg(short, long)]
    folder: Option<String>,

    /// Only list folders.
    #[arg(long, conflicts_with = "files")]
    folders: bool,

    /// Only list non-folders.
    #[arg(long)]
    files: bool,

    /// Name filter.
    #[arg(short, long)]
    name: Option<String>,

    /// Match mode for --name: exact, contains or not_equal.
    #[arg(short, long, default_value = "contains")]
    r#match: MatchMode,

    /// Insert filter values without escaping quotes.
    #[arg(long)]
    verbatim: bool,

    #[arg(long)]
    page_size: Option<u32>,

    /// Continue from a previous listing.
    #[arg(long)]
    page_token: Option<String>,

    #[arg(long)]
    order_by: Option<String>,

    /// Raw search expression; replaces --folder/--folders/--files/--name.
    #[arg(short, long)]
    query: Option<String>,
}

impl ListArgs {
    fn to_params(&self) -> ListParams {
        let q = match &self.query {
            Some(raw) => raw.clone(),
            None => {
                let kind = if self.folders {
                    ItemKind::Folders
                } else if self.files {
                    ItemKind::Files
                } else {
                    ItemKind::Any
                };

                let mut query = DriveQuery::new()
                    .parent(Parent::from_id(self.folder.as_deref()))
                    .kind(kind);
                if let Some(name) = &self.name {
                    query = query.name(name, self.r#match);
                }
                if self.verbatim {
                    query = query.quoting(Quoting::Verbatim);
                }
                query.build()
            }
        };

        ListParams {
            q: Some(q),
            page_size: self.page_size,
            page_token: self.page_token.clone(),
            order_by: self.order_by.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum PermsCommand {
    /// List permissions of a file.
    Ls { file_id: String },

    /// Show one permission.
    Get {
        file_id: String,
        permission_id: String,
    },

    /// Share a file with a user, or with anyone holding the link.
    Add {
        file_id: String,

        /// Email address of the grantee; omit to share with anyone.
        #[arg(short, long)]
        email: Option<String>,

        /// reader, commenter or writer.
        #[arg(short, long, default_value = "reader")]
        role: String,
    },

    /// Remove a permission.
    Rm {
        file_id: String,
        permission_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli)?;
    let credentials_path = match &cli.credentials {
        Some(path) => path.clone(),
        None => store::default_path()?,
    };

    match &cli.command {
        Commands::Auth { no_browser } => cmd_auth(&config, &credentials_path, *no_browser).await,
        Commands::Logout => cmd_logout(&credentials_path),
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "drivekit", &mut std::io::stdout());
            Ok(())
        }
        command => {
            let client = connect(config, &credentials_path).await?;
            run(&client, command, cli.json).await
        }
    }
}

/// Build the configuration from file and flags.
fn load_config(cli: &Cli) -> Result<DriveConfig> {
    let mut config = match &cli.config {
        Some(path) => DriveConfig::load(path).context("Failed to load configuration")?,
        None => DriveConfig::default(),
    };

    if let Some(id) = &cli.client_id {
        config.auth.client_id = id.clone();
    }
    if let Some(secret) = &cli.client_secret {
        config.auth.client_secret = secret.clone();
    }

    Ok(config)
}

/// Create an authorized client from the stored credential.
async fn connect(config: DriveConfig, credentials_path: &Path) -> Result<DriveClient> {
    let mut credential = store::load(credentials_path)?
        .context("Not authorized. Run `drivekit auth` first")?;

    if credential.is_expired() {
        match credential.refresh_token.clone() {
            Some(refresh_token) if !config.auth.client_id.is_empty() => {
                let manager = AuthManager::new(config.auth.clone())?;
                credential = manager
                    .refresh(&refresh_token)
                    .await
                    .context("Failed to refresh access token")?;
                store::save(credentials_path, &credential)?;
            }
            _ => warn!("Stored access token has expired; run `drivekit auth` if calls fail"),
        }
    }

    Ok(DriveClient::new(config)?.with_credential(credential))
}

/// Run the interactive authorization flow.
async fn cmd_auth(config: &DriveConfig, credentials_path: &Path, no_browser: bool) -> Result<()> {
    let manager = AuthManager::new(config.auth.clone())
        .context("Set --client-id/--client-secret or provide them in --config")?;
    let (url, state) = manager.authorization_url();

    println!("Open this URL to authorize drivekit:\n\n  {}\n", url);
    if !no_browser {
        if let Err(e) = open::that(&url) {
            warn!("Could not open a browser: {}", e);
        }
    }

    print!("Paste the redirect URL or the code: ");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;

    let code = drivekit_client::parse_redirect(&input, &state)?;
    let credential = manager.exchange_code(&code).await?;
    store::save(credentials_path, &credential)?;

    info!("Credential saved to {}", credentials_path.display());
    println!("Authorized.");
    Ok(())
}

fn cmd_logout(credentials_path: &Path) -> Result<()> {
    if store::remove(credentials_path)? {
        println!("Credential removed.");
    } else {
        println!("No stored credential.");
    }
    Ok(())
}

async fn run(client: &DriveClient, command: &Commands, json: bool) -> Result<()> {
    match command {
        Commands::About => {
            let about = client.about("user,storageQuota").await?;
            if json {
                return print_json(&about);
            }
            if let Some(user) = &about.user {
                println!(
                    "User: {} <{}>",
                    user.display_name,
                    user.email_address.as_deref().unwrap_or("?")
                );
            }
            if let Some(quota) = &about.storage_quota {
                println!(
                    "Usage: {} of {} bytes",
                    quota.usage.as_deref().unwrap_or("?"),
                    quota.limit.as_deref().unwrap_or("unlimited")
                );
            }
        }

        Commands::Ls(args) => {
            let list = client.list(&args.to_params()).await?;
            print_list(&list, json)?;
        }

        Commands::Find {
            name,
            folder,
            r#match,
        } => {
            let list = client
                .find_by_name(Parent::from_id(folder.as_deref()), name, *r#match)
                .await?;
            print_list(&list, json)?;
        }

        Commands::Stat { file_id, fields } => {
            let file = client.get_metadata(file_id, Some(fields.as_str())).await?;
            print_file(&file, json)?;
        }

        Commands::Cp { file_id, name, to } => {
            let file = client
                .copy(file_id, &CopyRequest::new(name.as_deref(), to.as_deref()))
                .await?;
            print_file(&file, json)?;
        }

        Commands::Rm { file_id } => {
            client.delete(file_id).await?;
            println!("Deleted {}", file_id);
        }

        Commands::Get { file_id, out } => {
            let content = client.download(file_id).await?;
            tokio::fs::write(out, &content)
                .await
                .context("Failed to write output file")?;
            println!("Downloaded {} ({} bytes)", out.display(), content.len());
        }

        Commands::Put {
            source,
            name,
            to,
            mime,
        } => {
            let content = tokio::fs::read(source)
                .await
                .context("Failed to read source file")?;
            info!("Uploading {} ({} bytes)", source.display(), content.len());

            let file = if name.is_none() && to.is_none() {
                client.upload(content, mime).await?
            } else {
                let name = name.clone().or_else(|| {
                    source
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                });
                let metadata = UploadMetadata {
                    name,
                    parents: to.clone().map(|folder| vec![folder]),
                    mime_type: None,
                };
                client.upload_with_metadata(&metadata, content, mime).await?
            };
            print_file(&file, json)?;
        }

        Commands::Mv { file_id, to, from } => {
            let params = MoveParams {
                add_parents: to.clone(),
                remove_parents: from.clone(),
            };
            if params.is_empty() {
                anyhow::bail!("Nothing to do: pass --to and/or --from");
            }
            let file = client.move_file(file_id, &params).await?;
            print_file(&file, json)?;
        }

        Commands::Update {
            file_id,
            name,
            description,
            starred,
            trashed,
        } => {
            let update = MetadataUpdate {
                name: name.clone(),
                description: description.clone(),
                starred: *starred,
                trashed: *trashed,
            };
            if update.is_empty() {
                anyhow::bail!("Nothing to update");
            }
            let file = client.update_metadata(file_id, &update).await?;
            print_file(&file, json)?;
        }

        Commands::Perms(command) => run_perms(client, command, json).await?,

        Commands::Auth { .. } | Commands::Logout | Commands::Completions { .. } => {
            anyhow::bail!("This command does not use a Drive connection");
        }
    }

    Ok(())
}

async fn run_perms(client: &DriveClient, command: &PermsCommand, json: bool) -> Result<()> {
    match command {
        PermsCommand::Ls { file_id } => {
            let list = client.list_permissions(file_id).await?;
            if json {
                return print_json(&list);
            }
            for p in &list.permissions {
                println!(
                    "{:<24} {:<10} {:<8} {}",
                    p.id,
                    p.role,
                    p.grantee_type,
                    p.email_address.as_deref().or(p.domain.as_deref()).unwrap_or("")
                );
            }
        }
        PermsCommand::Get {
            file_id,
            permission_id,
        } => {
            let p = client.get_permission(file_id, permission_id).await?;
            if json {
                return print_json(&p);
            }
            println!("{} {} {}", p.id, p.role, p.grantee_type);
        }
        PermsCommand::Add {
            file_id,
            email,
            role,
        } => {
            let role = parse_role(role)?;
            let permission = match email {
                Some(email) => NewPermission::user(role, email),
                None => NewPermission::anyone(role),
            };
            let p = client.create_permission(file_id, &permission).await?;
            if json {
                return print_json(&p);
            }
            println!("Created permission {}", p.id);
        }
        PermsCommand::Rm {
            file_id,
            permission_id,
        } => {
            client.delete_permission(file_id, permission_id).await?;
            println!("Removed permission {}", permission_id);
        }
    }
    Ok(())
}

fn parse_role(role: &str) -> Result<Role> {
    match role {
        "reader" => Ok(Role::Reader),
        "commenter" => Ok(Role::Commenter),
        "writer" => Ok(Role::Writer),
        "fileOrganizer" => Ok(Role::FileOrganizer),
        "organizer" => Ok(Role::Organizer),
        other => anyhow::bail!("Unknown role '{}'", other),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_list(list: &FileList, json: bool) -> Result<()> {
    if json {
        return print_json(list);
    }

    if list.files.is_empty() {
        println!("No files.");
    }
    for file in &list.files {
        let kind = if file.is_folder() { "[DIR] " } else { "[FILE]" };
        println!("{} {:<44} {}", kind, file.id, file.name);
    }
    if let Some(token) = &list.next_page_token {
        println!("\nMore results: --page-token {}", token);
    }
    Ok(())
}

fn print_file(file: &DriveFile, json: bool) -> Result<()> {
    if json {
        return print_json(file);
    }

    println!("ID:       {}", file.id);
    println!("Name:     {}", file.name);
    println!("Type:     {}", file.mime_type);
    if let Some(size) = file.size_bytes() {
        println!("Size:     {} bytes", size);
    }
    if let Some(modified) = file.modified_time {
        println!("Modified: {}", modified);
    }
    if !file.parents.is_empty() {
        println!("Parents:  {}", file.parents.join(", "));
    }
    if let Some(link) = &file.web_view_link {
        println!("Link:     {}", link);
    }
    Ok(())
}
