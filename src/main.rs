mod config;
mod credentials;
mod error;
mod executor;
mod flickr_client;
mod logging;
mod model;
mod oauth;
mod paging;
mod planner;
mod session;
#[cfg(test)]
mod testing;

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use git_version::git_version;

use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::executor::DownloadExecutor;
use crate::flickr_client::{FlickrClient, PhotoService};
use crate::planner::{DownloadPlanner, Selection};
use crate::session::AuthSession;

pub const GIT_VERSION: &str =
    git_version!(args = ["--always", "--dirty=-modified"], fallback = "unknown");

/// Download photos from a flickr account.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Flickr API access key.
    #[arg(short = 'k', long, global = true, env = "FLICKR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Flickr API access secret.
    #[arg(short = 's', long, global = true, env = "FLICKR_API_SECRET", hide_env_values = true)]
    api_secret: Option<String>,

    /// Verbosity. For increased verbosity use -vv, -vvv.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// File holding the login tokens. Defaults to ~/.flickroauthtoken.
    #[arg(long, global = true, env = "FLICKR_CREDENTIAL_FILE")]
    credential_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Login to flickr (optional).
    Login {
        /// Overwrite existing login tokens.
        #[arg(short, long)]
        overwrite: bool,

        /// Flickr account access OAuth token.
        #[arg(short = 'n', long, env = "FLICKR_AUTH_TOKEN", hide_env_values = true)]
        auth_token: Option<String>,

        /// Flickr account access OAuth secret.
        #[arg(short = 't', long, env = "FLICKR_AUTH_SECRET", hide_env_values = true)]
        auth_secret: Option<String>,
    },
    /// Logout. Clear existing login tokens.
    Logout,
    /// Download photos from flickr.
    Download(DownloadArgs),
}

#[derive(Args, Debug)]
struct DownloadArgs {
    /// Location to which photos will be downloaded. Default is the current
    /// working directory.
    #[arg(short, long)]
    location: Option<PathBuf>,

    /// Email id of the flickr account from which photos need to be downloaded.
    /// Photos that are not public need a login for this account, see `login`.
    #[arg(short = 'e', long)]
    flickr_email: String,

    #[command(flatten)]
    selection: SelectionArgs,

    /// Do not download files to disk. Use this option to verify the content to
    /// be downloaded is correct.
    #[arg(short, long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SelectionArgs {
    /// Download all photos.
    #[arg(short, long)]
    all: bool,

    /// Download photos from specified album.
    #[arg(short = 'm', long)]
    album: Option<String>,

    /// Download all albums. Photos that are not part of any album will not be
    /// downloaded. Photos part of multiple albums will be duplicated.
    #[arg(short = 'b', long)]
    all_albums: bool,
}

impl From<SelectionArgs> for Selection {
    fn from(args: SelectionArgs) -> Self {
        match args {
            SelectionArgs {
                album: Some(title), ..
            } => Selection::Album(title),
            SelectionArgs {
                all_albums: true, ..
            } => Selection::AllAlbums,
            _ => Selection::All,
        }
    }
}

fn banner() -> String {
    format!("Flickr Downloader {GIT_VERSION}")
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let config = Config::new(
        cli.api_key,
        cli.api_secret,
        cli.credential_file,
        cli.verbose,
    );
    logging::init(config.as_ref().map_or(cli.verbose, |c| c.verbosity));

    log::info!("{}", banner());

    let result = match config {
        Ok(config) => run(&config, cli.command).await,
        Err(err) => Err(err.into()),
    };
    let code = match result {
        Ok(()) => 0,
        Err(err) => {
            log::error!("{err:#}");
            1
        }
    };
    std::process::exit(code);
}

async fn run(config: &Config, command: Command) -> anyhow::Result<()> {
    let store = CredentialStore::new(&config.credential_path);

    match command {
        Command::Login {
            overwrite,
            auth_token,
            auth_secret,
        } => {
            let client = FlickrClient::from_config(config)?;
            let stdin = std::io::stdin();
            AuthSession::new(&store)
                .interactive_login(
                    &client,
                    auth_token,
                    auth_secret,
                    overwrite,
                    &mut stdin.lock(),
                )
                .await?;
        }
        Command::Logout => {
            AuthSession::new(&store).logout()?;
        }
        Command::Download(args) => download(config, &store, args).await?,
    }

    Ok(())
}

async fn download(
    config: &Config,
    store: &CredentialStore,
    args: DownloadArgs,
) -> anyhow::Result<()> {
    let mut client = FlickrClient::from_config(config)?;
    let mut session = AuthSession::new(store);
    if let Some(credential) = session.load_stored()? {
        client = client.with_credential(credential.clone());
    }

    let location = match args.location {
        Some(location) => location,
        None => std::env::current_dir().context("could not read the current directory")?,
    };
    let selection = Selection::from(args.selection);
    log::trace!(
        "Location: {}, email: {}, selection: {selection:?}, dry run: {}",
        location.display(),
        args.flickr_email,
        args.dry_run
    );

    let account = client.find_account_by_email(&args.flickr_email).await?;
    log::trace!(
        "Downloading from flickr account with id: {}, username: {}",
        account.id,
        account.display_name
    );

    let root = planner::run_folder(
        &location,
        &account.display_name,
        chrono::Local::now().naive_local(),
    );
    let plan = DownloadPlanner::new(&client, &account, root).build_stream(selection);
    DownloadExecutor::new(&client, args.dry_run)
        .consume(plan)
        .await?;

    log::info!("Done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Command, GIT_VERSION, banner};
    use crate::planner::Selection;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn banner_shows_at_default_verbosity() {
        assert_eq!(format!("Flickr Downloader {GIT_VERSION}"), banner());
        assert!(
            crate::logging::filter_for(0)
                .would_enable(module_path!(), &tracing::Level::INFO)
        );
    }

    #[test]
    fn download_selection_is_parsed() {
        let cli = Cli::try_parse_from([
            "flickr-downloader",
            "-vv",
            "download",
            "-e",
            "jane@example.com",
            "--album",
            "Trip",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(2, cli.verbose);
        let Command::Download(args) = cli.command else {
            panic!("expected download");
        };
        assert!(args.dry_run);
        assert_eq!(
            Selection::Album("Trip".to_string()),
            Selection::from(args.selection)
        );
    }

    #[test]
    fn download_requires_exactly_one_selection() {
        let none = Cli::try_parse_from(["flickr-downloader", "download", "-e", "jane@example.com"]);
        assert!(none.is_err());

        let both = Cli::try_parse_from([
            "flickr-downloader",
            "download",
            "-e",
            "jane@example.com",
            "--all",
            "--all-albums",
        ]);
        assert!(both.is_err());
    }

    #[test]
    fn login_flags_are_parsed() {
        let cli = Cli::try_parse_from(["flickr-downloader", "login", "-o", "-n", "tok", "-t", "sec"])
            .unwrap();

        assert!(matches!(
            cli.command,
            Command::Login { overwrite: true, auth_token: Some(ref t), auth_secret: Some(ref s) }
                if t == "tok" && s == "sec"
        ));
    }
}
