use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use murmur_api::{ChatClient, DirectoryService, MemoryDirectory};
use murmur_tui::{ConversationRequest, RecipientSelection, Session, channel_path};
use murmur_types::DmRestriction;
use murmur_util::{UserPreferences, redact_sensitive, state_dir};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Team used by `--demo` when none is given.
const DEMO_TEAM: &str = "team1";

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    // No subcommands => TUI, which owns the terminal, so logs go to a file.
    let interactive = matches.subcommand_name().is_none();
    init_tracing(interactive);

    let preferences = UserPreferences::new().unwrap_or_else(|error| {
        warn!(%error, "preferences unavailable; using an in-memory store");
        UserPreferences::ephemeral()
    });

    if let Err(error) = run(&matches, &preferences).await {
        eprintln!("error: {}", redact_sensitive(&format!("{error:#}")));
        std::process::exit(1);
    }
    Ok(())
}

fn build_cli() -> Command {
    Command::new("murmur")
        .about("Terminal client for a team chat server")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("url")
                .long("url")
                .env("MURMUR_URL")
                .action(ArgAction::Set)
                .help("Server URL, e.g. https://chat.example.com"),
        )
        .arg(
            Arg::new("token")
                .long("token")
                .env("MURMUR_TOKEN")
                .hide_env_values(true)
                .action(ArgAction::Set)
                .help("Personal access token (falls back to ~/.netrc)"),
        )
        .arg(
            Arg::new("team")
                .long("team")
                .env("MURMUR_TEAM")
                .action(ArgAction::Set)
                .help("Team name; defaults to the last team used"),
        )
        .arg(
            Arg::new("restrict-dm")
                .long("restrict-dm")
                .env("MURMUR_RESTRICT_DM")
                .value_parser(value_parser!(DmRestriction))
                .help("Override the server's direct message restriction (any|team)"),
        )
        .arg(
            Arg::new("theme")
                .long("theme")
                .value_parser(|value: &str| {
                    murmur_tui::resolve_theme_id(value)
                        .map(str::to_string)
                        .ok_or_else(|| format!("unknown theme '{value}' (try dracula or nord)"))
                })
                .help("Color theme for the TUI; the choice is remembered"),
        )
        .arg(
            Arg::new("demo")
                .long("demo")
                .action(ArgAction::SetTrue)
                .help("Use built-in sample users instead of a server"),
        )
        .subcommand(
            Command::new("dm")
                .about("Open a direct or group conversation and print its location")
                .arg(
                    Arg::new("usernames")
                        .required(true)
                        .num_args(1..)
                        .action(ArgAction::Append)
                        .help("Usernames of the recipients (a leading @ is ignored)"),
                ),
        )
}

fn init_tracing(to_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if to_file {
        let dir = state_dir();
        let file = fs::create_dir_all(&dir)
            .and_then(|_| OpenOptions::new().create(true).append(true).open(dir.join("murmur.log")));
        // Without a log file there is nowhere safe to write while the TUI draws.
        if let Ok(file) = file {
            let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
        }
        return;
    }

    let _ = builder.with_writer(std::io::stderr).try_init();
}

async fn run(matches: &ArgMatches, preferences: &UserPreferences) -> Result<()> {
    let session = connect(matches, preferences).await?;

    match matches.subcommand() {
        Some(("dm", sub)) => {
            let usernames: Vec<String> = sub.get_many::<String>("usernames").into_iter().flatten().cloned().collect();
            let location = open_conversation(&session, &usernames).await?;
            println!("{location}");
            Ok(())
        }
        Some((other, _)) => bail!("unknown subcommand '{other}'"),
        None => {
            let session = Session {
                preferred_theme: choose_theme(matches, preferences),
                ..session
            };
            murmur_tui::run(session).await
        }
    }
}

/// The theme from `--theme`, persisted for later sessions, else the remembered one.
fn choose_theme(matches: &ArgMatches, preferences: &UserPreferences) -> Option<String> {
    let Some(theme) = matches.get_one::<String>("theme") else {
        return preferences.preferred_theme();
    };
    if let Err(error) = preferences.set_preferred_theme(Some(theme.clone())) {
        warn!(%error, "could not persist the theme choice");
    }
    Some(theme.clone())
}

/// Resolve the directory service, signed-in user, team and DM restriction.
async fn connect(matches: &ArgMatches, preferences: &UserPreferences) -> Result<Session> {
    let demo = matches.get_flag("demo");
    let server_url = matches.get_one::<String>("url").cloned().or_else(|| preferences.server_url());

    let service: Arc<dyn DirectoryService> = if demo {
        info!("running against the demo directory");
        Arc::new(MemoryDirectory::demo())
    } else {
        let url = server_url
            .as_deref()
            .context("no server URL; pass --url or set MURMUR_URL")?;
        let client = match matches.get_one::<String>("token") {
            Some(token) => ChatClient::new(url, Some(token.clone()))?,
            None => ChatClient::from_env(url)?,
        };
        Arc::new(client)
    };

    let team_name = matches
        .get_one::<String>("team")
        .cloned()
        .or_else(|| preferences.last_team())
        .or_else(|| demo.then(|| DEMO_TEAM.to_string()))
        .context("no team; pass --team or set MURMUR_TEAM")?;

    let current_user = service.current_user().await.context("fetch the signed-in user")?;
    let team = service
        .team_by_name(&team_name)
        .await
        .with_context(|| format!("look up team '{team_name}'"))?;

    let restriction = match matches.get_one::<DmRestriction>("restrict-dm") {
        Some(restriction) => *restriction,
        None => service.restrict_direct_message().await.unwrap_or_else(|error| {
            warn!(%error, "could not read the direct message restriction; assuming 'any'");
            DmRestriction::default()
        }),
    };
    debug!(user = %current_user.username, team = %team.name, %restriction, "session resolved");

    if !demo
        && let Some(url) = server_url.as_deref()
        && let Err(error) = preferences.remember_session(url, &team.name)
    {
        warn!(%error, "could not persist session preferences");
    }

    Ok(Session {
        service,
        current_user,
        team,
        restriction,
        preferred_theme: None,
    })
}

/// Open the conversation with `usernames` and return its location.
async fn open_conversation(session: &Session, usernames: &[String]) -> Result<String> {
    let scope = session.restriction.team_scope(&session.team.id);
    let mut selection = RecipientSelection::new(session.current_user.id.clone());

    for username in usernames {
        let name = username.trim().trim_start_matches('@');
        let candidates = session
            .service
            .search_profiles(name, scope)
            .await
            .with_context(|| format!("search for @{name}"))?;
        let user = candidates
            .into_iter()
            .find(|user| user.username.eq_ignore_ascii_case(name))
            .with_context(|| format!("no user named @{name}"))?;
        if !selection.add_single(&user) {
            debug!(username = %user.username, "skipping duplicate or self recipient");
        }
    }

    let request = selection
        .conversation_request()
        .context("no recipients besides yourself")?;
    let channel = match request {
        ConversationRequest::Direct(user_id) => {
            session
                .service
                .create_direct_channel(&session.current_user.id, &user_id)
                .await
        }
        ConversationRequest::Group(user_ids) => session.service.create_group_channel(&user_ids).await,
    }
    .context("open the conversation")?;

    info!(channel = %channel.id, "conversation opened");
    Ok(channel_path(&session.team.name, &channel.name))
}
