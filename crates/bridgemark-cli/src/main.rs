use anyhow::{Context, Result};
use bridgemark_config::{Config, load_directory};
use bridgemark_engine::{
    Directory, Formatter, FormatterContext, InMemoryDirectory, MessageContent, User,
};
use std::{
    env,
    io::{self, Read},
    path::PathBuf,
    process,
};

const USAGE: &str = "<inbound|outbound> [--config PATH] [--directory PATH] [--user MXID] \
                     [--room ROOM_ID] [--plain] [--json]";
const DEFAULT_USER: &str = "@bridgemark:localhost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Matrix HTML to Discord markdown.
    Inbound,
    /// Discord markdown to Matrix content.
    Outbound,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    direction: Direction,
    config: Option<PathBuf>,
    directory: Option<PathBuf>,
    user: Option<String>,
    room: Option<String>,
    plain: bool,
    json: bool,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut iter = args.iter();
    let direction = match iter.next().map(String::as_str) {
        Some("inbound") => Direction::Inbound,
        Some("outbound") => Direction::Outbound,
        Some(other) => return Err(format!("unknown direction '{other}'")),
        None => return Err("missing direction".to_string()),
    };

    let mut parsed = Args {
        direction,
        config: None,
        directory: None,
        user: None,
        room: None,
        plain: false,
        json: false,
    };

    while let Some(flag) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{flag} needs a value"))
        };
        match flag.as_str() {
            "--config" => parsed.config = Some(PathBuf::from(value()?)),
            "--directory" => parsed.directory = Some(PathBuf::from(value()?)),
            "--user" => parsed.user = Some(value()?),
            "--room" => parsed.room = Some(value()?),
            "--plain" => parsed.plain = true,
            "--json" => parsed.json = true,
            other => return Err(format!("unknown option '{other}'")),
        }
    }
    Ok(parsed)
}

fn load_config(args: &Args) -> Result<Config> {
    let config = match &args.config {
        Some(path) => Config::load_from_path(path)?
            .with_context(|| format!("config file {} not found", path.display()))?,
        None => Config::load()?.unwrap_or_default(),
    };
    Ok(config)
}

fn load_bridge_directory(args: &Args, config: &Config) -> Result<InMemoryDirectory> {
    let directory = match &args.directory {
        Some(path) => load_directory(path)?,
        None => config.load_directory()?,
    };
    Ok(directory)
}

/// The acting user, with its Discord id filled in from the directory if known.
fn acting_user(args: &Args, directory: &InMemoryDirectory) -> User {
    let mxid = args.user.as_deref().unwrap_or(DEFAULT_USER);
    match directory.user_by_mxid(mxid) {
        Ok(Some(user)) => user,
        Ok(None) => User::new(mxid),
        Err(e) => {
            log::warn!("could not look up acting user {mxid}: {e}");
            User::new(mxid)
        }
    }
}

fn run(args: &Args, input: &str) -> Result<String> {
    let config = load_config(args)?;
    let directory = load_bridge_directory(args, &config)?;
    let user = acting_user(args, &directory);

    let portal = match &args.room {
        Some(room_id) => Some(
            directory
                .portal_by_room_id(room_id)?
                .with_context(|| format!("no portal for room {room_id}"))?,
        ),
        None => None,
    };

    let formatter = Formatter::new(directory, config.formatter);
    let mut ctx = FormatterContext::new(&user);
    if let Some(portal) = &portal {
        ctx = ctx.in_portal(portal);
    }

    let output = match args.direction {
        Direction::Inbound => {
            let content = if args.plain {
                MessageContent::plain(input)
            } else {
                MessageContent::html(input, input)
            };
            formatter.render_inbound(&ctx, &content)
        }
        Direction::Outbound => {
            let content = formatter.render_outbound(&ctx, input);
            if args.json {
                serde_json::to_string_pretty(&content)?
            } else {
                content.formatted_body.unwrap_or(content.body)
            }
        }
    };
    Ok(output)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();

    let argv: Vec<String> = env::args().collect();
    let program = argv.first().map_or("bridgemark-cli", String::as_str);
    let args = match parse_args(argv.get(1..).unwrap_or_default()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Usage: {program} {USAGE}");
            eprintln!(
                "Reads the message from stdin. Config is read from {} unless --config is given.",
                Config::config_path().display()
            );
            process::exit(1);
        }
    };

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("failed to read message from stdin")?;
    let input = input.strip_suffix('\n').unwrap_or(&input);

    println!("{}", run(&args, input)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn base_args(direction: Direction) -> Args {
        Args {
            direction,
            config: None,
            directory: None,
            user: None,
            room: None,
            plain: false,
            json: false,
        }
    }

    #[test]
    fn parses_all_options() {
        let parsed = parse_args(&args(&[
            "outbound",
            "--config",
            "/tmp/c.toml",
            "--directory",
            "/tmp/d.toml",
            "--user",
            "@a:hs",
            "--room",
            "!r:hs",
            "--json",
        ]))
        .unwrap();
        assert_eq!(
            parsed,
            Args {
                direction: Direction::Outbound,
                config: Some(PathBuf::from("/tmp/c.toml")),
                directory: Some(PathBuf::from("/tmp/d.toml")),
                user: Some("@a:hs".into()),
                room: Some("!r:hs".into()),
                plain: false,
                json: true,
            }
        );
    }

    #[rstest]
    #[case(&[], "missing direction")]
    #[case(&["sideways"], "unknown direction 'sideways'")]
    #[case(&["inbound", "--user"], "--user needs a value")]
    #[case(&["inbound", "--verbose"], "unknown option '--verbose'")]
    fn rejects_bad_arguments(#[case] list: &[&str], #[case] expected: &str) {
        assert_eq!(parse_args(&args(list)).unwrap_err(), expected);
    }

    #[test]
    fn acting_user_takes_discord_id_from_directory() {
        let directory =
            InMemoryDirectory::new().with_user(User::new("@a:hs").with_discord_id("77"));
        let mut parsed = base_args(Direction::Inbound);
        parsed.user = Some("@a:hs".into());
        assert_eq!(acting_user(&parsed, &directory).discord_id.as_deref(), Some("77"));

        parsed.user = None;
        assert_eq!(acting_user(&parsed, &directory).mxid, DEFAULT_USER);
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let mut parsed = base_args(Direction::Inbound);
        parsed.config = Some(PathBuf::from("/nonexistent/bridgemark/config.toml"));
        assert!(run(&parsed, "hi").is_err());
    }
}
