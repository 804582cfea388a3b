use medusa::{Layout, LayoutSettings, MidpointPlacement, ProfileNode, ShortcutOrigin};
use std::io::Read;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    Layout(medusa::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Layout(err) => write!(f, "{err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<medusa::Error> for CliError {
    fn from(value: medusa::Error) -> Self {
        Self::Layout(value)
    }
}

const USAGE: &str = "usage: medusa [--settings <file.json>] [--spider] [--collapse] [--origin <id>] [input.json]

Reads a JSON array of profile nodes ({id, parentId?, children, betweenTime,
withinTime}) from input.json or stdin, lays it out and writes the layout as
JSON to stdout.";

struct Args {
    settings_path: Option<String>,
    spider: bool,
    collapse: bool,
    origin: Option<String>,
    input_path: Option<String>,
}

fn parse_args() -> Result<Args, CliError> {
    let mut args = Args {
        settings_path: None,
        spider: false,
        collapse: false,
        origin: None,
        input_path: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--settings" => {
                args.settings_path =
                    Some(iter.next().ok_or(CliError::Usage("--settings needs a file"))?);
            }
            "--spider" => args.spider = true,
            "--collapse" => args.collapse = true,
            "--origin" => {
                args.origin = Some(iter.next().ok_or(CliError::Usage("--origin needs an id"))?);
            }
            "--help" | "-h" => return Err(CliError::Usage(USAGE)),
            _ if arg.starts_with("--") => return Err(CliError::Usage(USAGE)),
            _ => {
                if args.input_path.replace(arg).is_some() {
                    return Err(CliError::Usage(USAGE));
                }
            }
        }
    }
    Ok(args)
}

fn run() -> Result<(), CliError> {
    let args = parse_args()?;

    let mut settings = match &args.settings_path {
        Some(path) => serde_json::from_str::<LayoutSettings>(&std::fs::read_to_string(path)?)?,
        None => LayoutSettings::default(),
    };
    if args.spider {
        settings.midpoint_placement = MidpointPlacement::Spider;
    }
    if args.collapse {
        settings.collapse_nodes = true;
    }

    let input = match &args.input_path {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let nodes: Vec<ProfileNode> = serde_json::from_str(&input)?;

    let layout = match args.origin {
        Some(origin) => Layout::generate_sub(&nodes, ShortcutOrigin { origin }, settings)?,
        None => Layout::generate(&nodes, settings)?,
    };

    println!("{}", serde_json::to_string_pretty(&layout)?);
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
