//! Command grammars
//!
//! A command line is tried against a fixed list of grammars in priority
//! order. The first grammar that recognizes the line decides the outcome,
//! including any argument error. A line no grammar recognizes is an
//! `UnrecognizedCommand`.

use super::args::{tokenize, FlagSpec, ParsedArgs};
use crate::error::CommandError;
use sandbox_bus::{validate_filter, validate_topic};

const TOPIC: FlagSpec = FlagSpec::value(&["-t", "--topic"]);
const MESSAGE: FlagSpec = FlagSpec::value(&["-m", "--message"]);
const NULL_MESSAGE: FlagSpec = FlagSpec::switch(&["-n", "--null-message"]);
const RETAIN: FlagSpec = FlagSpec::switch(&["-r", "--retain"]);
const VERBOSE: FlagSpec = FlagSpec::switch(&["-v", "--verbose"]);
const COUNT: FlagSpec = FlagSpec::value(&["-C"]);
const RESPONSE_TOPIC: FlagSpec = FlagSpec::value(&["-e", "--response-topic"]);
const WAIT: FlagSpec = FlagSpec::value(&["-W"]);
const FOLLOW: FlagSpec = FlagSpec::switch(&["-f", "-F", "--follow"]);
const UNIT: FlagSpec = FlagSpec::value(&["-u", "--unit"]);
const PORT: FlagSpec = FlagSpec::value(&["-p", "--port"]);

// Accepted so their values are not mistaken for positionals, otherwise ignored.
const HOST: FlagSpec = FlagSpec::value(&["-h", "--host"]);
const QOS: FlagSpec = FlagSpec::value(&["-q", "--qos"]);
const CLIENT_ID: FlagSpec = FlagSpec::value(&["-i", "--id"]);

const PUBLISH_FLAGS: &[FlagSpec] = &[TOPIC, MESSAGE, NULL_MESSAGE, RETAIN, HOST, PORT, QOS, CLIENT_ID];
const SUBSCRIBE_FLAGS: &[FlagSpec] = &[TOPIC, VERBOSE, COUNT, HOST, PORT, QOS, CLIENT_ID];
const REQUEST_FLAGS: &[FlagSpec] = &[TOPIC, RESPONSE_TOPIC, MESSAGE, WAIT, HOST, PORT, QOS, CLIENT_ID];
const TAIL_FLAGS: &[FlagSpec] = &[FOLLOW];
const JOURNAL_FLAGS: &[FlagSpec] = &[FOLLOW, UNIT];
const NODE_RED_FLAGS: &[FlagSpec] = &[PORT];

/// `mosquitto_pub` arguments
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishArgs {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

/// `mosquitto_sub` arguments
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscribeArgs {
    pub filter: String,
    pub verbose: bool,
    pub count: Option<u32>,
}

/// `mosquitto_rr` arguments
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestArgs {
    pub request_topic: String,
    pub response_topic: String,
    pub payload: String,
    /// `None` means the configured default
    pub wait_ms: Option<u64>,
}

/// A recognized command line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Blank line
    Empty,
    Clear,
    Help,
    Publish(PublishArgs),
    Subscribe(SubscribeArgs),
    RequestResponse(RequestArgs),
    Status,
    FollowLog,
    InstallNodeRed,
    /// `None` means the configured default port
    StartNodeRed { port: Option<u16> },
}

impl Command {
    /// Parse a raw command line.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut tokens = tokenize(line);
        if tokens.first().is_some_and(|t| t == "sudo") {
            tokens.remove(0);
        }

        let Some(program) = tokens.first() else {
            return Ok(Self::Empty);
        };

        GRAMMARS
            .iter()
            .find_map(|grammar| grammar(&tokens))
            .unwrap_or_else(|| {
                Err(CommandError::UnrecognizedCommand {
                    program: program.clone(),
                })
            })
    }

    /// Whether the command publishes or subscribes.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Publish(_) | Self::Subscribe(_) | Self::RequestResponse(_)
        )
    }

    /// Program name as the user would type it.
    pub fn program(&self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::Clear => "clear",
            Self::Help => "help",
            Self::Publish(_) => "mosquitto_pub",
            Self::Subscribe(_) => "mosquitto_sub",
            Self::RequestResponse(_) => "mosquitto_rr",
            Self::Status => "systemctl",
            Self::FollowLog => "tail",
            Self::InstallNodeRed => "npm",
            Self::StartNodeRed { .. } => "node-red",
        }
    }
}

/// A grammar returns `None` when the line is not its command.
type Grammar = fn(&[String]) -> Option<Result<Command, CommandError>>;

/// Priority order.
const GRAMMARS: [Grammar; 9] = [
    clear,
    help,
    publish,
    subscribe,
    request_response,
    status,
    follow_log,
    install_node_red,
    start_node_red,
];

fn program_is(tokens: &[String], name: &str) -> bool {
    tokens.first().is_some_and(|t| t == name)
}

fn clear(tokens: &[String]) -> Option<Result<Command, CommandError>> {
    program_is(tokens, "clear").then_some(Ok(Command::Clear))
}

fn help(tokens: &[String]) -> Option<Result<Command, CommandError>> {
    program_is(tokens, "help").then_some(Ok(Command::Help))
}

fn publish(tokens: &[String]) -> Option<Result<Command, CommandError>> {
    program_is(tokens, "mosquitto_pub")
        .then(|| publish_args(&ParsedArgs::scan(&tokens[1..], PUBLISH_FLAGS)))
}

fn publish_args(args: &ParsedArgs) -> Result<Command, CommandError> {
    let topic = required_topic(args, "-t", "topic")?;
    let payload = match args.value("-m") {
        Some(message) => message.to_string(),
        None if args.switch("-n") => String::new(),
        None => {
            return Err(CommandError::MissingArgument {
                flag: "-m",
                what: "message, or -n for an empty payload",
            })
        }
    };
    Ok(Command::Publish(PublishArgs {
        topic,
        payload,
        retain: args.switch("-r"),
    }))
}

fn subscribe(tokens: &[String]) -> Option<Result<Command, CommandError>> {
    program_is(tokens, "mosquitto_sub")
        .then(|| subscribe_args(&ParsedArgs::scan(&tokens[1..], SUBSCRIBE_FLAGS)))
}

fn subscribe_args(args: &ParsedArgs) -> Result<Command, CommandError> {
    let filter = args.value("-t").ok_or(CommandError::MissingArgument {
        flag: "-t",
        what: "topic filter",
    })?;
    validate_filter(filter).map_err(|reason| CommandError::InvalidTopic {
        topic: filter.to_string(),
        reason,
    })?;
    let count = args
        .value("-C")
        .map(|raw| positive::<u32>("-C", raw))
        .transpose()?;
    Ok(Command::Subscribe(SubscribeArgs {
        filter: filter.to_string(),
        verbose: args.switch("-v"),
        count,
    }))
}

fn request_response(tokens: &[String]) -> Option<Result<Command, CommandError>> {
    program_is(tokens, "mosquitto_rr")
        .then(|| request_args(&ParsedArgs::scan(&tokens[1..], REQUEST_FLAGS)))
}

fn request_args(args: &ParsedArgs) -> Result<Command, CommandError> {
    let request_topic = required_topic(args, "-t", "request topic")?;
    let response_topic = required_topic(args, "-e", "response topic")?;
    let wait_ms = args
        .value("-W")
        .map(|raw| positive::<u64>("-W", raw))
        .transpose()?;
    Ok(Command::RequestResponse(RequestArgs {
        request_topic,
        response_topic,
        payload: args.value("-m").unwrap_or_default().to_string(),
        wait_ms,
    }))
}

fn status(tokens: &[String]) -> Option<Result<Command, CommandError>> {
    let words: Vec<&str> = tokens.iter().map(String::as_str).collect();
    match words.as_slice() {
        ["systemctl", "status", unit] | ["service", unit, "status"]
            if is_mosquitto_unit(unit) =>
        {
            Some(Ok(Command::Status))
        }
        _ => None,
    }
}

fn follow_log(tokens: &[String]) -> Option<Result<Command, CommandError>> {
    let follows = if program_is(tokens, "tail") {
        let args = ParsedArgs::scan(&tokens[1..], TAIL_FLAGS);
        args.switch("-f")
            && args
                .positionals()
                .iter()
                .any(|path| path.contains("mosquitto"))
    } else if program_is(tokens, "journalctl") {
        let args = ParsedArgs::scan(&tokens[1..], JOURNAL_FLAGS);
        args.switch("-f") && args.value("-u").is_some_and(is_mosquitto_unit)
    } else {
        false
    };

    follows.then_some(Ok(Command::FollowLog))
}

fn install_node_red(tokens: &[String]) -> Option<Result<Command, CommandError>> {
    let installs = program_is(tokens, "npm")
        && tokens
            .get(1)
            .is_some_and(|verb| verb == "install" || verb == "i")
        && tokens[2..].iter().any(|t| t.starts_with("node-red"));

    installs.then_some(Ok(Command::InstallNodeRed))
}

fn start_node_red(tokens: &[String]) -> Option<Result<Command, CommandError>> {
    if !program_is(tokens, "node-red") {
        return None;
    }
    let args = ParsedArgs::scan(&tokens[1..], NODE_RED_FLAGS);

    Some(
        args.value("-p")
            .map(|raw| positive::<u16>("-p", raw))
            .transpose()
            .map(|port| Command::StartNodeRed { port }),
    )
}

fn is_mosquitto_unit(unit: &str) -> bool {
    unit == "mosquitto" || unit == "mosquitto.service"
}

fn required_topic(
    args: &ParsedArgs,
    flag: &'static str,
    what: &'static str,
) -> Result<String, CommandError> {
    let topic = args
        .value(flag)
        .ok_or(CommandError::MissingArgument { flag, what })?;
    validate_topic(topic).map_err(|reason| CommandError::InvalidTopic {
        topic: topic.to_string(),
        reason,
    })?;
    Ok(topic.to_string())
}

fn positive<T>(flag: &'static str, raw: &str) -> Result<T, CommandError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    match raw.parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(CommandError::InvalidValue {
            flag,
            value: raw.to_string(),
        }),
    }
}
