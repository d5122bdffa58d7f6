//! LinguaQuest CLI
//!
//! Usage:
//!   linguaquest                                   # Interactive game (default)
//!   linguaquest --category travel --difficulty hard
//!   linguaquest --offline                         # Demo content only
//!   linguaquest --serve                           # HTTP API server
//!   linguaquest --json                            # JSON snapshots

use clap::Parser;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use linguaquest::config::GameConfig;
use linguaquest::core::{
    run_server, CommandReply, GameCommand, GameDriver, GameHandle, HttpRemote, OfflineRemote,
    RemoteOps, VoiceController,
};
use linguaquest::types::{GameError, ReasonCode, RoundSnapshot, RoundState, SessionContext, Tone};
use linguaquest::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "linguaquest",
    version = VERSION,
    about = "LinguaQuest - persuade the AI, one timed round at a time",
    long_about = "LinguaQuest plays five timed rounds. Each round shows a scenario;\n\
                  write an argument, translate it into the target language, and get\n\
                  it evaluated. Persuade the AI before the clock runs out.\n\n\
                  Commands (interactive):\n  \
                  <text>               Submit argument\n  \
                  /translate           Translate argument\n  \
                  /evaluate            Evaluate argument\n  \
                  /dialogue            Ask the AI character\n  \
                  /next                Skip to the next round\n  \
                  /voice <transcript>  Run a voice command\n  \
                  /listen              Listen on the microphone\n  \
                  /cancel              Stop listening\n  \
                  /tone <tone>         polite | passionate | formal | casual\n  \
                  /lang <code>         twi | gaa | ewe\n  \
                  /new <cat> <diff>    Start over\n  \
                  /status              Show the current snapshot\n  \
                  quit                 Leave"
)]
struct Args {
    /// Interactive mode - read commands from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// Never call the backend; play on demo content
    #[arg(long)]
    offline: bool,

    /// Output snapshots as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Rounds per game
    #[arg(long)]
    rounds: Option<u32>,

    /// Seconds per round
    #[arg(long)]
    round_secs: Option<u32>,

    /// Scenario category (food, travel, education, business, ...)
    #[arg(long, default_value = "food")]
    category: String,

    /// Scenario difficulty
    #[arg(long, default_value = "easy")]
    difficulty: String,

    /// Target language (twi, gaa, ewe)
    #[arg(long, default_value = "twi")]
    language: String,

    /// Argument tone (polite, passionate, formal, casual)
    #[arg(long, default_value = "polite", value_parser = parse_tone)]
    tone: Tone,

    /// Backend nickname; scores and badges are saved when set
    #[arg(long)]
    nickname: Option<String>,

    /// Voice language tag
    #[arg(long, default_value = "en-US")]
    voice_lang: String,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    if args.no_color {
        colored::control::set_override(false);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(2);
        }
    };

    let remote: Arc<dyn RemoteOps> = if args.offline {
        Arc::new(OfflineRemote)
    } else {
        match HttpRemote::from_config(&config) {
            Ok(remote) => Arc::new(remote),
            Err(e) => {
                eprintln!("Config error: {}", e);
                std::process::exit(2);
            }
        }
    };

    // Interactive is the default and wins over --serve
    if args.serve && !args.interactive {
        run_serve(&args, config, remote).await;
    } else {
        run_interactive(&args, config, remote).await;
    }
}

/// Defaults → config file → CLI flags, then validate
fn load_config(args: &Args) -> Result<GameConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => GameConfig::from_file(path)?,
        None => GameConfig::default(),
    };
    if let Some(url) = &args.backend_url {
        config.backend_url = url.clone();
    }
    if let Some(rounds) = args.rounds {
        config.total_rounds = rounds;
    }
    if let Some(secs) = args.round_secs {
        config.round_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

/// Play in the terminal
async fn run_interactive(args: &Args, config: GameConfig, remote: Arc<dyn RemoteOps>) {
    let context = match &args.nickname {
        Some(nickname) => SessionContext::for_player(nickname.as_str()),
        None => SessionContext::default(),
    }
    .with_voice_language(args.voice_lang.as_str())
    .with_tone(args.tone);

    let voice = VoiceController::unsupported(args.voice_lang.as_str(), config.voice_timeout());
    let handle = GameDriver::spawn(config, context, remote, Arc::new(voice));

    print_header(args.offline);
    spawn_printer(&handle, args.json);

    match handle
        .new_game(&args.category, &args.difficulty, Some(args.language.as_str()))
        .await
    {
        Ok(snapshot) => print_snapshot(&snapshot, args.json),
        Err(e) => {
            eprintln!("Could not start game: {}", e);
            return;
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", ">".bold());
        let _ = std::io::stdout().flush();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message.yellow());
                continue;
            }
        };

        // Listening holds its reply until a command is heard; keep reading so /cancel gets through
        if command == GameCommand::Listen {
            let handle = handle.clone();
            let json = args.json;
            tokio::spawn(async move {
                match handle.dispatch(GameCommand::Listen).await {
                    Ok(reply) => print_reply(&reply, json),
                    Err(e) => print_error(&e),
                }
            });
            continue;
        }

        match handle.dispatch(command).await {
            Ok(reply) => print_reply(&reply, args.json),
            Err(e) => print_error(&e),
        }
    }

    if let Ok(snapshot) = handle.snapshot().await {
        println!(
            "\nSession ended at round {}/{} with {} XP (level {}).",
            snapshot.round, snapshot.total_rounds, snapshot.target_xp, snapshot.level
        );
    }
}

/// Turn one input line into a command
fn parse_command(line: &str) -> Result<GameCommand, String> {
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(GameCommand::SubmitArgument(line.to_string()));
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name.to_lowercase().as_str() {
        "translate" => Ok(GameCommand::Translate),
        "evaluate" => Ok(GameCommand::Evaluate),
        "dialogue" => Ok(GameCommand::Dialogue),
        "next" => Ok(GameCommand::Next),
        "status" => Ok(GameCommand::Snapshot),
        "listen" => Ok(GameCommand::Listen),
        "voice" if !arg.is_empty() => Ok(GameCommand::VoiceTranscript(arg.to_string())),
        "voice" => Err("Usage: /voice <transcript>".to_string()),
        "cancel" => Ok(GameCommand::CancelListen),
        "tone" => parse_tone(arg).map(GameCommand::SetTone),
        "lang" if !arg.is_empty() => Ok(GameCommand::ChangeLanguage(arg.to_string())),
        "lang" => Err("Usage: /lang <twi|gaa|ewe>".to_string()),
        "new" => {
            let mut parts = arg.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(category), Some(difficulty)) => Ok(GameCommand::NewGame {
                    category: category.to_string(),
                    difficulty: difficulty.to_string(),
                    language: parts.next().map(str::to_string),
                }),
                _ => Err("Usage: /new <category> <difficulty> [language]".to_string()),
            }
        }
        other => Err(format!("Unknown command /{} (try --help)", other)),
    }
}

/// Shared by `--tone` and `/tone`
fn parse_tone(raw: &str) -> Result<Tone, String> {
    Tone::parse(raw).ok_or_else(|| "Tones: polite, passionate, formal, casual".to_string())
}

/// Print transitions and notices pushed by the driver
fn spawn_printer(handle: &GameHandle, json: bool) {
    let mut rx = handle.subscribe();
    tokio::spawn(async move {
        while let Ok(snapshot) = rx.recv().await {
            let late_countdown = snapshot.reason == ReasonCode::R001_CLOCK_TICK
                && snapshot.time_left_secs > 0
                && snapshot.time_left_secs % 10 == 0;
            let content = matches!(
                snapshot.reason,
                ReasonCode::R004_SCENARIO_LOADED
                    | ReasonCode::R004_TRANSLATION_LOADED
                    | ReasonCode::R004_EVALUATION_SCORED
                    | ReasonCode::R004_DIALOGUE_LOADED
            );
            if snapshot.reason.is_transition() || content || late_countdown {
                println!();
                print_snapshot(&snapshot, json);
            }
        }
    });
}

fn print_reply(reply: &CommandReply, json: bool) {
    if json {
        println!("{}", serde_json::to_string(reply).unwrap_or_default());
        return;
    }
    if let Some(outcome) = &reply.voice {
        match outcome.action() {
            Some(action) => println!("{} {}", "🎤".cyan(), action.as_str().cyan()),
            None => println!("{} {}", "🎤".cyan(), "not recognized".yellow()),
        }
    }
    print_snapshot(&reply.snapshot, false);
}

fn print_snapshot(snapshot: &RoundSnapshot, json: bool) {
    if json {
        println!("{}", serde_json::to_string(snapshot).unwrap_or_default());
        return;
    }
    if colored::control::SHOULD_COLORIZE.should_colorize() {
        println!("{}", snapshot.to_terminal_string());
    } else {
        println!("{}", snapshot.to_parseable_string());
    }

    match snapshot.reason {
        ReasonCode::R003_NEW_GAME | ReasonCode::R003_TRANSITION_NEXT_ROUND => {
            println!("  {} {}/{} ({})", "Round".bold(), snapshot.round, snapshot.total_rounds, snapshot.language);
        }
        ReasonCode::R004_SCENARIO_LOADED => {
            println!("  {} {}", "Scenario:".bold(), snapshot.scenario);
        }
        ReasonCode::R004_TRANSLATION_LOADED => {
            println!("  {} {}", "Translation:".bold(), snapshot.translation);
        }
        ReasonCode::R004_EVALUATION_SCORED | ReasonCode::R003_TRANSITION_TO_SUCCESS => {
            if let Some(score) = snapshot.score {
                println!("  {} {:.1}/10", "Score:".bold(), score);
            }
            println!("  {} {}", "Feedback:".bold(), snapshot.feedback);
        }
        ReasonCode::R004_DIALOGUE_LOADED => {
            println!("  {} {} ({})", "AI:".bold(), snapshot.ai_response, snapshot.ai_stance.as_str());
        }
        ReasonCode::R003_TRANSITION_TO_GAMEOVER => {
            if snapshot.badges.is_empty() {
                println!("  {}", "No badges this time.".dimmed());
            }
            for badge in &snapshot.badges {
                println!("  🏅 {} - {}", badge.name().green(), badge.description());
            }
            println!("  Type /new <category> <difficulty> or say \"start\" to play again.");
        }
        _ => {}
    }

    if let Some(notice) = &snapshot.notice {
        let line = match snapshot.state {
            RoundState::Success => notice.green(),
            RoundState::Fail => notice.red(),
            _ => notice.yellow(),
        };
        println!("  {}", line);
    }
}

fn print_error(error: &GameError) {
    match error {
        GameError::Voice(voice) => {
            let message = voice.message();
            if !message.is_empty() {
                println!("{}", message.yellow());
            }
        }
        e if e.is_rejection() => println!("{} {}", "⚠".yellow(), e.to_string().yellow()),
        e => println!("{} {}", "✗".red(), e.to_string().red()),
    }
}

/// Print header
fn print_header(offline: bool) {
    println!("{}", "========================================".bold());
    println!("{}", format!("  LinguaQuest v{}", VERSION).bold());
    if offline {
        println!("  {}", "offline: demo content only".dimmed());
    }
    println!("{}", "========================================".bold());
    println!("Write your argument and press Enter. /evaluate to score it, quit to leave.");
    println!();
}

/// Run HTTP API server
async fn run_serve(args: &Args, config: GameConfig, remote: Arc<dyn RemoteOps>) {
    println!();
    println!("{}", format!("LinguaQuest API Server v{}", VERSION).bold());
    println!("  backend: {}", if args.offline { "offline" } else { config.backend_url.as_str() });
    println!();

    if let Err(e) = run_server(&args.addr, config, remote).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
