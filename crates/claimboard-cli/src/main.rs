//! Claimboard CLI - territory planner tooling.
//!
//! Single binary that provides:
//! - `claimboard adjacency` - build the tile adjacency index
//! - `claimboard validate-claim` / `validate-clear` - check one action
//! - `claimboard claimable` - list legal claims for an alliance
//! - `claimboard plan` - inspect or build share strings
//! - `claimboard replay` - play a shared plan headlessly
//! - `claimboard day` - season calendar

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use claimboard_core::playback::MonotonicClock;
use claimboard_core::season::format_countdown;
use claimboard_core::{
    AdjacencyGraph, ClaimContext, ClaimRules, ClaimboardConfig, Clock, DailyMoves, DaySelection,
    Frame, PlaybackController, PlaybackSpeed, Planner, ValidationReport, VirtualClock,
};
use claimboard_protocol::{wire, AllianceId, BoardState, MapGeometry, MoveAction, PlanStep, TileId};

#[derive(Parser)]
#[command(name = "claimboard")]
#[command(about = "Territory claim rules, planning and playback", version)]
struct Cli {
    /// Project root directory
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write .claimboard/config.yaml with defaults
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Build and print the tile adjacency index
    Adjacency {
        /// Map geometry document
        #[arg(long)]
        geometry: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check whether an alliance may claim a tile
    ValidateClaim {
        #[arg(long)]
        geometry: PathBuf,

        /// Board state document
        #[arg(long)]
        state: PathBuf,

        #[arg(long)]
        alliance: String,

        #[arg(long)]
        tile: u32,

        #[command(flatten)]
        moves: MovesArgs,

        #[arg(long)]
        admin: bool,
    },

    /// Check whether an alliance may clear a tile
    ValidateClear {
        #[arg(long)]
        state: PathBuf,

        #[arg(long)]
        alliance: String,

        #[arg(long)]
        tile: u32,

        #[arg(long)]
        admin: bool,
    },

    /// List every tile an alliance may claim right now
    Claimable {
        #[arg(long)]
        geometry: PathBuf,

        #[arg(long)]
        state: PathBuf,

        #[arg(long)]
        alliance: String,

        #[command(flatten)]
        moves: MovesArgs,
    },

    /// Plan share strings
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },

    /// Play a shared plan over a board state
    Replay {
        #[arg(long)]
        state: PathBuf,

        /// Share parameter or full share URL
        #[arg(long)]
        plan: String,

        /// Playback speed (0.25x, 0.5x, 1x, 2x, 4x)
        #[arg(long)]
        speed: Option<PlaybackSpeed>,

        /// Wait out each step in real time
        #[arg(long)]
        realtime: bool,
    },

    /// Show the season day and time to rollover
    Day {
        /// Instant to evaluate (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        /// Past day to view
        #[arg(long)]
        view: Option<i64>,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Decode a plan and print it with day annotations
    Show {
        /// Share parameter or full share URL
        param: String,

        /// Board state used for alliance names and the resulting claims
        #[arg(long)]
        state: Option<PathBuf>,

        /// Day the plan starts on, defaults to today
        #[arg(long)]
        day: Option<i64>,
    },

    /// Encode a JSON list of steps into a share parameter
    Encode {
        file: PathBuf,

        /// Print a full share URL on this base instead
        #[arg(long)]
        base: Option<String>,
    },
}

#[derive(clap::Args)]
struct MovesArgs {
    /// Moves already spent today
    #[arg(long, default_value_t = 0)]
    moves_used: u32,

    /// Override the remaining move budget
    #[arg(long)]
    moves_remaining: Option<u32>,
}

impl MovesArgs {
    fn remaining(&self, config: &ClaimboardConfig) -> u32 {
        self.moves_remaining.unwrap_or_else(|| {
            DailyMoves {
                max: config.rules.moves_per_day,
                used: self.moves_used,
            }
            .remaining()
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let project_root = match cli.project {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let Some(command) = cli.command else {
        println!("Claimboard - territory claim planner");
        println!();
        println!("Usage: claimboard <COMMAND>");
        println!();
        println!("Commands:");
        println!("  init            Write default configuration");
        println!("  adjacency       Build the adjacency index");
        println!("  validate-claim  Check a claim");
        println!("  validate-clear  Check a clear");
        println!("  claimable       List legal claims");
        println!("  plan            Show or encode a shared plan");
        println!("  replay          Play a shared plan");
        println!("  day             Season calendar");
        println!();
        println!("Run 'claimboard --help' for more information.");
        return Ok(());
    };

    // A broken config must not block `init --force` from replacing it.
    if let Commands::Init { force } = command {
        return init_project(&project_root, force);
    }

    let config = ClaimboardConfig::load_from_project(&project_root)?;

    match command {
        Commands::Init { force } => init_project(&project_root, force),
        Commands::Adjacency { geometry, json } => show_adjacency(&geometry, json, &config),
        Commands::ValidateClaim {
            geometry,
            state,
            alliance,
            tile,
            moves,
            admin,
        } => validate_claim(
            &geometry,
            &state,
            AllianceId::new(alliance),
            TileId(tile),
            moves.remaining(&config),
            admin,
            &config,
        ),
        Commands::ValidateClear {
            state,
            alliance,
            tile,
            admin,
        } => validate_clear(&state, AllianceId::new(alliance), TileId(tile), admin, &config),
        Commands::Claimable {
            geometry,
            state,
            alliance,
            moves,
        } => list_claimable(
            &geometry,
            &state,
            AllianceId::new(alliance),
            moves.remaining(&config),
            &config,
        ),
        Commands::Plan { command } => match command {
            PlanCommands::Show { param, state, day } => {
                show_plan(&param, state.as_deref(), day, &config)
            }
            PlanCommands::Encode { file, base } => encode_plan(&file, base.as_deref()),
        },
        Commands::Replay {
            state,
            plan,
            speed,
            realtime,
        } => {
            let speed = speed.unwrap_or(config.playback.default_speed);
            run_replay(&state, &plan, speed, realtime).await
        }
        Commands::Day { at, view } => show_day(at, view, &config),
    }
}

fn init_project(project_root: &Path, force: bool) -> Result<()> {
    let path = ClaimboardConfig::write_default(project_root, force)?;

    println!("Initialized Claimboard project at {}", project_root.display());
    println!();
    println!("Created:");
    println!("  {} - engine configuration", path.display());

    Ok(())
}

fn read_geometry(path: &Path) -> Result<MapGeometry> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read geometry from {}", path.display()))?;
    wire::deserialize_geometry_json(&content)
        .with_context(|| format!("Failed to parse geometry from {}", path.display()))
}

fn read_board(path: &Path) -> Result<BoardState> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read board state from {}", path.display()))?;
    wire::deserialize_board_json(&content)
        .with_context(|| format!("Failed to parse board state from {}", path.display()))
}

fn build_adjacency(geometry: &MapGeometry, config: &ClaimboardConfig) -> AdjacencyGraph {
    AdjacencyGraph::build_with(&geometry.tiles, &config.adjacency)
}

/// Accept either a bare share parameter or a URL carrying one.
fn share_param_from(input: &str) -> Option<String> {
    let query_key = format!("{}=", wire::PLAN_PARAM);
    let is_query = input.contains('?')
        || input.starts_with(&query_key)
        || input.contains(&format!("&{query_key}"));
    if is_query {
        wire::plan_param(input)
    } else {
        Some(input.trim().to_string()).filter(|p| !p.is_empty())
    }
}

fn show_adjacency(path: &Path, json: bool, config: &ClaimboardConfig) -> Result<()> {
    let geometry = read_geometry(path)?;
    let graph = build_adjacency(&geometry, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
        return Ok(());
    }

    println!(
        "Adjacency: {} tiles, {} shared edges",
        graph.tile_count(),
        graph.edge_count()
    );
    for (tile, neighbors) in graph.iter() {
        let list: Vec<String> = neighbors.iter().map(ToString::to_string).collect();
        let list = if list.is_empty() {
            "-".to_string()
        } else {
            list.join(", ")
        };
        println!("  {tile:>4}: {list}");
    }
    Ok(())
}

fn print_report(report: &ValidationReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn validate_claim(
    geometry: &Path,
    state: &Path,
    alliance: AllianceId,
    tile: TileId,
    moves_remaining: u32,
    is_admin: bool,
    config: &ClaimboardConfig,
) -> Result<()> {
    let geometry = read_geometry(geometry)?;
    let board = read_board(state)?;
    let adjacency = build_adjacency(&geometry, config);
    let rules = ClaimRules::new(config.rules.clone());

    let owned = board.claims.owned_by(&alliance);
    let ctx = ClaimContext {
        owned: &owned,
        labels: &board.labels,
        claims: &board.claims,
        adjacency: &adjacency,
        moves_remaining,
        is_admin,
    };
    let report = ValidationReport::from(rules.validate_claim(&ctx, tile));
    tracing::info!(%tile, %alliance, valid = report.valid, "Validated claim");
    print_report(&report)
}

fn validate_clear(
    state: &Path,
    alliance: AllianceId,
    tile: TileId,
    is_admin: bool,
    config: &ClaimboardConfig,
) -> Result<()> {
    let board = read_board(state)?;
    let rules = ClaimRules::new(config.rules.clone());
    let report = ValidationReport::from(rules.validate_clear(
        &board.claims,
        tile,
        Some(&alliance),
        is_admin,
    ));
    tracing::info!(%tile, %alliance, valid = report.valid, "Validated clear");
    print_report(&report)
}

fn list_claimable(
    geometry: &Path,
    state: &Path,
    alliance: AllianceId,
    moves_remaining: u32,
    config: &ClaimboardConfig,
) -> Result<()> {
    let geometry = read_geometry(geometry)?;
    let board = read_board(state)?;
    let adjacency = build_adjacency(&geometry, config);
    let rules = ClaimRules::new(config.rules.clone());

    let owned = board.claims.owned_by(&alliance);
    let ctx = ClaimContext {
        owned: &owned,
        labels: &board.labels,
        claims: &board.claims,
        adjacency: &adjacency,
        moves_remaining,
        is_admin: false,
    };
    let claimable = rules.claimable_tiles(&ctx, geometry.tile_ids());

    println!(
        "{} owns {} tiles, {} moves left, {} claimable:",
        alliance,
        owned.len(),
        moves_remaining,
        claimable.len()
    );
    for tile in &claimable {
        match board.labels.get(*tile) {
            Some(label) if !label.name.is_empty() || !label.number.is_empty() => {
                println!("  #{tile:<4} {} {}", label.number.trim(), label.name)
            }
            _ => println!("  #{tile}"),
        }
    }
    Ok(())
}

fn alliance_name<'a>(board: &'a BoardState, id: &'a AllianceId) -> &'a str {
    board
        .alliances
        .get(id)
        .map_or(id.as_str(), |alliance| alliance.name.as_str())
}

fn action_label(action: MoveAction) -> &'static str {
    match action {
        MoveAction::Claim => "claim",
        MoveAction::Clear => "clear",
    }
}

fn show_plan(
    input: &str,
    state: Option<&Path>,
    day: Option<i64>,
    config: &ClaimboardConfig,
) -> Result<()> {
    let board = state.map(read_board).transpose()?.unwrap_or_default();
    let planner = Planner::from_share_param(None, share_param_from(input).as_deref());
    if planner.is_empty() {
        println!("Plan is empty");
        return Ok(());
    }

    let start_day = day.unwrap_or_else(|| config.season.day_at(Utc::now()));
    let quota = config.rules.daily_claim_quota;
    let breakdown = planner.day_breakdown(start_day, quota);

    println!("Plan: {} steps from day {}", planner.len(), start_day);
    for (item, annotated) in planner.items().iter().zip(&breakdown.items) {
        match &item.step {
            PlanStep::NewDay => {
                println!("{:>4}. --- day {} ---", annotated.step_number, annotated.day)
            }
            PlanStep::Move {
                action,
                tile,
                alliance,
            } => {
                let flag = if annotated.is_over_limit {
                    "  [over daily limit]"
                } else {
                    ""
                };
                println!(
                    "{:>4}. {} #{:<4} {}{}",
                    annotated.step_number,
                    action_label(*action),
                    tile,
                    alliance_name(&board, alliance),
                    flag
                );
            }
        }
    }

    println!();
    for segment in &breakdown.days {
        let totals: Vec<String> = segment
            .claims
            .iter()
            .map(|(id, count)| format!("{} {count}/{quota}", alliance_name(&board, id)))
            .collect();
        if totals.is_empty() {
            println!("Day {}: no claims", segment.day);
        } else {
            println!("Day {}: {}", segment.day, totals.join(", "));
        }
    }

    if state.is_some() {
        let planned = planner.planned_claims(&board.claims, &board.alliances);
        println!();
        println!(
            "Claims: {} now, {} after plan",
            board.claims.len(),
            planned.len()
        );
    }
    Ok(())
}

fn encode_plan(file: &Path, base: Option<&str>) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read steps from {}", file.display()))?;
    let steps = wire::deserialize_steps_json(&content)
        .with_context(|| format!("Failed to parse steps from {}", file.display()))?;

    let output = match base {
        Some(base) => wire::share_url(base, &steps)?,
        None => wire::encode_plan(&steps)?,
    };
    println!("{output}");
    Ok(())
}

fn print_frame(frame: &Frame, len: usize) {
    let position = frame.cursor.map_or(0, |c| c + 1);
    match frame.highlight {
        Some(tile) => println!(
            "[{position:>3}/{len}] #{:<5} {} claims",
            tile.to_string(),
            frame.claims.len()
        ),
        None => println!(
            "[{position:>3}/{len}] new day {} claims",
            frame.claims.len()
        ),
    }
}

async fn run_replay(state: &Path, input: &str, speed: PlaybackSpeed, realtime: bool) -> Result<()> {
    let board = read_board(state)?;
    let planner = Planner::from_share_param(None, share_param_from(input).as_deref());
    if planner.is_empty() {
        println!("Nothing to replay");
        return Ok(());
    }

    let len = planner.len();
    let mut controller = PlaybackController::new(speed);
    tracing::info!(steps = len, %speed, realtime, "Starting replay");

    let show = |controller: &PlaybackController| {
        print_frame(
            &controller.frame(&planner, &board.claims, &board.alliances),
            len,
        )
    };

    if realtime {
        let clock = MonotonicClock::start();
        controller.play(len, clock.now());
        show(&controller);
        while let Some(due) = controller.next_due() {
            tokio::time::sleep(due.saturating_sub(clock.now())).await;
            if controller.poll(clock.now(), len) > 0 && controller.is_playing() {
                show(&controller);
            }
        }
    } else {
        let mut clock = VirtualClock::new();
        controller.play(len, clock.now());
        show(&controller);
        while let Some(due) = controller.next_due() {
            clock.advance(due.saturating_sub(clock.now()));
            if controller.poll(clock.now(), len) > 0 && controller.is_playing() {
                show(&controller);
            }
        }
    }

    let last = controller.frame(&planner, &board.claims, &board.alliances);
    println!();
    println!("Replay finished: {} claims on the board", last.claims.len());
    for alliance in board.alliances.iter() {
        let held = last.claims.owned_by(&alliance.id).len();
        if held > 0 {
            println!("  {:<20} {held}", alliance.name);
        }
    }
    Ok(())
}

fn show_day(at: Option<DateTime<Utc>>, view: Option<i64>, config: &ClaimboardConfig) -> Result<()> {
    let at = at.unwrap_or_else(Utc::now);
    let calendar = &config.season;
    let today = calendar.day_at(at);

    let mut selection = DaySelection::new(today);
    if let Some(day) = view {
        if !selection.go_to(day) {
            anyhow::bail!("day {day} is outside the season so far (1..={today})");
        }
    }

    println!("Season day {today}");
    println!(
        "Next day in {}",
        format_countdown(calendar.time_until_next_day(at))
    );
    println!(
        "Viewing day {} ({})",
        selection.selected(),
        if selection.can_edit() {
            "editable"
        } else {
            "read-only"
        }
    );
    Ok(())
}
