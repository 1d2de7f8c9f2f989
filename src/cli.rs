use std::io::Write;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::core::{decode_level, encode_level, BoardSnapshot, LevelGrid, Outline};
use crate::engine::{EngineConfig, Level, LevelConfig, LevelEvent};
use crate::types::{Direction, GameAction, PieceType, TICKS_PER_SECOND};

/// Upper bound on ticks spent waiting for one move to settle
const SETTLE_TICK_LIMIT: u32 = 60 * TICKS_PER_SECOND;

pub const USAGE: &str = "\
usage: duck-castle [--variant classic|loose] [--outline occupied|nonvoid] <command>

commands:
  show [CODE]                 print the board and its clusters
  play [CODE] MOVES [--json]  apply moves (u d l r, or vi keys k j h) and print the result
  outline [CODE]              print the traced outline as JSON
  encode ROW...               glyph rows (# . @ o * B x) to a level code
  decode CODE                 level code to glyph rows
  help                        print this message
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Show { code: Option<String> },
    Play {
        code: Option<String>,
        moves: String,
        json: bool,
    },
    Outline { code: Option<String> },
    Encode { rows: Vec<String> },
    Decode { code: String },
    Help,
}

/// Parsed command line: global overrides plus one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub variant: Option<String>,
    pub outline: Option<String>,
    pub command: Command,
}

pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut variant = None;
    let mut outline = None;
    let mut json = false;
    let mut positional: Vec<&str> = Vec::new();

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--variant" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --variant"))?;
                variant = Some(v.clone());
            }
            "--outline" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing value for --outline"))?;
                outline = Some(v.clone());
            }
            "--json" => json = true,
            "-h" | "--help" => positional.insert(0, "help"),
            other if other.starts_with("--") => {
                return Err(anyhow!("unknown argument: {}", other));
            }
            other => positional.push(other),
        }
        i += 1;
    }

    let Some((&name, rest)) = positional.split_first() else {
        return Ok(Invocation {
            variant,
            outline,
            command: Command::Help,
        });
    };
    let owned = |s: &&str| s.to_string();

    let command = match name {
        "show" => Command::Show {
            code: optional_code(name, rest)?,
        },
        "outline" => Command::Outline {
            code: optional_code(name, rest)?,
        },
        "play" => match rest {
            [moves] => Command::Play {
                code: None,
                moves: moves.to_string(),
                json,
            },
            [code, moves] => Command::Play {
                code: Some(code.to_string()),
                moves: moves.to_string(),
                json,
            },
            _ => return Err(anyhow!("play: expected [CODE] MOVES")),
        },
        "encode" => {
            if rest.is_empty() {
                return Err(anyhow!("encode: expected at least one row"));
            }
            Command::Encode {
                rows: rest.iter().map(owned).collect(),
            }
        }
        "decode" => match rest {
            [code] => Command::Decode {
                code: code.to_string(),
            },
            _ => return Err(anyhow!("decode: expected exactly one CODE")),
        },
        "help" => Command::Help,
        other => return Err(anyhow!("unknown command: {}", other)),
    };

    if json && !matches!(command, Command::Play { .. }) {
        return Err(anyhow!("--json only applies to play"));
    }

    Ok(Invocation {
        variant,
        outline,
        command,
    })
}

fn optional_code(name: &str, rest: &[&str]) -> Result<Option<String>> {
    match rest {
        [] => Ok(None),
        [code] => Ok(Some(code.to_string())),
        _ => Err(anyhow!("{}: expected at most one CODE", name)),
    }
}

/// Parse a move string such as `"rrdl"`; spaces and commas are ignored
pub fn parse_moves(moves: &str) -> Result<Vec<Direction>> {
    moves
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| Direction::from_char(c).ok_or_else(|| anyhow!("invalid move: {:?}", c)))
        .collect()
}

/// Glyph rows to a grid; every row must have the same width
pub fn parse_rows(rows: &[String]) -> Result<LevelGrid> {
    let width = rows.first().map_or(0, |r| r.chars().count());
    let too_big = |n: usize| n == 0 || n > u8::MAX as usize;
    if too_big(width) || too_big(rows.len()) {
        return Err(anyhow!(
            "board must be 1..=255 cells on each side, got {}x{}",
            width,
            rows.len()
        ));
    }

    let mut cells = Vec::with_capacity(width * rows.len());
    for (y, row) in rows.iter().enumerate() {
        if row.chars().count() != width {
            return Err(anyhow!("row {} has {} cells, expected {}", y, row.chars().count(), width));
        }
        for (x, c) in row.chars().enumerate() {
            let kind = PieceType::from_glyph(c)
                .ok_or_else(|| anyhow!("unknown glyph {:?} at ({}, {})", c, x, y))?;
            cells.push(kind.index());
        }
    }
    Ok(LevelGrid::from_cells(width as u8, rows.len() as u8, cells)?)
}

#[derive(Debug, Serialize)]
pub struct PlayReport {
    pub accepted: u32,
    pub blocked: u32,
    pub won: bool,
    pub phase: String,
    pub ducks_on_goal: usize,
    pub events: Vec<LevelEvent>,
    pub snapshot: BoardSnapshot,
}

fn level_config(invocation: &Invocation, engine: &EngineConfig) -> Result<LevelConfig> {
    let mut config = engine.level;
    if let Some(name) = &invocation.variant {
        config = config.with_variant(name)?;
    }
    if let Some(name) = &invocation.outline {
        config = config.with_cell_rule(name)?;
    }
    Ok(config)
}

fn load_level(code: Option<&str>, engine: &EngineConfig, config: &LevelConfig) -> Result<Level> {
    let level = match code {
        Some(code) => Level::load(code, config).with_context(|| format!("cannot load level {}", code))?,
        None => Level::load_or_default(&engine.default_level, crate::engine::DEFAULT_LEVEL, config)?,
    };
    Ok(level)
}

/// Play `moves` on `level`, waiting for each one to settle
pub fn play_moves(level: &mut Level, moves: &[Direction]) -> PlayReport {
    let mut accepted = 0;
    let mut blocked = 0;
    let mut events = Vec::new();

    for &direction in moves {
        if level.is_won() {
            break;
        }
        if level.apply_action(GameAction::Move(direction)) {
            accepted += 1;
            events.extend(level.run_until_interactive(SETTLE_TICK_LIMIT));
        } else {
            blocked += 1;
        }
    }

    info!(accepted, blocked, won = level.is_won(), "moves played");
    PlayReport {
        accepted,
        blocked,
        won: level.is_won(),
        phase: level.phase().as_str().to_string(),
        ducks_on_goal: level.ducks_on_goal().len(),
        events,
        snapshot: level.snapshot(),
    }
}

pub fn run(invocation: &Invocation, engine: &EngineConfig, out: &mut impl Write) -> Result<()> {
    let config = level_config(invocation, engine)?;
    debug!(
        command = ?invocation.command,
        variant = ?config.rules,
        outline = config.cell_rule.as_str(),
        "running"
    );

    match &invocation.command {
        Command::Help => write!(out, "{}", USAGE)?,
        Command::Show { code } => {
            let level = load_level(code.as_deref(), engine, &config)?;
            let snapshot = level.snapshot();
            writeln!(out, "{}x{} board", snapshot.width, snapshot.height)?;
            writeln!(out, "{}", snapshot.to_text())?;
            for cluster in &snapshot.clusters {
                writeln!(
                    out,
                    "cluster {}: {} x{}",
                    cluster.id,
                    cluster.kind.as_str(),
                    cluster.pieces.len()
                )?;
            }
        }
        Command::Play { code, moves, json } => {
            let moves = parse_moves(moves)?;
            let mut level = load_level(code.as_deref(), engine, &config)?;
            let report = play_moves(&mut level, &moves);

            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
            } else {
                writeln!(out, "{}", report.snapshot.to_text())?;
                writeln!(out, "moves: {} accepted, {} blocked", report.accepted, report.blocked)?;
                writeln!(
                    out,
                    "status: {}",
                    if report.won { "won" } else { "playing" }
                )?;
            }
        }
        Command::Outline { code } => {
            let level = load_level(code.as_deref(), engine, &config)?;
            let outline: &Outline = level
                .outline()
                .ok_or_else(|| anyhow!("outline could not be traced for this level"))?;
            writeln!(out, "{}", serde_json::to_string_pretty(outline)?)?;
        }
        Command::Encode { rows } => {
            let grid = parse_rows(rows)?;
            writeln!(out, "{}", encode_level(&grid)?)?;
        }
        Command::Decode { code } => {
            let grid = decode_level(code).with_context(|| format!("cannot decode {}", code))?;
            for row in grid.to_rows() {
                writeln!(out, "{}", row)?;
            }
        }
    }
    Ok(())
}
