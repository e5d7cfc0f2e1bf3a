use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use stroke_core::*;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::Config;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Config file to read instead of ./stroke.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a stage with a fixed move sequence
    Play {
        /// Stage table (JSON)
        #[arg(short, long)]
        stages: Option<PathBuf>,

        /// Stage number
        #[arg(short = 'n', long, default_value_t = 1)]
        stage: u32,

        /// Require red, green, then blue
        #[arg(long)]
        strict: bool,

        /// Moves as letters, e.g. "ULLDD"
        moves: String,
    },

    /// Load every stage and report structural problems
    Check {
        #[arg(short, long)]
        stages: Option<PathBuf>,
    },

    /// Repair every stage the way the editor would and write the table back
    Tidy {
        #[arg(short, long)]
        stages: Option<PathBuf>,

        /// Where to write the result; defaults to overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fill in unpaired portal endpoints
        #[arg(long)]
        complete_portals: bool,
    },

    /// Add a blank stage with auto-placed start, goal, and points
    New {
        #[arg(short, long)]
        stages: Option<PathBuf>,

        /// Stage number to write
        #[arg(short = 'n', long)]
        stage: u32,

        #[arg(long)]
        name: String,

        #[arg(long, default_value_t = 5)]
        rows: Coord,

        #[arg(long, default_value_t = 5)]
        cols: Coord,

        /// Wall positions as "row,col"
        #[arg(long = "wall", value_parser = parse_position)]
        walls: Vec<GridPosition>,
    },

    /// Print a stage
    Show {
        #[arg(short, long)]
        stages: Option<PathBuf>,

        #[arg(short = 'n', long, default_value_t = 1)]
        stage: u32,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.verbose);

    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Play {
            stages,
            stage,
            strict,
            moves,
        } => {
            let mut rules = config.rules;
            rules.enforce_color_order |= strict;
            play(&load_table(&config.stages_path(stages)?)?, stage, rules, &moves)
        }
        Command::Check { stages } => check(&load_table(&config.stages_path(stages)?)?),
        Command::Tidy {
            stages,
            output,
            complete_portals,
        } => {
            let path = config.stages_path(stages)?;
            let mut table = load_table(&path)?;
            tidy(&mut table, complete_portals);
            save_table(&table, output.as_deref().unwrap_or(&path))
        }
        Command::New {
            stages,
            stage,
            name,
            rows,
            cols,
            walls,
        } => {
            let path = config.stages_path(stages)?;
            let mut table = if path.exists() {
                load_table(&path)?
            } else {
                StageTable::new()
            };
            let definition = new_stage(name, GridSize::new(rows, cols), &walls);
            print!("{}", render::render(&definition, None));
            table.save_stage(stage, &definition);
            save_table(&table, &path)
        }
        Command::Show { stages, stage } => {
            let table = load_table(&config.stages_path(stages)?)?;
            let definition = import_stage(&table, stage)?;
            println!("{} ({})", definition.name, definition.size);
            if !definition.description.is_empty() {
                println!("{}", definition.description);
            }
            print!("{}", render::render(&definition, None));
            Ok(())
        }
    }
}

fn init_logging(verbose: &clap_verbosity_flag::Verbosity) {
    let level = verbose.log_level_filter().to_string().to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_table(path: &Path) -> anyhow::Result<StageTable> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read stage table {}", path.display()))?;
    let table = StageTable::from_json(&json)
        .with_context(|| format!("Failed to parse stage table {}", path.display()))?;
    log::debug!("Loaded {} stages from {}", table.len(), path.display());
    Ok(table)
}

fn save_table(table: &StageTable, path: &Path) -> anyhow::Result<()> {
    let json = table.to_json()?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("Failed to write stage table {}", path.display()))?;
    log::info!("Wrote {} stages to {}", table.len(), path.display());
    Ok(())
}

fn parse_moves(moves: &str) -> anyhow::Result<Vec<Direction>> {
    moves
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| match c.to_ascii_uppercase() {
            'U' => Ok(Direction::Up),
            'D' => Ok(Direction::Down),
            'L' => Ok(Direction::Left),
            'R' => Ok(Direction::Right),
            other => bail!("Unknown move {other:?}, expected one of U, D, L, R"),
        })
        .collect()
}

fn parse_position(text: &str) -> anyhow::Result<GridPosition> {
    let (row, col) = text
        .split_once(',')
        .with_context(|| format!("Expected \"row,col\", got {text:?}"))?;
    Ok(GridPosition::new(row.trim().parse()?, col.trim().parse()?))
}

fn play(table: &StageTable, stage: u32, rules: RuleConfig, moves: &str) -> anyhow::Result<()> {
    let moves = parse_moves(moves)?;
    let mut engine = PlayEngine::from_stage(table, stage, rules)?;
    engine.reset()?;

    for direction in moves {
        let outcome = match engine.step(direction) {
            Ok(outcome) => outcome,
            Err(PuzzleError::NotPlaying) => {
                log::warn!("Ignoring {direction:?}, the run is over");
                break;
            }
            Err(err) => return Err(err.into()),
        };

        match outcome {
            StepOutcome::Rejected(reason) => println!("{direction:?}: rejected ({reason:?})"),
            StepOutcome::Teleported { from, to } => {
                println!("{direction:?}: teleported {from} -> {to}")
            }
            StepOutcome::Moved | StepOutcome::Won => {
                if let Some(pos) = engine.current_position() {
                    println!("{direction:?}: {pos}");
                }
            }
        }

        for event in engine.drain_events() {
            match event {
                PuzzleEvent::RequiredPointCollected { position, color } => {
                    println!("  collected {color} at {position}")
                }
                PuzzleEvent::Won { path } => println!("  won, path of {} cells", path.len()),
                PuzzleEvent::Reset => {}
            }
        }
    }

    let Some(definition) = engine.definition() else {
        bail!("No puzzle loaded");
    };
    print!("{}", render::render(definition, Some(engine.run_state())));
    println!("{}", render::summary(definition, engine.run_state()));
    Ok(())
}

fn check(table: &StageTable) -> anyhow::Result<()> {
    let mut failures = 0;
    for (key, record) in table.iter() {
        let Some(number) = key.strip_prefix("Stage_").and_then(|n| n.parse().ok()) else {
            log::warn!("Skipping {key}, not a stage key");
            continue;
        };

        match check_stage(table, number, record) {
            Ok(()) => println!("{key}: ok"),
            Err(err) => {
                println!("{key}: {err}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} stages have problems", table.len());
    }
    Ok(())
}

/// Checks the record as stored, then as the engine would load it.
fn check_stage(table: &StageTable, number: u32, record: &StageRecord) -> stroke_core::Result<()> {
    record.to_definition().check()?;
    import_stage(table, number)?.check()
}

fn tidy(table: &mut StageTable, complete_portals: bool) {
    for (key, record) in table.iter_mut() {
        let mut editor = PuzzleEditor::new(record.to_definition());
        if complete_portals {
            editor.auto_complete_teleport_pairs();
        }

        let tidied = StageRecord::from_definition(editor.draft());
        if tidied != *record {
            log::info!("Tidied {key}");
            *record = tidied;
        }
    }
}

fn new_stage(name: String, size: GridSize, walls: &[GridPosition]) -> PuzzleDefinition {
    let mut editor = PuzzleEditor::blank(name, size);
    editor.auto_place_rgb_points();
    editor.set_tool(EditTool::Wall);
    for &wall in walls {
        editor.click(wall);
    }
    editor.into_definition()
}
