use clap::{Parser, Subcommand};
use delve_cli::CliContext;
use delve_cli::commands;
use delve_cli::readline;
use std::io::Write;

fn main() -> Result<(), String> {
    let mut ctx = CliContext::new();

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &mut ctx) {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "encounter simulator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load an instance config from a TOML file
    Load {
        #[arg(short, long)]
        path: String,
    },
    /// Add players to the party
    Party {
        #[arg(short, long, default_value_t = 4)]
        count: u32,
    },
    /// Pull an encounter's boss
    Engage { encounter: String },
    /// Advance simulated time
    Tick {
        #[arg(short, long, default_value_t = 1000)]
        ms: u64,
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },
    /// Report the boss of an encounter as dead
    Kill { encounter: String },
    /// Kill the whole party
    Wipe,
    /// Bring the party back up
    Revive,
    /// Force-reset an encounter
    Reset { encounter: String },
    /// Set a boss's health percentage
    Hp { encounter: String, percent: f32 },
    /// Show encounter progress and combat state
    State,
    /// Show registered doors and their gating
    Doors,
    /// Print the persisted progress token stream
    Save,
    /// Restore progress from a token stream (quote it)
    Restore { data: String },
    Exit,
}

fn respond(line: &str, ctx: &mut CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "delve".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::Load { path }) => commands::load(path, ctx),
        Some(Commands::Party { count }) => commands::party(*count, ctx),
        Some(Commands::Engage { encounter }) => commands::engage(encounter, ctx),
        Some(Commands::Tick { ms, count }) => commands::tick(*ms, *count, ctx),
        Some(Commands::Kill { encounter }) => commands::kill(encounter, ctx),
        Some(Commands::Wipe) => commands::wipe(ctx),
        Some(Commands::Revive) => commands::revive(ctx),
        Some(Commands::Reset { encounter }) => commands::reset(encounter, ctx),
        Some(Commands::Hp { encounter, percent }) => commands::hp(encounter, *percent, ctx),
        Some(Commands::State) => commands::state(ctx),
        Some(Commands::Doors) => commands::doors(ctx),
        Some(Commands::Save) => commands::save(ctx),
        Some(Commands::Restore { data }) => commands::restore(data, ctx),
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
