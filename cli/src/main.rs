use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use encoding_rs::Encoding;
use rpg_engine::api::{self, Winner, DEFAULT_MAX_ROUNDS};
use rpg_engine::config::ContentFormat;
use rpg_engine::{ability_mod, AbilityScoreMethod, DiceRoller, EngineConfig};
use std::{fs, path::Path, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, ValueEnum)]
enum Method {
    /// 4d6, drop the lowest die
    Standard,
    /// Straight 3d6
    Classic,
    /// Every score starts at 8
    PointBuy,
}

impl From<Method> for AbilityScoreMethod {
    fn from(m: Method) -> Self {
        match m {
            Method::Standard => AbilityScoreMethod::FourD6DropLowest,
            Method::Classic => AbilityScoreMethod::ThreeD6,
            Method::PointBuy => AbilityScoreMethod::PointBuy,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Roll a dice expression such as `2d6+3`, `4d6kh3` or `1d20+5 advantage`
    Roll {
        #[arg(allow_hyphen_values = true)]
        expression: String,
        /// Label shown in front of each result
        #[arg(long)]
        label: Option<String>,
        /// Number of times to roll
        #[arg(long, default_value_t = 1)]
        times: u32,
        /// RNG seed for determinism
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Roll a set of six ability scores
    Abilities {
        #[arg(long, value_enum, default_value_t = Method::Standard)]
        method: Method,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Roll hit points for a character level
    HitPoints {
        /// Hit die size, e.g. 10 for a d10
        #[arg(long)]
        hit_die: u32,
        #[arg(long, default_value_t = 1)]
        level: u32,
        /// Constitution modifier applied at every level
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        con: i32,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run an automated fight between players and enemies
    Skirmish {
        /// Roster file (JSON or YAML list of combatants)
        #[arg(long, conflicts_with = "builtin")]
        roster: Option<PathBuf>,
        /// Built-in roster id
        #[arg(long, default_value = "goblin_ambush")]
        builtin: String,
        /// Engine config file (JSON or YAML)
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS)]
        max_rounds: u32,
        /// Overrides any seed in the config file
        #[arg(long)]
        seed: Option<u64>,
        /// Print the full report as JSON instead of the log
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Parser)]
#[command(name = "rpg")]
#[command(about = "Dice and combat resolution harness")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn roller_for(seed: Option<u64>) -> DiceRoller {
    match seed {
        Some(seed) => DiceRoller::seeded(seed),
        None => DiceRoller::default(),
    }
}

fn read_text_auto(path: &Path) -> anyhow::Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        Ok(String::from_utf8(bytes)?)
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => {
            let text = read_text_auto(path)?;
            EngineConfig::from_str_with(&text, ContentFormat::from_path(path))
                .with_context(|| format!("config {}", path.display()))
        }
        None => Ok(EngineConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Cmd::Roll {
            expression,
            label,
            times,
            seed,
        } => {
            let mut roller = roller_for(seed);
            for _ in 0..times {
                let res = roller.roll(&expression, label.as_deref());
                if let Some(err) = &res.error {
                    anyhow::bail!("{}", err);
                }
                println!("{}", res);
            }
        }
        Cmd::Abilities { method, seed } => {
            let mut roller = roller_for(seed);
            let scores = roller.roll_ability_scores(method.into());
            for (name, score) in ["STR", "DEX", "CON", "INT", "WIS", "CHA"].iter().zip(scores) {
                println!("{} {:>2} ({:+})", name, score, ability_mod(score));
            }
        }
        Cmd::HitPoints {
            hit_die,
            level,
            con,
            seed,
        } => {
            if hit_die == 0 || level == 0 {
                anyhow::bail!("hit die and level must both be at least 1");
            }
            let mut roller = roller_for(seed);
            println!("{}", roller.roll_hit_points(hit_die, level, con));
        }
        Cmd::Skirmish {
            roster,
            builtin,
            config,
            max_rounds,
            seed,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if seed.is_some() {
                config.seed = seed;
            }
            let specs = match roster {
                Some(path) => {
                    let text = read_text_auto(&path)?;
                    api::parse_roster(&text, ContentFormat::from_path(&path))
                        .with_context(|| format!("roster {}", path.display()))?
                }
                None => api::builtin_roster(&builtin)?,
            };
            tracing::info!(combatants = specs.len(), seed = ?config.seed, "roster loaded");
            let (mut engine, _) = api::engine_with_roster(config, specs);
            let report = api::simulate_skirmish(&mut engine, max_rounds)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for line in &report.log {
                    println!("{}", line);
                }
                let verdict = match report.winner {
                    Winner::Players => "players win",
                    Winner::Enemies => "enemies win",
                    Winner::Draw => "draw",
                };
                println!("Result: {} after {} round(s)", verdict, report.rounds);
            }
        }
    }
    Ok(())
}
