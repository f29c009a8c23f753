use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flappy_core::EpisodeSetup;
use flappy_evolve::config::TrainConfig;
use flappy_evolve::evolution::{run_training, replay_network, Champion, TrainOptions};
use flappy_evolve::util::{parse_seed, parse_seed_csv, seed_to_hex, write_json};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flappy-evolve")]
#[command(about = "Neuroevolution driver for the deterministic flappy population simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evolve a population of networks and save the champion
    Train {
        /// JSON training config; missing fields fall back to defaults
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value = "runs/latest")]
        out_dir: PathBuf,
        #[arg(long)]
        generations: Option<u32>,
        #[arg(long)]
        population: Option<usize>,
        #[arg(long)]
        seeds_per_generation: Option<u32>,
        #[arg(long)]
        base_seed: Option<String>,
        #[arg(long)]
        fitness_target: Option<f64>,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Fly a saved champion through one or more seeded episodes
    Replay {
        #[arg(long)]
        champion: PathBuf,
        /// Comma-separated seeds (hex or decimal)
        #[arg(long, default_value = "0x00000001")]
        seeds: String,
        #[arg(long)]
        max_ticks: Option<u32>,
        /// Dump every frame of the first seed as JSON
        #[arg(long)]
        frames_out: Option<PathBuf>,
    },
    /// Print or write the default training config
    Config {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Commands::Train {
            config,
            out_dir,
            generations,
            population,
            seeds_per_generation,
            base_seed,
            fitness_target,
            jobs,
        } => {
            let mut train = match &config {
                Some(path) => TrainConfig::from_file(path)?,
                None => TrainConfig::default(),
            };
            if let Some(value) = generations {
                train.generations = value;
            }
            if let Some(value) = population {
                train.population_size = value;
            }
            if let Some(value) = seeds_per_generation {
                train.seeds_per_generation = value;
            }
            if let Some(value) = base_seed {
                train.base_seed = parse_seed(&value)?;
            }
            if fitness_target.is_some() {
                train.fitness_target = fitness_target;
            }
            train.clamp();

            write_json(&out_dir.join("config.json"), &train)?;
            let summary = run_training(
                &train,
                &TrainOptions {
                    out_dir: Some(out_dir.clone()),
                    jobs,
                },
            )?;

            println!("base_seed={}", seed_to_hex(train.base_seed));
            println!("population={}", train.population_size);
            println!("generations_run={}", summary.reports.len());
            println!("reached_target={}", summary.reached_target);
            println!("champion_generation={}", summary.champion.generation);
            println!("champion_fitness={:.3}", summary.champion.fitness);
            if let Some(last) = summary.reports.last() {
                println!("last_best_score={}", last.best_score);
                println!("last_mean_fitness={:.3}", last.mean_fitness);
            }
            println!("out_dir={}", out_dir.display());
        }
        Commands::Replay {
            champion,
            seeds,
            max_ticks,
            frames_out,
        } => {
            let raw = fs::read(&champion)
                .with_context(|| format!("failed reading champion {}", champion.display()))?;
            let saved: Champion = serde_json::from_slice(&raw)
                .with_context(|| format!("failed parsing champion {}", champion.display()))?;
            let mut sim = saved.sim;
            if max_ticks.is_some() {
                sim.max_ticks = max_ticks;
            }
            let seeds = parse_seed_csv(&seeds)?;

            println!("champion={}", champion.display());
            println!("trained_generation={}", saved.generation);
            for (index, seed) in seeds.iter().enumerate() {
                let frames = if index == 0 { frames_out.as_deref() } else { None };
                let outcome = replay_network(
                    &saved.network,
                    &sim,
                    EpisodeSetup::new(*seed, saved.generation),
                    frames,
                )?;
                let fitness = outcome.best().map(|r| r.fitness).unwrap_or_default();
                println!(
                    "seed={} score={} ticks={} reason={:?} fitness={:.3}",
                    seed_to_hex(*seed),
                    outcome.score,
                    outcome.ticks,
                    outcome.reason,
                    fitness
                );
            }
            if let Some(path) = frames_out {
                println!("frames={}", path.display());
            }
        }
        Commands::Config { output } => {
            let config = TrainConfig::default();
            if let Some(path) = output {
                write_json(&path, &config)?;
                println!("wrote={}", path.display());
            } else {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}
