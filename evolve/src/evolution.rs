//! Generation loop: evaluate a population of networks on shared episodes,
//! then breed the next generation from the fitness the core reports back.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, ensure, Context, Result};
use flappy_core::rng::SeededRng;
use flappy_core::{
    Episode, EpisodeOutcome, EpisodeSetup, FrameSnapshot, MemberId, PopulationMember, SimConfig,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TrainConfig;
use crate::network::Network;
use crate::util::{seed_to_hex, write_json};

const SEED_STRIDE: u32 = 0x9E37_79B9;
const BREEDER_SALT: u32 = 0xA5A5_5A5A;

#[derive(Clone, Debug, Default)]
pub struct TrainOptions {
    /// Reports and the champion are written here when set.
    pub out_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: u32,
    pub seeds: Vec<String>,
    pub population_size: usize,
    pub best_index: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub worst_fitness: f64,
    /// Most obstacles cleared in any single episode this generation.
    pub best_score: u32,
    pub mean_ticks: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Champion {
    pub generation: u32,
    pub fitness: f64,
    pub network: Network,
    pub sim: SimConfig,
}

#[derive(Clone, Debug)]
pub struct TrainingSummary {
    pub reports: Vec<GenerationReport>,
    pub champion: Champion,
    pub reached_target: bool,
}

/// Episode seeds for one generation, derived from the run's base seed.
pub fn generation_seeds(base_seed: u32, generation: u32, count: u32) -> Vec<u32> {
    let mut rng = SeededRng::new(base_seed ^ generation.wrapping_add(1).wrapping_mul(SEED_STRIDE));
    (0..count).map(|_| rng.next()).collect()
}

/// Runs one episode per seed with the whole population flying together.
/// Outcomes come back in seed order.
pub fn evaluate_population(
    population: &[Network],
    sim: &SimConfig,
    generation: u32,
    seeds: &[u32],
    jobs: Option<usize>,
) -> Result<Vec<EpisodeOutcome>> {
    let run_one = |seed: &u32| -> Result<EpisodeOutcome> {
        let members = population
            .iter()
            .enumerate()
            .map(|(index, network)| PopulationMember::new(MemberId(index as u32), network.clone()));
        let mut episode = Episode::new(*sim, EpisodeSetup::new(*seed, generation), members)
            .context("invalid simulation config")?;
        episode.run().with_context(|| {
            format!(
                "episode failed for generation={generation} seed={}",
                seed_to_hex(*seed)
            )
        })
    };

    let results: Vec<Result<EpisodeOutcome>> = if let Some(jobs) = jobs {
        if jobs == 0 {
            return Err(anyhow!("--jobs must be >= 1 when provided"));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| seeds.par_iter().map(run_one).collect())
    } else {
        seeds.par_iter().map(run_one).collect()
    };

    results.into_iter().collect()
}

/// Per-member fitness averaged over every episode of the generation.
pub fn mean_fitness(population_size: usize, outcomes: &[EpisodeOutcome]) -> Vec<f64> {
    let mut sums = vec![0.0; population_size];
    for outcome in outcomes {
        for result in &outcome.results {
            if let Some(sum) = sums.get_mut(result.id.0 as usize) {
                *sum += result.fitness;
            }
        }
    }
    let episodes = outcomes.len().max(1) as f64;
    sums.into_iter().map(|sum| sum / episodes).collect()
}

/// Produces offspring by elitism, tournament selection, uniform crossover
/// and gaussian weight mutation.
pub struct Breeder {
    rng: SeededRng,
    elite_count: usize,
    tournament_size: usize,
    mutation_rate: f64,
    mutation_scale: f64,
}

impl Breeder {
    pub fn new(config: &TrainConfig) -> Self {
        Self {
            rng: SeededRng::new(config.base_seed ^ BREEDER_SALT),
            elite_count: config.elite_count,
            tournament_size: config.tournament_size.max(1),
            mutation_rate: config.mutation_rate,
            mutation_scale: config.mutation_scale,
        }
    }

    pub fn seed_population(
        &mut self,
        size: usize,
        hidden_units: usize,
        input_scale: f64,
    ) -> Result<Vec<Network>> {
        (0..size)
            .map(|_| Network::random(hidden_units, input_scale, &mut self.rng))
            .collect()
    }

    pub fn next_generation(
        &mut self,
        population: &[Network],
        fitness: &[f64],
    ) -> Result<Vec<Network>> {
        if population.is_empty() || population.len() != fitness.len() {
            return Err(anyhow!(
                "population/fitness mismatch: {} networks, {} scores",
                population.len(),
                fitness.len()
            ));
        }

        let mut ranked: Vec<usize> = (0..population.len()).collect();
        ranked.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]).then(a.cmp(&b)));

        let mut next: Vec<Network> = ranked
            .iter()
            .take(self.elite_count)
            .map(|&index| population[index].clone())
            .collect();

        while next.len() < population.len() {
            let mother = self.tournament(fitness).context("tournament over an empty population")?;
            let father = self.tournament(fitness).context("tournament over an empty population")?;
            let mut weights =
                self.crossover(population[mother].weights(), population[father].weights());
            self.mutate(&mut weights);
            next.push(population[mother].with_weights(weights)?);
        }

        Ok(next)
    }

    fn tournament(&mut self, fitness: &[f64]) -> Option<usize> {
        let len = u32::try_from(fitness.len()).ok().filter(|&len| len > 0)?;
        let mut best = self.rng.next_int(len) as usize;
        for _ in 1..self.tournament_size {
            let challenger = self.rng.next_int(len) as usize;
            if fitness[challenger] > fitness[best] {
                best = challenger;
            }
        }
        Some(best)
    }

    fn crossover(&mut self, mother: &[f64], father: &[f64]) -> Vec<f64> {
        mother
            .iter()
            .zip(father)
            .map(|(&m, &f)| if self.rng.next() & 1 == 0 { m } else { f })
            .collect()
    }

    fn mutate(&mut self, weights: &mut [f64]) {
        for weight in weights {
            if self.rng.next_unit() < self.mutation_rate {
                *weight += self.gaussian() * self.mutation_scale;
            }
        }
    }

    /// Box-Muller over the seeded stream.
    fn gaussian(&mut self) -> f64 {
        let u1 = 1.0 - self.rng.next_unit();
        let u2 = self.rng.next_unit();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

pub fn run_training(config: &TrainConfig, options: &TrainOptions) -> Result<TrainingSummary> {
    ensure!(config.population_size > 0, "population_size must be at least 1");
    ensure!(config.generations > 0, "generations must be at least 1");
    ensure!(
        config.seeds_per_generation > 0,
        "seeds_per_generation must be at least 1"
    );
    config.sim.validate().context("invalid simulation config")?;
    if config.sim.max_ticks.is_none() {
        return Err(anyhow!("training requires sim.max_ticks to bound each episode"));
    }

    let mut breeder = Breeder::new(config);
    let mut population = breeder.seed_population(
        config.population_size,
        config.hidden_units,
        config.sim.playfield.height,
    )?;

    let mut reports = Vec::with_capacity(config.generations as usize);
    let mut champion: Option<Champion> = None;
    let mut reached_target = false;

    for generation in 0..config.generations {
        let seeds = generation_seeds(config.base_seed, generation, config.seeds_per_generation);
        let outcomes =
            evaluate_population(&population, &config.sim, generation, &seeds, options.jobs)?;
        let fitness = mean_fitness(population.len(), &outcomes);
        let report = summarize(generation, &seeds, &fitness, &outcomes);

        tracing::info!(
            generation,
            best = report.best_fitness,
            mean = report.mean_fitness,
            best_score = report.best_score,
            mean_ticks = report.mean_ticks,
            "generation evaluated"
        );

        let improved = champion
            .as_ref()
            .map_or(true, |current| report.best_fitness > current.fitness);
        if improved {
            champion = Some(Champion {
                generation,
                fitness: report.best_fitness,
                network: population[report.best_index].clone(),
                sim: config.sim,
            });
        }

        if let Some(dir) = &options.out_dir {
            write_json(
                &dir.join("generations").join(format!("gen-{generation:04}.json")),
                &report,
            )?;
        }

        reached_target = config
            .fitness_target
            .is_some_and(|target| report.best_fitness >= target);
        reports.push(report);

        if reached_target {
            tracing::info!(generation, "fitness target reached");
            break;
        }
        if generation + 1 < config.generations {
            population = breeder.next_generation(&population, &fitness)?;
        }
    }

    let champion = champion.ok_or_else(|| anyhow!("training ran zero generations"))?;
    if let Some(dir) = &options.out_dir {
        write_json(&dir.join("champion.json"), &champion)?;
        write_json(&dir.join("summary.json"), &reports)?;
    }

    Ok(TrainingSummary {
        reports,
        champion,
        reached_target,
    })
}

fn summarize(
    generation: u32,
    seeds: &[u32],
    fitness: &[f64],
    outcomes: &[EpisodeOutcome],
) -> GenerationReport {
    let mut best_index = 0;
    for (index, value) in fitness.iter().enumerate() {
        if *value > fitness[best_index] {
            best_index = index;
        }
    }
    let worst_fitness = fitness.iter().copied().fold(f64::INFINITY, f64::min);
    let mean = fitness.iter().sum::<f64>() / fitness.len().max(1) as f64;
    let mean_ticks = outcomes.iter().map(|o| f64::from(o.ticks)).sum::<f64>()
        / outcomes.len().max(1) as f64;

    GenerationReport {
        generation,
        seeds: seeds.iter().copied().map(seed_to_hex).collect(),
        population_size: fitness.len(),
        best_index,
        best_fitness: fitness.get(best_index).copied().unwrap_or_default(),
        mean_fitness: mean,
        worst_fitness,
        best_score: outcomes.iter().map(|o| o.score).max().unwrap_or_default(),
        mean_ticks,
    }
}

/// Flies a single network through one episode, optionally dumping every frame.
pub fn replay_network(
    network: &Network,
    sim: &SimConfig,
    setup: EpisodeSetup,
    frames_out: Option<&Path>,
) -> Result<EpisodeOutcome> {
    let member = PopulationMember::new(MemberId(0), network.clone());
    let mut episode = Episode::new(*sim, setup, [member]).context("invalid replay setup")?;

    let mut frames: Vec<FrameSnapshot> = Vec::new();
    if frames_out.is_some() {
        frames.push(episode.snapshot());
    }
    while !episode.phase().is_terminated() {
        episode.step().context("replay episode failed")?;
        if frames_out.is_some() {
            frames.push(episode.snapshot());
        }
    }

    let outcome = episode
        .outcome()
        .ok_or_else(|| anyhow!("replay ended without an outcome"))?;
    if let Some(path) = frames_out {
        write_json(path, &frames)?;
    }
    Ok(outcome)
}
