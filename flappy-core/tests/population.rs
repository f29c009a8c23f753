use flappy_core::constants::AGENT_HEIGHT;
use flappy_core::{
    Controller, DecisionError, EliminationCause, Episode, EpisodeSetup, FnController, MemberId,
    Observation, PopulationMember, SimConfig, TerminationReason,
};

struct Constant(f64);

impl Controller for Constant {
    fn decide(&mut self, _observation: &Observation) -> Result<f64, DecisionError> {
        Ok(self.0)
    }
}

fn member(id: u32, decision: f64) -> PopulationMember<Constant> {
    PopulationMember::new(MemberId(id), Constant(decision))
}

#[test]
fn jumping_agent_outlasts_falling_agents() {
    let mut episode = Episode::new(
        SimConfig::default(),
        EpisodeSetup::new(0x5EED, 0),
        [member(0, 0.0), member(1, 1.0), member(2, 0.0)],
    )
    .expect("default config is valid");

    let outcome = episode.run().expect("episode runs to completion");
    assert_eq!(outcome.reason, TerminationReason::AllEliminated);
    assert_eq!(outcome.score, 0);
    assert_eq!(outcome.results.len(), 3);

    let jumper = outcome.results[1];
    assert_eq!(jumper.id, MemberId(1));
    for faller in [outcome.results[0], outcome.results[2]] {
        assert!(faller.fitness < jumper.fitness);
        assert!(faller.ticks_survived <= jumper.ticks_survived);
        assert_eq!(faller.cause, EliminationCause::OutOfBounds);
        assert_eq!(faller.ticks_survived, 23);
        assert!((faller.fitness - 2.3).abs() < 1e-9);
    }

    // Flapping every tick ends at the ceiling.
    assert_eq!(jumper.cause, EliminationCause::OutOfBounds);
    assert_eq!(jumper.ticks_survived, 37);
    assert!((jumper.fitness - 3.7).abs() < 1e-9);
    assert_eq!(outcome.best().map(|best| best.id), Some(MemberId(1)));
}

#[test]
fn gap_tracker_clears_first_obstacle() {
    let mut config = SimConfig::default();
    config.max_ticks = Some(2_000);
    let jump_margin = f64::from(AGENT_HEIGHT) + 20.0;
    let tracker = FnController(move |observation: &Observation| {
        if observation.bottom_gap_distance < jump_margin {
            1.0
        } else {
            0.0
        }
    });

    let setup = EpisodeSetup::new(0x5EED, 0).with_first_gap(250);
    let mut episode = Episode::new(config, setup, [PopulationMember::new(MemberId(0), tracker)])
        .expect("valid episode");
    assert_eq!(episode.obstacles()[0].gap_bottom(), 350);

    while episode.score() == 0 {
        let report = episode.step().expect("tick");
        assert!(
            report.eliminations.is_empty(),
            "eliminated at tick {} before clearing",
            report.tick
        );
    }

    assert_eq!(episode.score(), 1);
    assert_eq!(episode.tick(), 75);
    assert_eq!(episode.live_count(), 1);
    let pose = episode.snapshot().agents[0];
    assert!((pose.fitness - (7.5 + 5.0)).abs() < 1e-9);
}

#[test]
fn elimination_order_does_not_depend_on_population_order() {
    let forward = Episode::new(
        SimConfig::default(),
        EpisodeSetup::new(77, 0),
        [member(0, 1.0), member(1, 0.0)],
    )
    .map(|mut episode| episode.run())
    .expect("valid episode")
    .expect("run");
    let reversed = Episode::new(
        SimConfig::default(),
        EpisodeSetup::new(77, 0),
        [member(1, 0.0), member(0, 1.0)],
    )
    .map(|mut episode| episode.run())
    .expect("valid episode")
    .expect("run");

    for id in [MemberId(0), MemberId(1)] {
        assert_eq!(forward.fitness_of(id), reversed.fitness_of(id));
    }
    assert_eq!(forward.ticks, reversed.ticks);
}
