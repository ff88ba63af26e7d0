use clap::Parser;
use env_logger::Env;
use maze_chase_core::constants::{DEFAULT_LEVEL, FRAME_DT, FRAME_RATE, TUNNEL_TOLERANCE};
use maze_chase_core::geometry::squared_distance;
use maze_chase_core::level::LevelError;
use maze_chase_core::types::{Direction, GameEvent, GhostPhase};
use maze_chase_core::world::World;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// How close a chasing ghost has to be, in cells, before the autopilot
/// switches from collecting to fleeing.
const THREAT_RADIUS_CELLS: f32 = 3.0;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    level: Option<PathBuf>,
    #[arg(long)]
    seconds: Option<u32>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seconds: u32,
    seed: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum RunOutcome {
    Cleared,
    GameOver,
    Timeout,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    seconds: u32,
    outcome: RunOutcome,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    frames: u64,
    score: i32,
    #[serde(rename = "livesLeft")]
    lives_left: i32,
    #[serde(rename = "dotsCollected")]
    dots_collected: i32,
    #[serde(rename = "fruitsCollected")]
    fruits_collected: i32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: i32,
    deaths: i32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    frame: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
    finished_frame: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageDurationMs")]
    average_duration_ms: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame: Option<u64>,
    details: Value,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let level_rows = match load_level_rows(&cli) {
        Ok(rows) => rows,
        Err(error) => {
            eprintln!("failed to read level file: {error}");
            std::process::exit(2);
        }
    };
    let rows: Vec<&str> = level_rows.iter().map(String::as_str).collect();

    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_duration_ms = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "seconds": scenario.seconds,
            }),
        );
        let scenario_run = match run_scenario(&scenario, &rows) {
            Ok(scenario_run) => scenario_run,
            Err(error) => {
                emit_log(
                    "error",
                    "level_invalid",
                    &run_id,
                    Some(&scenario.name),
                    Some(scenario.seed),
                    None,
                    json!({
                        "error": error.to_string(),
                    }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.frame),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_duration_ms += scenario_run.result.duration_ms;
        *outcome_counts
            .entry(outcome_key(scenario_run.result.outcome))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_frame),
            json!({
                "outcome": scenario_run.result.outcome,
                "durationMs": scenario_run.result.duration_ms,
                "score": scenario_run.result.score,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results,
        outcome_counts,
        total_anomalies,
        total_duration_ms,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageDurationMs": summary.average_duration_ms,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario, rows: &[&str]) -> Result<ScenarioRunResult, LevelError> {
    let mut world = World::new(scenario.seed);
    world.load_level(rows, None)?;
    // A twin world fed identical inputs must stay in lockstep; any drift
    // means the simulation picked up a hidden source of nondeterminism.
    let mut twin = World::new(scenario.seed);
    twin.load_level(rows, None)?;

    let mut dots_collected = 0;
    let mut fruits_collected = 0;
    let mut ghosts_eaten = 0;
    let mut deaths = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut prev_exited: Vec<bool> = world.ghosts().iter().map(|ghost| ghost.exited).collect();
    let mut last_frame = 0u64;

    let frame_cap = scenario.seconds as u64 * FRAME_RATE as u64;
    for _ in 0..frame_cap {
        if world.is_ended() {
            break;
        }
        if let Some(dir) = autopilot(&world) {
            world.buffer_player_direction(dir);
            twin.buffer_player_direction(dir);
        }
        world.step(FRAME_DT);
        twin.step(FRAME_DT);

        let snapshot = world.build_snapshot(true);
        let twin_snapshot = twin.build_snapshot(true);
        last_frame = snapshot.frame;

        if snapshot.frame % 60 == 0 {
            let left = serde_json::to_string(&snapshot).expect("snapshot should serialize");
            let right =
                serde_json::to_string(&twin_snapshot).expect("snapshot should serialize");
            if left != right {
                push_anomaly(
                    &mut anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    snapshot.frame,
                    format!("determinism drift at frame {}", snapshot.frame),
                );
            }
        }

        if snapshot.score < 0 {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.frame,
                format!("negative score: {}", snapshot.score),
            );
        }
        if snapshot.lives < 0 {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.frame,
                format!("negative lives: {}", snapshot.lives),
            );
        }
        if let Some(player) = &snapshot.player {
            if player.x.abs() > 1.0 + TUNNEL_TOLERANCE + 1e-4 {
                push_anomaly(
                    &mut anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    snapshot.frame,
                    format!("player outside world bounds: {:.3}", player.x),
                );
            }
        }
        for (ghost, was_exited) in snapshot.ghosts.iter().zip(prev_exited.iter_mut()) {
            if *was_exited && !ghost.exited {
                push_anomaly(
                    &mut anomalies,
                    &mut anomaly_records,
                    &mut anomaly_seen,
                    snapshot.frame,
                    format!("{:?} ghost exit latch reverted", ghost.kind),
                );
            }
            *was_exited = ghost.exited;
        }
        for message in world.find_overlap_violations() {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.frame,
                message,
            );
        }

        for event in &snapshot.events {
            match event {
                GameEvent::PickupCollected { .. } => dots_collected += 1,
                GameEvent::FruitCollected { .. } => fruits_collected += 1,
                GameEvent::GhostEaten { .. } => ghosts_eaten += 1,
                GameEvent::PlayerDied { .. } => deaths += 1,
                GameEvent::LevelCleared { .. } => {}
            }
        }
    }

    let outcome = if world.is_cleared() {
        RunOutcome::Cleared
    } else if world.is_game_over() {
        RunOutcome::GameOver
    } else {
        RunOutcome::Timeout
    };

    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            seconds: scenario.seconds,
            outcome,
            duration_ms: (world.elapsed_secs() * 1000.0) as u64,
            frames: world.frame(),
            score: world.score(),
            lives_left: world.lives(),
            dots_collected,
            fruits_collected,
            ghosts_eaten,
            deaths,
            anomalies,
        },
        anomaly_records,
        finished_frame: last_frame,
    })
}

/// Greedy frame-by-frame steering: flee the nearest active ghost when it is
/// close, otherwise head for the nearest remaining pickup. Good enough to
/// exercise the whole simulation without being a real solver.
fn autopilot(world: &World) -> Option<Direction> {
    let player = world.player()?;
    if player.dying {
        return None;
    }
    let viable = world.player_viable_directions();
    if viable.is_empty() {
        return None;
    }
    let (cell_w, cell_h) = world.cell_size();
    let cell_min = cell_w.min(cell_h);

    let threat = world
        .ghosts()
        .into_iter()
        .filter(|ghost| ghost.phase == GhostPhase::Chasing)
        .map(|ghost| {
            (
                squared_distance(player.x, player.y, ghost.x, ghost.y),
                ghost.x,
                ghost.y,
            )
        })
        .min_by(|a, b| a.0.total_cmp(&b.0));
    let threat_radius = THREAT_RADIUS_CELLS * cell_min;
    let fleeing = matches!(&threat, Some((dist, _, _)) if *dist <= threat_radius * threat_radius);

    let target = if fleeing {
        threat.map(|(_, x, y)| (x, y))
    } else {
        world
            .pickups()
            .into_iter()
            .filter(|pickup| !pickup.collected)
            .map(|pickup| {
                (
                    squared_distance(player.x, player.y, pickup.x, pickup.y),
                    pickup.x,
                    pickup.y,
                )
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, x, y)| (x, y))
    };
    let (target_x, target_y) = target?;

    let mut best: Option<(f32, Direction)> = None;
    for dir in viable {
        let (ux, uy) = dir.unit();
        let next_x = player.x + ux * cell_w;
        let next_y = player.y + uy * cell_h;
        let distance = squared_distance(next_x, next_y, target_x, target_y);
        let mut value = if fleeing { distance } else { -distance };
        if dir == player.dir {
            value += 0.25 * cell_min * cell_min;
        }
        if dir == player.dir.opposite() {
            value -= 0.5 * cell_min * cell_min;
        }
        if best.map_or(true, |(best_value, _)| value > best_value) {
            best = Some((value, dir));
        }
    }
    best.map(|(_, dir)| dir)
}

fn load_level_rows(cli: &Cli) -> io::Result<Vec<String>> {
    match cli.level.as_ref() {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            Ok(text.lines().map(str::to_string).collect())
        }
        None => Ok(DEFAULT_LEVEL.iter().map(|row| row.to_string()).collect()),
    }
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(now_ms));

    if cli.seconds.is_some() || cli.level.is_some() {
        let seconds = cli.seconds.unwrap_or(60).clamp(5, 600);
        return vec![Scenario {
            name: format!("custom-{seconds}s"),
            seconds,
            seed,
        }];
    }

    vec![
        Scenario {
            name: "quick-check".to_string(),
            seconds: 45,
            seed,
        },
        Scenario {
            name: "soak-check".to_string(),
            seconds: 180,
            seed: normalize_seed(seed as u64 + 1),
        },
    ]
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    frame: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        frame,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_duration_ms: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_duration_ms = if scenario_count == 0 {
        0
    } else {
        total_duration_ms / scenario_count as u64
    };
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_duration_ms,
        outcome_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    frame: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        frame,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn outcome_key(outcome: RunOutcome) -> String {
    match outcome {
        RunOutcome::Cleared => "cleared",
        RunOutcome::GameOver => "game_over",
        RunOutcome::Timeout => "timeout",
    }
    .to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_scenario_result(outcome: RunOutcome, duration_ms: u64) -> ScenarioResultLine {
        ScenarioResultLine {
            scenario: "test".to_string(),
            seed: 42,
            seconds: 60,
            outcome,
            duration_ms,
            frames: 600,
            score: 100,
            lives_left: 3,
            dots_collected: 10,
            fruits_collected: 1,
            ghosts_eaten: 0,
            deaths: 0,
            anomalies: Vec::new(),
        }
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_calculates_average_duration() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            1,
            2,
            vec![
                make_scenario_result(RunOutcome::Timeout, 60_000),
                make_scenario_result(RunOutcome::Cleared, 90_000),
            ],
            BTreeMap::from([
                ("timeout".to_string(), 1usize),
                ("cleared".to_string(), 1usize),
            ]),
            1,
            150_000,
        );
        assert_eq!(summary.average_duration_ms, 75_000);
        assert_eq!(summary.scenario_count, 2);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let target = std::env::temp_dir()
            .join(format!("maze-chase-missing-{now}"))
            .join("summary.json");
        let summary = build_run_summary(
            "sim-1-1".to_string(),
            1,
            2,
            vec![make_scenario_result(RunOutcome::Timeout, 60_000)],
            BTreeMap::from([("timeout".to_string(), 1usize)]),
            0,
            60_000,
        );
        let result = write_summary(&target, &summary);
        assert!(result.is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            10,
            "same anomaly".to_string(),
        );
        push_anomaly(
            &mut anomalies,
            &mut records,
            &mut seen,
            11,
            "same anomaly".to_string(),
        );

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].frame, 10);
        assert_eq!(records[1].frame, 11);
    }

    #[test]
    fn autopilot_collects_until_a_ghost_gets_close() {
        let rows = ["#####", "#   #", "#P# #", "#. D#", "#####"];
        let mut world = World::new(7);
        world.load_level(&rows, None).expect("level should load");

        // No active ghost yet: head for the dot below.
        assert_eq!(autopilot(&world), Some(Direction::Down));

        // Once the chaser is active and nearby, run the other way.
        for _ in 0..40 {
            world.step(FRAME_DT);
        }
        assert_eq!(world.ghosts()[0].phase, GhostPhase::Chasing);
        assert_eq!(autopilot(&world), Some(Direction::Up));
    }
}
