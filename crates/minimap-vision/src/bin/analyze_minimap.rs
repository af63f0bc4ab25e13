//! CLI tool to run a saved minimap crop through the detection pipeline and
//! dump the intermediate stages.
//! Usage: cargo run -p minimap-vision --features cli --bin analyze_minimap --
//!        <minimap.png> <data_dir> <allies> <enemies> [output_dir]

use image::Rgb;
use imageproc::drawing::draw_hollow_circle_mut;
use minimap_state::{Roster, Side};
use minimap_vision::{DetectorConfig, InspectionLog, MinimapDetector, MinimapImage};
use std::path::PathBuf;

fn split_roster(arg: &str) -> Vec<String> {
    arg.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 {
        eprintln!(
            "Usage: {} <minimap.png> <data_dir> <Ally1,Ally2,..> <Enemy1,Enemy2,..> [output_dir]",
            args[0]
        );
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let data_dir = PathBuf::from(&args[2]);
    let roster = Roster::new(split_roster(&args[3]), split_roster(&args[4]));
    let output_dir = if args.len() >= 6 {
        PathBuf::from(&args[5])
    } else {
        PathBuf::from("./debug_output")
    };
    let _ = std::fs::create_dir_all(&output_dir);

    println!("Loading minimap: {}", input_path.display());
    let minimap = match MinimapImage::open(&input_path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    println!("Minimap size: {}x{}", minimap.width(), minimap.height());

    let detector = match MinimapDetector::load(DetectorConfig::default(), &data_dir) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to load map data: {:#}", e);
            std::process::exit(1);
        }
    };

    let mut log = InspectionLog::default();
    let report = detector.locate_inspected(&minimap, &roster, &mut log);

    if let Some(ref masks) = log.masks {
        let _ = masks.ally.save(output_dir.join("ally_mask.png"));
        let _ = masks.enemy.save(output_dir.join("enemy_mask.png"));
    }

    let mut overlay = minimap.rgb().clone();
    for side in [Side::Ally, Side::Enemy] {
        let candidates = log.candidates_for(side);
        println!("\n=== {:?} candidates ===", side);
        for (i, c) in candidates.iter().enumerate() {
            println!(
                "  #{}: x={:.1} y={:.1} r={:.1} {}",
                i,
                c.x,
                c.y,
                c.radius,
                if c.is_foreground { "foreground" } else { "background" }
            );
            let color = match (side, c.is_foreground) {
                (_, false) => Rgb([255, 255, 0]),
                (Side::Ally, true) => Rgb([0, 255, 255]),
                (Side::Enemy, true) => Rgb([255, 0, 255]),
            };
            draw_hollow_circle_mut(
                &mut overlay,
                (c.x.round() as i32, c.y.round() as i32),
                c.radius.round() as i32,
                color,
            );
        }

        for champion in roster.side(side) {
            println!("\n  {} scores:", champion);
            let scores = log.scores_for(champion);
            if scores.is_empty() {
                println!("    (not scored)");
            }
            for s in scores {
                println!(
                    "    #{}: shape={:.3} color={:.3} combined={:.3}",
                    s.candidate, s.shape, s.color, s.combined
                );
            }
        }
    }
    let _ = overlay.save(output_dir.join("candidates.png"));

    println!("\n=== Result ===");
    println!("{}", report.summary());
    println!("\nDebug images saved to: {}", output_dir.display());
}
