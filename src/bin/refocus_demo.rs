use hopfield_refocus::config::refocus::load_config;
use hopfield_refocus::image::io::{load_planes, save_planes, write_json_file};
use hopfield_refocus::{CancelToken, Outcome, Refocuser};
use std::env;
use std::io::Write;
use std::path::Path;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let mut loaded = load_planes(&config.input)?;
    let params = config.params.clamped();
    println!(
        "Loaded {} ({}x{}, {:?}); radius={} gauss={} motion={}@{}° iterations={}",
        config.input.display(),
        loaded.width(),
        loaded.height(),
        loaded.layout,
        params.radius,
        params.gauss,
        params.motion,
        params.motion_angle,
        params.iterations
    );

    let refocuser = Refocuser::new(params);
    let mut last_percent = -1i32;
    let mut progress = |fraction: f32| {
        let percent = (fraction * 100.0) as i32;
        if percent != last_percent {
            last_percent = percent;
            eprint!("\rRefocusing... {percent:3}%");
            let _ = std::io::stderr().flush();
        }
    };
    let report = refocuser
        .restore(&mut loaded.planes, &mut progress, &CancelToken::new())
        .map_err(|e| format!("Restoration failed: {e}"))?;
    eprintln!();

    save_planes(&loaded.planes, &config.output.image)?;
    println!(
        "Saved restored image to {} in {:.1} ms",
        config.output.image.display(),
        report.timings.total_ms
    );
    if let Outcome::Cancelled { iterations_done } = report.outcome {
        println!("Run was cancelled after {iterations_done} iterations");
    }

    if let Some(path) = &config.output.report_json {
        write_json_file(path, &report)?;
        println!("Saved report to {}", path.display());
    }

    Ok(())
}

fn usage() -> String {
    "Usage: refocus_demo <config.json>".to_string()
}
