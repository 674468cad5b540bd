// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: Convert the faces of an IGES model into an ASCII PCD point cloud
//!
//! Usage:
//!   iges-to-pcd <file.igs> [options]

use iges_lite_core::SequenceNumber;
use iges_lite_processing::{Config, Job, RunSummary, Session};
use std::env;
use std::path::Path;
use std::process;
use std::time::Instant;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let input_path = &args[1];

    // Parse options
    let mut output_path: Option<String> = None;
    let mut job_path: Option<String> = None;
    let mut precision: Option<u32> = None;
    let mut delta: Option<f64> = None;
    let mut uv: Option<(String, String)> = None;
    let mut parametric = false;
    let mut print_summary = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--output" | "-o" => {
                output_path = Some(value(&args, &mut i, "--output").to_string());
            }
            "--precision" => {
                let v = value(&args, &mut i, "--precision");
                precision = Some(v.parse().unwrap_or_else(|_| fail(&format!("Invalid precision value: {}", v))));
            }
            "--delta" => {
                let v = value(&args, &mut i, "--delta");
                delta = Some(v.parse().unwrap_or_else(|_| fail(&format!("Invalid delta value: {}", v))));
            }
            "--uv" => {
                let u = value(&args, &mut i, "--uv").to_string();
                let v = value(&args, &mut i, "--uv").to_string();
                uv = Some((u, v));
            }
            "--parametric" => {
                parametric = true;
            }
            "--job" => {
                job_path = Some(value(&args, &mut i, "--job").to_string());
            }
            "--summary" => {
                print_summary = true;
            }
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    // environment, then job file, then command line
    let mut config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();

    let job = match &job_path {
        Some(path) => Job::load(path).unwrap_or_else(|e| fail(&format!("Cannot read job '{}': {}", path, e))),
        None => Job::default(),
    };
    job.apply_to(&mut config);

    if let Some(precision) = precision {
        config.precision = precision;
    }
    if let Some(delta) = delta {
        config.curve_delta = delta;
    }
    if let Some((u, v)) = &uv {
        if let Err(e) = config.set_uv(u, v) {
            fail(&e.to_string());
        }
    }
    if parametric {
        config.parametric = true;
    }

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
    {
        tracing::warn!(error = %e, "could not size the worker pool");
    }

    let request = config.request().unwrap_or_else(|e| fail(&e.to_string()));
    let output_path = output_path.unwrap_or_else(|| {
        Path::new(input_path)
            .with_extension("pcd")
            .to_string_lossy()
            .into_owned()
    });

    tracing::info!(
        input = %input_path,
        output = %output_path,
        precision = config.precision,
        parametric = config.parametric,
        worker_threads = config.worker_threads,
        "converting IGES model"
    );

    let parse_start = Instant::now();
    let mut session = Session::open(input_path, request)
        .unwrap_or_else(|e| fail(&format!("Cannot load '{}': {}", input_path, e)));
    let parse_time_ms = parse_start.elapsed().as_millis() as u64;

    let report = session.discretize_all();

    let mut applied = 0;
    for entry in &job.defects {
        match session.apply_defect(SequenceNumber(entry.face), &entry.defect) {
            Ok(_) => applied += 1,
            Err(e) => {
                tracing::warn!(face = entry.face, defect = entry.defect.name(), error = %e, "defect skipped")
            }
        }
    }

    if let Err(e) = session.write_pcd(&output_path) {
        fail(&format!("Cannot write '{}': {}", output_path, e));
    }

    let mut summary = RunSummary::new(&session, &report, parse_time_ms);
    summary.defects_applied = applied;

    if print_summary {
        match summary.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => fail(&format!("Cannot encode summary: {}", e)),
        }
    } else {
        println!(
            "{} faces, {} points -> {}",
            summary.faces.len(),
            summary.total_points,
            output_path
        );
    }

    if !report.failed.is_empty() {
        process::exit(2);
    }
}

/// Value following option `name`
fn value<'a>(args: &'a [String], i: &mut usize, name: &str) -> &'a str {
    *i += 1;
    match args.get(*i) {
        Some(v) => v,
        None => fail(&format!("Missing value for {}", name)),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn print_usage() {
    println!("Usage: iges-to-pcd <file.igs> [options]");
    println!();
    println!("Options:");
    println!("  --output <path>     Output PCD file (default: input with .pcd extension)");
    println!("  --precision <n>     Grid cells along the longest face side, 1-50 (default: 10)");
    println!("  --delta <d>         Boundary curve parameter step, 0.0001-1 (default: 0.05)");
    println!("  --uv <u> <v>        Parametric sample counts, 2-500 (default: 20 20)");
    println!("  --parametric        Sample curved B-spline faces in (u, v)");
    println!("  --job <path>        JSON job file with request overrides and defects");
    println!("  --summary           Print a JSON run summary");
    println!();
    println!("Environment:");
    println!("  IGES_PRECISION, IGES_CURVE_DELTA, IGES_U_SAMPLES, IGES_V_SAMPLES,");
    println!("  IGES_PARAMETRIC, IGES_WORKER_THREADS, RUST_LOG");
}
