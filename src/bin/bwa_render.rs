use bw_abstraction::config::render::load_config;
use bw_abstraction::diagnostics::AbstractionReport;
use bw_abstraction::image::io::{save_grayscale_u8, write_json_file};
use bw_abstraction::raster::load_camera_matrix;
use bw_abstraction::Abstractor;
use std::env;
use std::path::PathBuf;
use std::time::Instant;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "bwa_render".to_string());
    let config_path = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| format!("Usage: {program} <config.json>"))?;
    let config = load_config(&config_path)?;
    let params = &config.params;

    let start = Instant::now();
    let mut abstractor = Abstractor::new();
    abstractor
        .load_model_from_obj(&config.input, params)
        .map_err(|e| format!("Failed to load model {}: {e}", config.input.display()))?;
    let load_ms = start.elapsed().as_secs_f64() * 1000.0;

    let mvp = load_camera_matrix(&config.camera)
        .map_err(|e| format!("Failed to load camera {}: {e}", config.camera.display()))?;
    let report = abstractor
        .render(&mvp, params)
        .map_err(|e| format!("Render failed: {e}"))?;

    if params.verbose {
        print_summary(&report, load_ms);
    }

    if let Some(path) = &config.output.image {
        save_grayscale_u8(&report.result.image, path).map_err(|e| e.to_string())?;
        println!("Image written to {}", path.display());
    }
    if let Some(path) = &config.output.report_json {
        write_json_file(path, &report)
            .map_err(|e| format!("Failed to write report {}: {e}", path.display()))?;
        println!("JSON report written to {}", path.display());
    }
    if let Some(dir) = &config.output.debug_dir {
        let written = report
            .result
            .debug_images
            .save_all(dir)
            .map_err(|e| format!("Failed to write debug images to {}: {e}", dir.display()))?;
        println!("{written} debug images written to {}", dir.display());
    }
    Ok(())
}

fn print_summary(report: &AbstractionReport, load_ms: f64) {
    let trace = &report.trace;
    println!("Model load: {load_ms:.3} ms ({} faces)", trace.input.faces);
    println!("{}", trace.summary());
    for pass in &trace.segmentation.passes {
        println!(
            "  {:?}: input={} created={} unresolved={}",
            pass.strategy, pass.input_pixels, pass.patches_created, pass.unresolved
        );
    }
    for stage in &trace.timings.stages {
        println!("  {}: {:.3} ms", stage.label, stage.elapsed_ms);
    }
}
