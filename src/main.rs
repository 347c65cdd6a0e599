use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::ProgressBar;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

mod cli;
mod config_file;
mod error;
mod image_processing;
mod json_output;
mod utils;

use cli::Args;
use image_processing::{OutputImageSettings, PipelineConfig, ProcessingEngine};
use json_output::JsonMessage;
use utils::{
    create_progress_bar, format_duration, parse_hex_rgb, validate_inputs, verbose_println,
    ProcessingStats,
};

fn main() -> Result<()> {
    let start_time = Instant::now();
    let mut args = Args::parse();
    args.load_and_merge_config()?;

    // Print banner
    if !args.json_progress {
        println!("{}", style("Content Image Processor").bold().blue());
        println!("{}", style("Batch image normalization pipeline").dim());
        println!();
    }

    validate_inputs(&args)?;

    // Build the immutable settings snapshot for this run
    let (width, height) = args.parse_size()?;
    let settings = OutputImageSettings {
        width,
        height,
        quality: args.quality,
        color_limits: args.parse_color_limits()?,
    };
    let config = PipelineConfig {
        crop: !args.no_crop,
        square: !args.no_square,
        fit: !args.no_fit,
        opaque: args.opaque,
        square_fill_color: parse_hex_rgb(&args.square_fill_color)?,
        opaque_fill_color: parse_hex_rgb(&args.opaque_fill_color)?,
        ignore_corrupt_metadata: args.ignore_corrupt_metadata,
        preserve_original_format: args.preserve_format,
        no_overwrite: args.no_overwrite,
    };
    let worker_limit = args.worker_limit();
    let extensions = args.extensions();
    let verbose = args.verbose && !args.json_progress;

    if verbose {
        println!("{}", style("Configuration:").bold());
        println!("  Target size: {}x{}", settings.width, settings.height);
        println!("  Quality: {}", settings.quality);
        println!(
            "  Color limits: {},{},{},{}",
            settings.color_limits.red_max,
            settings.color_limits.green_max,
            settings.color_limits.blue_max,
            settings.color_limits.alpha_max
        );
        println!(
            "  Steps: crop={} square={} opaque={} fit={}",
            config.crop, config.square, config.opaque, config.fit
        );
        println!(
            "  Preserve original format: {}",
            config.preserve_original_format
        );
        println!("  No overwrite: {}", config.no_overwrite);
        println!("  Ignore corrupt metadata: {}", config.ignore_corrupt_metadata);
        println!("  Workers: {}", worker_limit);
        println!("  Extensions: {:?}", extensions);
        println!();
    }

    std::fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    let engine = ProcessingEngine::new(settings, config, verbose)?;

    // Discover all images
    let items = engine.discover_images(&args.input_paths, &extensions, &args.output_dir)?;
    let total = items.len();

    if items.is_empty() {
        if args.json_progress {
            JsonMessage::summary(0, 0, 0, start_time.elapsed().as_secs_f64());
        } else {
            println!(
                "{}",
                style("No images found with specified extensions").red()
            );
        }
        return Ok(());
    }

    if !args.json_progress {
        println!("Found {} images", style(total).bold());
    }

    let json_progress = args.json_progress;
    let progress_bar = if json_progress {
        ProgressBar::hidden()
    } else {
        create_progress_bar(total as u64)
    };
    progress_bar.set_message("Processing images");

    let completed = AtomicUsize::new(0);

    let results = engine.process_batch(items, worker_limit, |result, percent| {
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if json_progress {
            match &result.outcome {
                Ok(output_path) => {
                    JsonMessage::file_completed(&result.item.input_path(), output_path)
                }
                Err(error) => {
                    JsonMessage::file_failed(&result.item.input_path(), format!("{error:#}"))
                }
            }
            JsonMessage::progress(done, total, percent);
        } else {
            if let Err(error) = &result.outcome {
                progress_bar.println(format!(
                    "{} {}: {:#}",
                    style("[ERROR]").red().bold(),
                    result.item.file_name,
                    error
                ));
            }
            progress_bar.inc(1);
        }
    })?;

    progress_bar.finish_with_message("Processing complete");

    // Print results summary
    let stats = ProcessingStats {
        total_files: results.len(),
        successful: results.iter().filter(|r| r.is_success()).count(),
        failed: results.iter().filter(|r| !r.is_success()).count(),
        total_duration: start_time.elapsed(),
    };

    if json_progress {
        JsonMessage::summary(
            stats.total_files,
            stats.successful,
            stats.failed,
            stats.total_duration.as_secs_f64(),
        );
        return Ok(());
    }

    println!();
    println!("{}", style("Results Summary:").bold().green());
    println!(
        "  Successfully processed: {}",
        style(stats.successful).bold().green()
    );
    if stats.failed > 0 {
        println!("  Failed: {}", style(stats.failed).bold().red());
    }
    println!("  Success rate: {:.1}%", stats.success_rate());
    println!("  Total time: {}", format_duration(stats.total_duration));
    verbose_println(
        verbose,
        &format!(
            "Average time per image: {}",
            format_duration(stats.average_duration())
        ),
    );

    if stats.failed > 0 {
        println!();
        println!("{}", style("Failed files:").bold().red());
        for result in results.iter().filter(|r| !r.is_success()) {
            if let Err(error) = &result.outcome {
                println!("  {}: {:#}", style(&result.item.file_name).yellow(), error);
            }
        }
    }

    Ok(())
}
