use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Args;
use crate::error::{ProcessError, MAX_COPY_ATTEMPTS};

/// Create a styled progress bar
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg} ({eta})",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    pb
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Validate command line arguments
pub fn validate_inputs(args: &Args) -> Result<()> {
    // Validate input paths (directories or files)
    for input_path in &args.input_paths {
        if !input_path.exists() {
            return Err(anyhow::anyhow!(
                "Input path does not exist: {}",
                input_path.display()
            ));
        }
        if !input_path.is_dir() && !input_path.is_file() {
            return Err(anyhow::anyhow!(
                "Input path is neither a file nor a directory: {}",
                input_path.display()
            ));
        }
    }

    // Validate target size
    let (width, height) = args.parse_size()?;
    if width == 0 || height == 0 {
        return Err(anyhow::anyhow!(
            "Output size must be positive, got: {}x{}",
            width,
            height
        ));
    }

    // Validate quality range
    if args.quality > 100 {
        return Err(anyhow::anyhow!(
            "Quality must be between 0 and 100, got: {}",
            args.quality
        ));
    }

    // Validate extensions
    let extensions = args.extensions();
    if extensions.is_empty() {
        return Err(anyhow::anyhow!("No valid extensions specified"));
    }

    // Validate job count
    if args.jobs > 32 {
        return Err(anyhow::anyhow!(
            "Job count too high (max 32), got: {}",
            args.jobs
        ));
    }

    // Validate fill color formats
    for color in [&args.square_fill_color, &args.opaque_fill_color] {
        if !is_valid_hex_color(color) {
            return Err(anyhow::anyhow!(
                "Invalid fill color format: '{}'. Expected hex format like #RRGGBB",
                color
            ));
        }
    }

    // Validate color limits format
    args.parse_color_limits()?;

    Ok(())
}

/// Check if a string is a valid hex RGB color
pub fn is_valid_hex_color(color: &str) -> bool {
    if !color.starts_with('#') {
        return false;
    }

    let hex_part = &color[1..];

    // Accept #RGB and #RRGGBB formats
    match hex_part.len() {
        3 | 6 => hex_part.chars().all(|c| c.is_ascii_hexdigit()),
        _ => false,
    }
}

/// Parse a hex RGB color string (#RGB or #RRGGBB) into channel bytes
pub fn parse_hex_rgb(color: &str) -> Result<[u8; 3]> {
    if !is_valid_hex_color(color) {
        return Err(anyhow::anyhow!(
            "Invalid hex color format: '{}'. Expected #RGB or #RRGGBB",
            color
        ));
    }

    let hex_part = &color[1..];
    if hex_part.len() == 3 {
        let expand = |c: char| {
            let v = c.to_digit(16).unwrap_or(0) as u8;
            v * 16 + v
        };
        let mut chars = hex_part.chars();
        Ok([
            expand(chars.next().unwrap()),
            expand(chars.next().unwrap()),
            expand(chars.next().unwrap()),
        ])
    } else {
        Ok([
            u8::from_str_radix(&hex_part[0..2], 16)?,
            u8::from_str_radix(&hex_part[2..4], 16)?,
            u8::from_str_radix(&hex_part[4..6], 16)?,
        ])
    }
}

/// Get file extension in lowercase
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Check if a file has one of the specified extensions
pub fn has_valid_extension(path: &Path, extensions: &[String]) -> bool {
    if let Some(ext) = get_file_extension(path) {
        extensions.contains(&ext)
    } else {
        false
    }
}

/// Find a vacant output path under the no-overwrite policy.
///
/// Probes `path` and, while occupied, appends a `_copy` suffix to the stem,
/// up to [`MAX_COPY_ATTEMPTS`] probes. The probe-then-write window is racy
/// across workers targeting colliding names, so vacancy is best-effort, not
/// transactional.
pub fn safe_output_path(path: &Path) -> Result<PathBuf, ProcessError> {
    let mut candidate = path.to_path_buf();

    for _ in 0..MAX_COPY_ATTEMPTS {
        if !candidate.exists() {
            return Ok(candidate);
        }

        let stem = candidate
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let extension = candidate
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        candidate = candidate.with_file_name(format!("{stem}_copy{extension}"));
    }

    Err(ProcessError::PathExhaustion { path: candidate })
}

/// Print verbose information if verbose mode is enabled
pub fn verbose_println(verbose: bool, message: &str) {
    if verbose {
        println!("{} {}", style("[VERBOSE]").dim(), message);
    }
}

/// Print warning message
#[allow(dead_code)]
pub fn warn_println(message: &str) {
    println!("{} {}", style("[WARNING]").yellow().bold(), message);
}

/// Print error message
#[allow(dead_code)]
pub fn error_println(message: &str) {
    eprintln!("{} {}", style("[ERROR]").red().bold(), message);
}

/// Batch run statistics
#[derive(Debug)]
pub struct ProcessingStats {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_duration: Duration,
}

impl ProcessingStats {
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.successful as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn average_duration(&self) -> Duration {
        if self.successful == 0 {
            Duration::new(0, 0)
        } else {
            self.total_duration / self.successful as u32
        }
    }
}
