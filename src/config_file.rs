use crate::cli::Args;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::image_processing::classify::ColorLimits;

/// JSON settings snapshot supplied by an external configurator.
///
/// The core never writes this file; it is consumed read-only at batch start
/// and merged under explicit command-line flags.
#[derive(Debug, Deserialize, Serialize)]
pub struct ConfigFile {
    pub input_directory: Option<String>,
    pub output_directory: Option<String>,
    pub output_image_settings: Option<OutputImageSettingsJson>,
    pub input_formats: Option<Vec<String>>,
    pub advanced_settings: Option<AdvancedSettingsJson>,
    pub worker_limit: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct OutputImageSettingsJson {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
    pub color_limits: Option<ColorLimits>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AdvancedSettingsJson {
    pub crop: Option<bool>,
    pub square: Option<bool>,
    pub fit: Option<bool>,
    pub square_fill_color: Option<RgbJson>,
    pub opaque_fill_color: Option<RgbJson>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RgbJson {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl RgbJson {
    fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl Args {
    /// Load the configuration snapshot and merge it with command-line
    /// arguments. Command-line arguments take precedence over file values.
    pub fn load_and_merge_config(&mut self) -> Result<()> {
        if let Some(config_path) = self.config_file.clone() {
            let contents = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: ConfigFile = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            let cli_args: Vec<String> = std::env::args().collect();
            self.merge_from_config(config, &cli_args);

            if self.verbose {
                eprintln!("Loaded configuration from: {:?}", config_path);
            }
        }
        Ok(())
    }

    /// Merge snapshot values for every argument not explicitly provided on
    /// the command line.
    fn merge_from_config(&mut self, config: ConfigFile, cli_args: &[String]) {
        let provided = |short: &str, long: &str| {
            cli_args
                .iter()
                .any(|a| (!short.is_empty() && a == short) || a == long)
        };

        if !provided("-i", "--input") {
            if let Some(input) = config.input_directory {
                self.input_paths = vec![PathBuf::from(input)];
            }
        }

        if !provided("-o", "--output") {
            if let Some(output) = config.output_directory {
                self.output_dir = PathBuf::from(output);
            }
        }

        if let Some(settings) = config.output_image_settings {
            if !provided("-s", "--size") {
                if let (Some(width), Some(height)) = (settings.width, settings.height) {
                    self.size = format!("{}x{}", width, height);
                }
            }
            if !provided("-q", "--quality") {
                if let Some(quality) = settings.quality {
                    self.quality = quality;
                }
            }
            if !provided("", "--color-limits") {
                if let Some(ColorLimits {
                    red_max,
                    green_max,
                    blue_max,
                    alpha_max,
                }) = settings.color_limits
                {
                    self.color_limits_str =
                        format!("{},{},{},{}", red_max, green_max, blue_max, alpha_max);
                }
            }
        }

        if !provided("", "--extensions") {
            if let Some(formats) = config.input_formats {
                self.extensions_str = formats.join(",");
            }
        }

        if let Some(advanced) = config.advanced_settings {
            // The snapshot stores enable-flags; the CLI exposes disable-flags.
            if !provided("", "--no-crop") {
                if let Some(crop) = advanced.crop {
                    self.no_crop = !crop;
                }
            }
            if !provided("", "--no-square") {
                if let Some(square) = advanced.square {
                    self.no_square = !square;
                }
            }
            if !provided("", "--no-fit") {
                if let Some(fit) = advanced.fit {
                    self.no_fit = !fit;
                }
            }
            if !provided("", "--square-fill-color") {
                if let Some(color) = advanced.square_fill_color {
                    self.square_fill_color = color.to_hex();
                }
            }
            if !provided("", "--opaque-fill-color") {
                if let Some(color) = advanced.opaque_fill_color {
                    self.opaque_fill_color = color.to_hex();
                }
            }
        }

        if !provided("-j", "--jobs") {
            if let Some(worker_limit) = config.worker_limit {
                self.jobs = worker_limit;
            }
        }
    }
}
