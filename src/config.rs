//! Configuration management for the G-code cleaner.
//!
//! Handles:
//! - Command-line argument parsing
//! - Layered TOML configuration (user file, project file, explicit file)

use anyhow::{Context, Result, ensure};
use clap::Parser;
use log::debug;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::io::output_path;
use crate::parser::TokenizeOptions;
use crate::pipeline::{ArcCenterOptions, ArcConvention, ArcFitOptions, Envelope};

/// Directory under the user config dir holding `config.toml`
pub const APP_DIR: &str = "gcode-clean";
/// Project configuration file looked up next to the input file
pub const PROJECT_CONFIG_FILE: &str = ".gcode-clean.toml";

/// Command-line arguments for the G-code cleaner
#[derive(Debug, Parser)]
#[command(name = "gcode-clean")]
#[command(about = "Shrink and normalise G-code programs without changing the toolpath")]
#[command(version)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// G-code file to clean
    #[arg(short, long, help = "Input G-code file")]
    pub file: PathBuf,

    /// Where to write the cleaned program
    #[arg(
        short,
        long,
        help = "Output file (default: the input name with a .clean marker)"
    )]
    pub output: Option<PathBuf>,

    /// Explicit configuration file, applied last
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Do not echo written lines
    #[arg(short, long)]
    pub quiet: bool,

    /// Log level for the cleaner
    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Switches for the optional pipeline passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Stages {
    pub repeated_tokens: bool,
    pub single_command: bool,
    pub arc_center: bool,
    pub clip: bool,
    pub linear: bool,
    pub linear_to_arc: bool,
    pub select_tokens: bool,
    pub dedup_line: bool,
}

impl Default for Stages {
    fn default() -> Self {
        Self {
            repeated_tokens: true,
            single_command: true,
            arc_center: true,
            clip: true,
            linear: true,
            linear_to_arc: true,
            select_tokens: true,
            dedup_line: true,
        }
    }
}

/// Tolerances and switches for one cleaning run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleanConfig {
    /// Decimal places for computed values
    pub precision: u32,
    pub keep_comments: bool,
    pub strip_line_numbers: bool,

    pub linear_tolerance: Decimal,
    pub linear_passes: usize,

    pub arc_tolerance: Decimal,
    pub arc_min_segments: usize,
    pub arc_max_segments: usize,
    pub arc_max_radius: Decimal,
    pub arc_radius_tolerance: Decimal,
    pub arc_convention: ArcConvention,

    pub select_letters: Vec<char>,

    pub envelope: Envelope,
    pub truncate: bool,

    pub stages: Stages,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            precision: 4,
            keep_comments: false,
            strip_line_numbers: true,
            linear_tolerance: Decimal::new(5, 4),
            linear_passes: 3,
            arc_tolerance: Decimal::new(5, 4),
            arc_min_segments: 3,
            arc_max_segments: 64,
            arc_max_radius: Decimal::from(1000),
            arc_radius_tolerance: Decimal::new(5, 4),
            arc_convention: ArcConvention::Standard,
            select_letters: vec!['F'],
            envelope: Envelope::default(),
            truncate: false,
            stages: Stages::default(),
        }
    }
}

impl CleanConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: CleanConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.precision <= 10,
            "precision must be at most 10 decimal places, got {}",
            self.precision
        );
        for (name, value) in [
            ("linear_tolerance", self.linear_tolerance),
            ("arc_tolerance", self.arc_tolerance),
            ("arc_radius_tolerance", self.arc_radius_tolerance),
        ] {
            ensure!(!value.is_sign_negative(), "{name} must not be negative");
        }
        ensure!(
            self.arc_min_segments >= 2,
            "arc_min_segments must be at least 2"
        );
        ensure!(
            self.arc_max_segments >= self.arc_min_segments,
            "arc_max_segments ({}) is below arc_min_segments ({})",
            self.arc_max_segments,
            self.arc_min_segments
        );
        ensure!(
            self.arc_max_radius > Decimal::ZERO,
            "arc_max_radius must be positive"
        );
        for (axis, range) in [
            ('x', self.envelope.x),
            ('y', self.envelope.y),
            ('z', self.envelope.z),
        ] {
            if let Some(range) = range
                && let (Some(min), Some(max)) = (range.min, range.max)
            {
                ensure!(min <= max, "envelope.{axis}: min {min} is above max {max}");
            }
        }
        Ok(())
    }

    pub fn tokenize_options(&self) -> TokenizeOptions {
        TokenizeOptions {
            keep_comments: self.keep_comments,
            strip_line_numbers: self.strip_line_numbers,
        }
    }

    pub fn arc_center_options(&self) -> ArcCenterOptions {
        ArcCenterOptions {
            convention: self.arc_convention,
            slack: self.arc_radius_tolerance,
            precision: self.precision,
        }
    }

    pub fn arc_fit_options(&self) -> ArcFitOptions {
        ArcFitOptions {
            tolerance: self.arc_tolerance,
            min_segments: self.arc_min_segments,
            max_segments: self.arc_max_segments,
            max_radius: self.arc_max_radius,
            precision: self.precision,
        }
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub quiet: bool,
    pub log_level: String,
    pub clean: CleanConfig,
    /// Configuration files applied, in order
    pub sources: Vec<PathBuf>,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments
    pub fn from_args(args: Args) -> Result<Self> {
        Self::from_args_with(args, user_config_path())
    }

    /// Like [`Config::from_args`] with the user configuration file given
    /// explicitly (useful for testing)
    pub fn from_args_with(args: Args, user_config: Option<PathBuf>) -> Result<Self> {
        let mut clean = CleanConfig::default();
        let mut sources = Vec::new();

        let layered = [user_config, Some(project_config_path(&args.file))];
        for path in layered.into_iter().flatten() {
            if path.is_file() {
                debug!("Loading config from {}", path.display());
                clean = CleanConfig::load(&path)?;
                sources.push(path);
            }
        }

        // An explicit file must exist
        if let Some(path) = args.config {
            debug!("Loading config from {}", path.display());
            clean = CleanConfig::load(&path)?;
            sources.push(path);
        }

        let output = args.output.unwrap_or_else(|| output_path(&args.file));
        Ok(Config {
            input: args.file,
            output,
            quiet: args.quiet,
            log_level: args.log_level,
            clean,
            sources,
        })
    }

    /// Default configuration for cleaning `input` into its derived output path
    pub fn for_input(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        Config {
            output: output_path(&input),
            input,
            quiet: true,
            log_level: "info".to_string(),
            clean: CleanConfig::default(),
            sources: Vec::new(),
        }
    }
}

/// `<config_dir>/gcode-clean/config.toml`, when the platform has a config dir
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// `.gcode-clean.toml` in the directory holding `input`
pub fn project_config_path(input: &Path) -> PathBuf {
    input
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(PROJECT_CONFIG_FILE)
}
