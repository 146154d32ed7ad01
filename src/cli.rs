use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::translate::SubjectProfile;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Translation settings that override the configuration file
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct TranslateOptions {
    /// Subject profile (e.g. "Film", "tv-series", "Documentary")
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Gemini model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Neighbouring lines sent on each side of a cue (0-10)
    #[arg(long)]
    pub context_window: Option<usize>,

    /// Retry passes over failed lines
    #[arg(long)]
    pub retry_passes: Option<u32>,

    /// Write the output even when no line was translated
    #[arg(long)]
    pub allow_partial: bool,
}

impl TranslateOptions {
    /// Apply the given flags on top of `config`
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(subject) = &self.subject {
            let profile: SubjectProfile = subject.parse()?;
            config.translate.subject = profile.label().to_string();
        }
        if let Some(model) = &self.model {
            config.translate.model = model.clone();
        }
        if let Some(window) = self.context_window {
            config.translate.context_window_size = window;
        }
        if let Some(passes) = self.retry_passes {
            config.translate.max_retry_passes = passes;
        }
        if self.allow_partial {
            config.output.allow_partial = true;
        }
        config.validate()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a single SRT or VTT file into Persian
    Translate {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (default: translated_{name}_{subject}.{ext})
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: TranslateOptions,
    },

    /// Translate every subtitle file in a directory
    Batch {
        /// Input directory containing subtitle files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output directory for translated files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        options: TranslateOptions,
    },

    /// Parse a subtitle file and print its cues
    Review {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// List subject profiles and available models
    Subjects,

    /// Write a default configuration file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "config.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_translate_command() {
        let args = Args::parse_from([
            "zirnevis",
            "translate",
            "--input",
            "movie.srt",
            "--subject",
            "tv-series",
            "--context-window",
            "2",
            "-v",
        ]);
        assert!(args.verbose);

        let Commands::Translate { input, output, options } = args.command else {
            panic!("expected translate command");
        };
        assert_eq!(input, PathBuf::from("movie.srt"));
        assert!(output.is_none());

        let mut config = Config::default();
        options.apply(&mut config).unwrap();
        assert_eq!(config.translate.subject, "TV Series");
        assert_eq!(config.translate.context_window_size, 2);
        assert_eq!(config.translate.max_retry_passes, 1);
    }

    #[test]
    fn test_unknown_subject_flag_is_rejected() {
        let options = TranslateOptions {
            subject: Some("Cooking".to_string()),
            ..TranslateOptions::default()
        };
        assert!(options.apply(&mut Config::default()).is_err());
    }

    #[test]
    fn test_unknown_model_flag_is_rejected() {
        let options = TranslateOptions {
            model: Some("gpt-4".to_string()),
            ..TranslateOptions::default()
        };
        assert!(options.apply(&mut Config::default()).is_err());
    }
}
