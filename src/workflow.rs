use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{Result, ZirnevisError};
use crate::orchestrator::{
    CueOutcome, Orchestrator, PassKind, PassSummary, TranslationPass, TranslationSettings,
};
use crate::subtitle::SubtitleFormat;
use crate::translate::{SubjectProfile, Translator, TranslatorFactory};

/// Prefix of every file this tool writes
pub const OUTPUT_PREFIX: &str = "translated_";

/// Receives pass events while a file is being translated
pub trait PassObserver {
    fn pass_started(&mut self, _kind: PassKind, _total: usize) {}
    fn cue_finished(&mut self, _outcome: &CueOutcome) {}
    fn pass_finished(&mut self, _summary: &PassSummary) {}
}

/// Observer that ignores every event
pub struct SilentObserver;

impl PassObserver for SilentObserver {}

/// Result of translating one file
#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    /// Written file, `None` when the input held no cues
    pub output: Option<PathBuf>,
    pub cues: usize,
    pub translated: usize,
    pub failed: usize,
    pub notice: Option<String>,
}

pub struct Workflow {
    config: Config,
    orchestrator: Orchestrator,
}

impl Workflow {
    /// Create a workflow using the Gemini translator.
    ///
    /// Missing credentials do not fail here; the workflow can still load and
    /// review files, and translation reports the configuration error.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let translator = TranslatorFactory::create_translator(&config.translate);
        let settings = TranslationSettings::from_config(&config.translate);
        let orchestrator = Orchestrator::from_translator_result(translator, settings);

        Ok(Self { config, orchestrator })
    }

    pub fn with_translator(config: Config, translator: Box<dyn Translator>) -> Result<Self> {
        config.validate()?;
        let settings = TranslationSettings::from_config(&config.translate);
        let orchestrator = Orchestrator::with_translator(translator, settings);

        Ok(Self { config, orchestrator })
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Read and parse a subtitle file into the orchestrator, discarding any earlier session
    pub async fn load_file<P: AsRef<Path>>(&mut self, input_path: P) -> Result<usize> {
        let input_path = input_path.as_ref();

        if !input_path.exists() {
            return Err(ZirnevisError::FileNotFound(input_path.display().to_string()));
        }

        let format = SubtitleFormat::from_path(input_path)?;
        let content = fs::read_to_string(input_path).await?;
        info!("Loading {} file: {}", format, input_path.display());

        self.orchestrator.load(&content, format)
    }

    /// Translate one subtitle file and write the result next to it (or to `output_path`)
    pub async fn translate_file<P: AsRef<Path>>(
        &mut self,
        input_path: P,
        output_path: Option<&Path>,
        observer: &mut dyn PassObserver,
    ) -> Result<FileReport> {
        let input_path = input_path.as_ref();
        let cue_count = self.load_file(input_path).await?;

        if cue_count == 0 {
            info!("{} contains no cues, nothing to translate", input_path.display());
            return Ok(self.report(input_path, None));
        }

        let pass = self.orchestrator.run(0)?;
        drive_pass(pass, observer).await;

        for attempt in 1..=self.config.translate.max_retry_passes {
            let Some(pass) = self.orchestrator.retry_failed()? else {
                break;
            };
            info!("Retry pass {}/{}", attempt, self.config.translate.max_retry_passes);
            drive_pass(pass, observer).await;
        }

        let content = if self.config.output.allow_partial {
            self.orchestrator.render_partial()?
        } else {
            self.orchestrator.render()?
        };

        let output_path = match output_path {
            Some(path) => path.to_path_buf(),
            None => self.default_output_path(input_path, None)?,
        };

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&output_path, content).await?;
        info!("Translated subtitles written to {}", output_path.display());

        Ok(self.report(input_path, Some(output_path)))
    }

    /// Translate every .srt and .vtt file below a directory
    pub async fn process_directory<P: AsRef<Path>>(
        &mut self,
        input_dir: P,
        output_dir: Option<&Path>,
        observer: &mut dyn PassObserver,
    ) -> Result<Vec<FileReport>> {
        let input_dir = input_dir.as_ref();
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(ZirnevisError::Config("Input path is not a directory".to_string()));
        }

        let mut subtitle_files = Vec::new();
        for entry in WalkDir::new(input_dir).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            let already_translated = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(OUTPUT_PREFIX));

            if entry.file_type().is_file() && !already_translated && SubtitleFormat::from_path(path).is_ok() {
                subtitle_files.push(path.to_path_buf());
            }
        }
        subtitle_files.sort();

        info!("Found {} subtitle files to translate", subtitle_files.len());

        let mut reports = Vec::new();
        for subtitle_path in subtitle_files {
            let output_path = match output_dir {
                Some(dir) => Some(self.default_output_path(&subtitle_path, Some(dir))?),
                None => None,
            };

            match self.translate_file(&subtitle_path, output_path.as_deref(), observer).await {
                Ok(report) => {
                    info!("Successfully processed: {}", subtitle_path.display());
                    reports.push(report);
                }
                Err(e) => warn!("Failed to process {}: {}", subtitle_path.display(), e),
            }
        }

        Ok(reports)
    }

    /// Output location: explicit directory, configured directory, or the input's own
    pub fn default_output_path(&self, input_path: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
        let format = SubtitleFormat::from_path(input_path)?;
        let directory = match output_dir.or(self.config.output.directory.as_deref()) {
            Some(dir) => dir.to_path_buf(),
            None => input_path
                .parent()
                .ok_or_else(|| ZirnevisError::Config("Cannot determine output directory".to_string()))?
                .to_path_buf(),
        };

        let file_name = input_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ZirnevisError::Config("Invalid subtitle filename".to_string()))?;

        Ok(directory.join(output_file_name(file_name, self.orchestrator.settings().subject, format)))
    }

    fn report(&self, input_path: &Path, output: Option<PathBuf>) -> FileReport {
        FileReport {
            input: input_path.to_path_buf(),
            output,
            cues: self.orchestrator.cues().len(),
            translated: self.orchestrator.translated_count(),
            failed: self.orchestrator.failed_count(),
            notice: self.orchestrator.notice(),
        }
    }
}

/// `translated_{base}_{subject-slug}.{ext}`, where `base` drops the last extension
pub fn output_file_name(input_name: &str, subject: SubjectProfile, format: SubtitleFormat) -> String {
    let base = match input_name.rfind('.') {
        Some(dot) => &input_name[..dot],
        None => input_name,
    };
    format!("{}{}_{}.{}", OUTPUT_PREFIX, base, subject.slug(), format.extension())
}

async fn drive_pass(mut pass: TranslationPass<'_>, observer: &mut dyn PassObserver) -> PassSummary {
    observer.pass_started(pass.kind(), pass.len());
    while let Some(outcome) = pass.next().await {
        observer.cue_finished(&outcome);
    }
    let summary = pass.finish().await;
    observer.pass_finished(&summary);
    summary
}
