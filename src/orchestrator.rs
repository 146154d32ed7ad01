//! Resumable, failure-tolerant translation driver.
//!
//! The [`Orchestrator`] owns one loaded subtitle file and its index-aligned
//! translation state. Every pass over the cues is a [`TranslationPass`] that
//! yields one [`CueOutcome`] per target index, so a caller can redraw progress
//! after each request while the pass is still running.

use tracing::{debug, info, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, ZirnevisError};
use crate::subtitle::{parse_document, Cue, SubtitleFormat, Translation};
use crate::translate::{SubjectProfile, TranslationRequest, Translator, MAX_CONTEXT_WINDOW};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    Idle,
    Parsing,
    Translating,
    Done,
    Error,
}

/// Per-run translation choices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSettings {
    pub subject: SubjectProfile,
    pub model: String,
    /// Neighbouring lines on each side, at most [`MAX_CONTEXT_WINDOW`]
    pub context_window: usize,
}

impl TranslationSettings {
    pub fn new(subject: SubjectProfile, model: impl Into<String>, context_window: usize) -> Self {
        Self {
            subject,
            model: model.into(),
            context_window: context_window.min(MAX_CONTEXT_WINDOW),
        }
    }

    pub fn from_config(config: &TranslateConfig) -> Self {
        Self::new(config.subject_profile(), config.model.clone(), config.context_window())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Fresh or resumed pass over `start_index..len`
    Run,
    /// Pass over pending and failed cues only
    RetryFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CueStatus {
    Translated(String),
    /// Gateway error message
    Failed(String),
    /// Kept from an earlier pass without calling the gateway
    AlreadyTranslated,
}

/// What happened to one cue during a pass
#[derive(Debug, Clone, PartialEq)]
pub struct CueOutcome {
    pub index: usize,
    pub id: i64,
    pub status: CueStatus,
    /// Progress of the pass after this cue, 0-100
    pub progress: f64,
}

/// Counts for a finished pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub kind: PassKind,
    pub targeted: usize,
    pub translated: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Cues holding the failure marker after the pass
    pub remaining_failed: usize,
    /// Cues never attempted after the pass
    pub remaining_pending: usize,
}

impl PassSummary {
    fn new(kind: PassKind, targeted: usize) -> Self {
        Self {
            kind,
            targeted,
            translated: 0,
            failed: 0,
            skipped: 0,
            remaining_failed: 0,
            remaining_pending: 0,
        }
    }
}

pub struct Orchestrator {
    translator: Option<Box<dyn Translator>>,
    configuration_error: Option<String>,
    settings: TranslationSettings,
    format: Option<SubtitleFormat>,
    cues: Vec<Cue>,
    translations: Vec<Translation>,
    state: ProcessingState,
    progress: f64,
    last_processed: Option<usize>,
    notice: Vec<String>,
}

impl Orchestrator {
    pub fn with_translator(translator: Box<dyn Translator>, settings: TranslationSettings) -> Self {
        Self::build(Some(translator), None, settings)
    }

    /// An orchestrator that can load and review files but never translate
    pub fn unconfigured(reason: impl Into<String>, settings: TranslationSettings) -> Self {
        let reason = reason.into();
        let mut orchestrator = Self::build(None, Some(reason.clone()), settings);
        orchestrator.state = ProcessingState::Error;
        orchestrator.notice.push(reason);
        orchestrator
    }

    /// Wrap the outcome of translator construction
    pub fn from_translator_result(
        translator: Result<Box<dyn Translator>>,
        settings: TranslationSettings,
    ) -> Self {
        match translator {
            Ok(translator) => Self::with_translator(translator, settings),
            Err(e) => {
                warn!("Translation disabled: {}", e);
                Self::unconfigured(e.to_string(), settings)
            }
        }
    }

    fn build(
        translator: Option<Box<dyn Translator>>,
        configuration_error: Option<String>,
        settings: TranslationSettings,
    ) -> Self {
        Self {
            translator,
            configuration_error,
            settings,
            format: None,
            cues: Vec::new(),
            translations: Vec::new(),
            state: ProcessingState::Idle,
            progress: 0.0,
            last_processed: None,
            notice: Vec::new(),
        }
    }

    pub fn state(&self) -> ProcessingState {
        self.state
    }

    pub fn settings(&self) -> &TranslationSettings {
        &self.settings
    }

    /// Change subject, model or window for the next pass
    pub fn set_settings(&mut self, settings: TranslationSettings) {
        self.settings = TranslationSettings::new(settings.subject, settings.model, settings.context_window);
    }

    pub fn format(&self) -> Option<SubtitleFormat> {
        self.format
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn translations(&self) -> &[Translation] {
        &self.translations
    }

    /// Cues paired with their current translation state
    pub fn entries(&self) -> impl Iterator<Item = (&Cue, &Translation)> {
        self.cues.iter().zip(self.translations.iter())
    }

    /// Progress of the current or last pass, 0-100
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Index of the last cue handled by a run pass, the resume checkpoint
    pub fn last_processed_index(&self) -> Option<usize> {
        self.last_processed
    }

    /// User-facing notice lines joined with newlines
    pub fn notice(&self) -> Option<String> {
        (!self.notice.is_empty()).then(|| self.notice.join("\n"))
    }

    pub fn configuration_error(&self) -> Option<&str> {
        self.configuration_error.as_deref()
    }

    pub fn translated_count(&self) -> usize {
        self.translations.iter().filter(|t| t.is_translated()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.translations.iter().filter(|t| t.is_failed()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.translations
            .iter()
            .filter(|t| matches!(t, Translation::Pending))
            .count()
    }

    pub fn can_translate(&self) -> bool {
        self.translator.is_some() && !self.cues.is_empty()
    }

    /// Whether `resume` would continue an earlier, unfinished run
    pub fn can_resume(&self) -> bool {
        match self.last_processed {
            Some(last) => self.translations[last + 1..]
                .iter()
                .any(Translation::needs_translation),
            None => false,
        }
    }

    /// Drop the loaded file and all translation state
    pub fn reset(&mut self) {
        self.format = None;
        self.cues.clear();
        self.translations.clear();
        self.progress = 0.0;
        self.last_processed = None;
        self.notice.clear();
        self.state = ProcessingState::Idle;
    }

    /// Replace the session with a newly parsed file.
    ///
    /// Translation state is always discarded, even when the new file has the
    /// same number of cues.
    pub fn load(&mut self, content: &str, format: SubtitleFormat) -> Result<usize> {
        self.reset();
        self.state = ProcessingState::Parsing;

        match parse_document(content, format) {
            Ok(cues) => {
                info!("Loaded {} {} cues", cues.len(), format);
                self.translations = vec![Translation::Pending; cues.len()];
                self.cues = cues;
                self.format = Some(format);
                self.state = ProcessingState::Idle;
                Ok(self.cues.len())
            }
            Err(e) => {
                warn!("Failed to load subtitles: {}", e);
                self.notice.push(e.to_string());
                self.state = ProcessingState::Error;
                Err(e)
            }
        }
    }

    /// Build the gateway request for the cue at `index`
    pub fn build_request(&self, index: usize) -> Option<TranslationRequest> {
        let cue = self.cues.get(index)?;
        let window = self.settings.context_window;
        let first = index.saturating_sub(window);
        let last = (index + 1 + window).min(self.cues.len());

        Some(TranslationRequest {
            main_text: cue.text.clone(),
            preceding_lines: self.cues[first..index].iter().map(|c| c.text.clone()).collect(),
            following_lines: self.cues[index + 1..last].iter().map(|c| c.text.clone()).collect(),
            subject: self.settings.subject,
            model: self.settings.model.clone(),
            context_window_size: window,
        })
    }

    /// Start a pass over `start_index..len`.
    ///
    /// Starting at 0 (or after the translation state lost alignment) clears all
    /// earlier results; any other start keeps them and skips translated cues.
    pub fn run(&mut self, start_index: usize) -> Result<TranslationPass<'_>> {
        self.ensure_can_translate()?;

        if start_index == 0 || self.translations.len() != self.cues.len() {
            self.translations = vec![Translation::Pending; self.cues.len()];
            self.last_processed = None;
            self.progress = 0.0;
        }

        let targets: Vec<usize> = (start_index..self.cues.len()).collect();
        info!(
            "Starting translation of {} lines from line index {} ({}, model {}, context {})",
            targets.len(),
            start_index,
            self.settings.subject,
            self.settings.model,
            self.settings.context_window
        );

        self.notice.clear();
        self.state = ProcessingState::Translating;
        Ok(TranslationPass::new(self, PassKind::Run, targets))
    }

    /// Continue after the last processed cue, or start over if none was
    pub fn resume(&mut self) -> Result<TranslationPass<'_>> {
        let start_index = self.last_processed.map_or(0, |last| last + 1);
        self.run(start_index)
    }

    /// Start a pass over every pending or failed cue.
    ///
    /// Returns `Ok(None)` without touching any state when nothing needs a retry.
    pub fn retry_failed(&mut self) -> Result<Option<TranslationPass<'_>>> {
        let targets: Vec<usize> = self
            .translations
            .iter()
            .enumerate()
            .filter(|(_, translation)| translation.needs_translation())
            .map(|(index, _)| index)
            .collect();

        if targets.is_empty() {
            info!("No failed translations to retry");
            return Ok(None);
        }

        self.ensure_can_translate()?;

        info!(
            "Retrying {} lines ({} failed, {} never attempted)",
            targets.len(),
            self.failed_count(),
            self.pending_count()
        );

        self.notice.clear();
        self.progress = 0.0;
        self.state = ProcessingState::Translating;
        Ok(Some(TranslationPass::new(self, PassKind::RetryFailed, targets)))
    }

    /// Render the translated file, only once a pass is done and produced something
    pub fn render(&self) -> Result<String> {
        if self.state != ProcessingState::Done || self.translated_count() == 0 {
            return Err(ZirnevisError::NothingToTranslate(
                "no translated lines are available yet".to_string(),
            ));
        }
        self.render_partial()
    }

    /// Render whatever is available, falling back to original text
    pub fn render_partial(&self) -> Result<String> {
        let format = self.format.ok_or_else(|| {
            ZirnevisError::NothingToTranslate("no subtitle file is loaded".to_string())
        })?;
        Ok(format.format(&self.cues, &self.translations))
    }

    fn ensure_can_translate(&mut self) -> Result<()> {
        if let Some(reason) = &self.configuration_error {
            let err = ZirnevisError::Config(reason.clone());
            self.state = ProcessingState::Error;
            return Err(err);
        }

        if self.cues.is_empty() {
            self.notice.push("No subtitles to translate.".to_string());
            self.state = ProcessingState::Error;
            return Err(ZirnevisError::NothingToTranslate("no subtitles are loaded".to_string()));
        }

        Ok(())
    }
}

/// One in-progress pass; drive it with [`TranslationPass::next`].
///
/// The orchestrator reaches [`ProcessingState::Done`] only when every target
/// has been handled. A pass dropped early leaves it in `Translating`, with the
/// checkpoint pointing at the last handled cue.
pub struct TranslationPass<'a> {
    orchestrator: &'a mut Orchestrator,
    kind: PassKind,
    targets: Vec<usize>,
    position: usize,
    summary: PassSummary,
    finished: bool,
}

impl<'a> TranslationPass<'a> {
    fn new(orchestrator: &'a mut Orchestrator, kind: PassKind, targets: Vec<usize>) -> Self {
        let summary = PassSummary::new(kind, targets.len());
        Self {
            orchestrator,
            kind,
            targets,
            position: 0,
            summary,
            finished: false,
        }
    }

    pub fn kind(&self) -> PassKind {
        self.kind
    }

    /// Number of cue indices this pass will visit
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Handle the next target cue, or finish the pass and return `None`
    pub async fn next(&mut self) -> Option<CueOutcome> {
        let Some(&index) = self.targets.get(self.position) else {
            self.complete();
            return None;
        };
        self.position += 1;

        let orchestrator = &mut *self.orchestrator;
        let total = orchestrator.cues.len();
        let id = orchestrator.cues[index].id;

        let status = if self.kind == PassKind::Run && orchestrator.translations[index].is_translated() {
            debug!("Line {} already translated, skipping", id);
            self.summary.skipped += 1;
            CueStatus::AlreadyTranslated
        } else {
            let request = orchestrator.build_request(index)?;
            info!("┌─ Translating line {} ({}/{}) ────────", id, self.position, self.targets.len());
            info!("│ Source: {}", request.main_text);

            let result = match orchestrator.translator.as_deref() {
                Some(translator) => translator.translate(&request).await,
                None => Err(ZirnevisError::Config("translator is not configured".to_string())),
            };

            match result {
                Ok(translation) => {
                    info!("│ Target: {}", translation);
                    info!("└─────────────────────────────────────");
                    orchestrator.translations[index] = Translation::Translated(translation.clone());
                    self.summary.translated += 1;
                    CueStatus::Translated(translation)
                }
                Err(e) => {
                    warn!("│ Failed: {}", e);
                    warn!("└─────────────────────────────────────");
                    orchestrator.translations[index] = Translation::Failed;
                    orchestrator.notice.push(format!("Error translating line {}.", id));
                    self.summary.failed += 1;
                    CueStatus::Failed(e.to_string())
                }
            }
        };

        orchestrator.progress = match self.kind {
            PassKind::Run => {
                orchestrator.last_processed = Some(index);
                (index + 1) as f64 / total as f64 * 100.0
            }
            PassKind::RetryFailed => self.position as f64 / self.targets.len() as f64 * 100.0,
        };

        Some(CueOutcome {
            index,
            id,
            status,
            progress: orchestrator.progress,
        })
    }

    /// Drive the pass to the end and report what it did
    pub async fn finish(mut self) -> PassSummary {
        while self.next().await.is_some() {}
        self.summary
    }

    fn complete(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let orchestrator = &mut *self.orchestrator;
        orchestrator.state = ProcessingState::Done;

        let failed = orchestrator.failed_count();
        self.summary.remaining_failed = failed;
        self.summary.remaining_pending = orchestrator.pending_count();

        match self.kind {
            PassKind::Run if failed > 0 => {
                orchestrator.notice.push(format!(
                    "{} line(s) failed to translate. You can retry failed translations.",
                    failed
                ));
            }
            PassKind::Run => {}
            PassKind::RetryFailed if failed > 0 => {
                orchestrator.notice.push(format!(
                    "{} line(s) still failed to translate after retry.",
                    failed
                ));
            }
            PassKind::RetryFailed => orchestrator.notice.clear(),
        }

        info!(
            "Pass finished: {} translated, {} failed, {} skipped ({} failures remaining)",
            self.summary.translated, self.summary.failed, self.summary.skipped, failed
        );
    }
}
