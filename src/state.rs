use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::binom::{self, AnalysisInput, Distribution};
use crate::chart_export::{self, ExportFormat};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::inputs::{Nudge, Param, ParamInput};

pub const DEFAULT_XG: f64 = 5.0;
pub const DEFAULT_SHOTS: f64 = 20.0;
pub const DEFAULT_GOALS: f64 = 3.0;
pub const DEFAULT_EXPORT_FILENAME: &str = "chart.png";

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Xg,
    Shots,
    Goals,
    Player,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Xg => Focus::Shots,
            Focus::Shots => Focus::Goals,
            Focus::Goals => Focus::Player,
            Focus::Player => Focus::Xg,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::Xg => Focus::Player,
            Focus::Shots => Focus::Xg,
            Focus::Goals => Focus::Shots,
            Focus::Player => Focus::Goals,
        }
    }

    pub fn param(self) -> Option<Param> {
        match self {
            Focus::Xg => Some(Param::Xg),
            Focus::Shots => Some(Param::Shots),
            Focus::Goals => Some(Param::Goals),
            Focus::Player => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Modal message; blocks other input until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub body: String,
}

impl Notice {
    pub fn info(title: &str, body: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            title: title.to_string(),
            body: body.into(),
        }
    }

    pub fn error(title: &str, body: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: title.to_string(),
            body: body.into(),
        }
    }
}

/// Last successful analysis, kept for the chart panel and for export.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartState {
    pub distribution: Distribution,
    pub title: String,
    pub player_label: String,
    pub observed_goals: u32,
}

impl ChartState {
    pub fn new(input: &AnalysisInput, distribution: Distribution) -> Self {
        let title = binom::format_title(
            &input.player_label,
            input.observed_goals,
            distribution.prob_at_least_observed,
        );
        Self {
            distribution,
            title,
            player_label: input.player_label.clone(),
            observed_goals: input.observed_goals,
        }
    }

    /// `(goals, probability)` for every charted bar.
    pub fn bars(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.distribution
            .support()
            .zip(self.distribution.pmf.iter().copied())
    }

    /// The observed-goals bar, when it falls inside the charted support.
    pub fn highlighted_index(&self) -> Option<usize> {
        (self.observed_goals <= self.distribution.max_goals).then_some(self.observed_goals as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDialog {
    pub filename: String,
    pub format: ExportFormat,
}

impl Default for ExportDialog {
    fn default() -> Self {
        Self {
            filename: DEFAULT_EXPORT_FILENAME.to_string(),
            format: ExportFormat::Png,
        }
    }
}

impl ExportDialog {
    /// Switches format; a filename still carrying the old extension follows along.
    pub fn cycle_format(&mut self) {
        let next = self.format.next();
        let old_suffix = format!(".{}", self.format.extension());
        if let Some(stem) = self.filename.strip_suffix(&old_suffix) {
            self.filename = format!("{stem}.{}", next.extension());
        }
        self.format = next;
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub xg: ParamInput,
    pub shots: ParamInput,
    pub goals: ParamInput,
    pub player_label: String,
    pub focus: Focus,
    pub theme: Theme,
    pub chart: Option<ChartState>,
    pub export_dialog: Option<ExportDialog>,
    pub export_dir: PathBuf,
    pub notice: Option<Notice>,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let mut state = Self {
            xg: ParamInput::new(Param::Xg, DEFAULT_XG),
            shots: ParamInput::new(Param::Shots, DEFAULT_SHOTS),
            goals: ParamInput::new(Param::Goals, DEFAULT_GOALS),
            player_label: binom::DEFAULT_PLAYER_LABEL.to_string(),
            focus: Focus::Xg,
            theme: config.theme,
            chart: None,
            export_dialog: None,
            export_dir: config.export_dir.clone(),
            notice: None,
            help_overlay: false,
            logs: VecDeque::with_capacity(MAX_LOGS),
        };
        for warning in &config.warnings {
            state.push_log(warning.clone());
        }
        state.push_log(format!(
            "[INFO] Ready ({} theme, exports to {})",
            state.theme.label(),
            state.export_dir.display()
        ));
        state
    }

    pub fn input(&self, param: Param) -> &ParamInput {
        match param {
            Param::Xg => &self.xg,
            Param::Shots => &self.shots,
            Param::Goals => &self.goals,
        }
    }

    pub fn input_mut(&mut self, param: Param) -> &mut ParamInput {
        match param {
            Param::Xg => &mut self.xg,
            Param::Shots => &mut self.shots,
            Param::Goals => &mut self.goals,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let stamped = format!("{} {}", Local::now().format("%H:%M:%S"), msg.into());
        self.logs.push_back(stamped);
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn focus_next(&mut self) {
        self.commit_focused();
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.commit_focused();
        self.focus = self.focus.prev();
    }

    /// Focus-loss sync for the focused row. A parse failure is dropped on purpose.
    pub fn commit_focused(&mut self) {
        if let Some(param) = self.focus.param() {
            let _ = self.input_mut(param).on_field_commit();
        }
    }

    pub fn nudge_focused(&mut self, direction: Nudge) {
        if let Some(param) = self.focus.param() {
            self.input_mut(param).nudge(direction);
        }
    }

    pub fn type_char(&mut self, c: char) {
        match self.focus.param() {
            Some(param) => self.input_mut(param).push_char(c),
            None => self.player_label.push(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.focus.param() {
            Some(param) => self.input_mut(param).pop_char(),
            None => {
                self.player_label.pop();
            }
        }
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        self.push_log(format!("[INFO] Theme: {}", self.theme.label()));
    }

    pub fn toggle_help(&mut self) {
        self.help_overlay = !self.help_overlay;
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Reads the three field texts as they stand; the sliders are not consulted.
    pub fn analysis_input(&self) -> Result<AnalysisInput, AppError> {
        let xg = self
            .xg
            .field()
            .trim()
            .parse::<f64>()
            .map_err(|_| AppError::Validation("xG total is not a number"))?;
        let shots = parse_count(self.shots.field())?;
        let goals = parse_count(self.goals.field())?;
        Ok(AnalysisInput::new(xg, shots, goals, &self.player_label))
    }

    /// Replaces the chart on success. On failure the previous chart stays up.
    pub fn analyze(&mut self) -> Result<(), AppError> {
        self.commit_focused();
        let outcome = self.analysis_input().and_then(|input| {
            let distribution = binom::compute_distribution(&input)?;
            Ok(ChartState::new(&input, distribution))
        });

        match outcome {
            Ok(chart) => {
                self.push_log(format!(
                    "[INFO] {}: p={:.3} P(≥{})={:.2}%",
                    chart.player_label,
                    chart.distribution.scoring_probability,
                    chart.observed_goals,
                    chart.distribution.prob_at_least_observed * 100.0
                ));
                self.chart = Some(chart);
                Ok(())
            }
            Err(err) => {
                self.push_log(format!("[WARN] Analyze rejected: {err}"));
                self.notice = Some(Notice::error("Error", err.user_message()));
                Err(err)
            }
        }
    }

    pub fn open_export(&mut self) -> Result<(), AppError> {
        if self.chart.is_none() {
            self.push_log("[INFO] Export skipped: nothing analyzed yet");
            self.notice = Some(Notice::info("Oops", AppError::Precondition.user_message()));
            return Err(AppError::Precondition);
        }
        self.export_dialog = Some(ExportDialog::default());
        Ok(())
    }

    pub fn cancel_export(&mut self) {
        if self.export_dialog.take().is_some() {
            self.push_log("[INFO] Export cancelled");
        }
    }

    pub fn confirm_export(&mut self) -> anyhow::Result<Option<PathBuf>> {
        self.confirm_export_with(chart_export::export_chart)
    }

    /// Resolves the dialog to a path and hands the chart to `export`.
    /// Returns `Ok(None)` when no dialog is open. A failed write keeps the dialog open.
    pub fn confirm_export_with(
        &mut self,
        export: impl FnOnce(&ChartState, &Path, ExportFormat) -> anyhow::Result<()>,
    ) -> anyhow::Result<Option<PathBuf>> {
        let Some(dialog) = self.export_dialog.take() else {
            return Ok(None);
        };
        let Some(chart) = self.chart.as_ref() else {
            self.notice = Some(Notice::info("Oops", AppError::Precondition.user_message()));
            return Err(AppError::Precondition.into());
        };

        let path =
            chart_export::resolve_export_path(&self.export_dir, &dialog.filename, dialog.format);
        match export(chart, &path, dialog.format) {
            Ok(()) => {
                self.push_log(format!(
                    "[INFO] Exported {} to {}",
                    dialog.format.label(),
                    path.display()
                ));
                self.notice = Some(Notice::info("Saved", format!("Saved to {}", path.display())));
                Ok(Some(path))
            }
            Err(err) => {
                self.push_log(format!("[ERROR] Export failed: {err:#}"));
                self.notice = Some(Notice::error("Export failed", format!("{err:#}")));
                self.export_dialog = Some(dialog);
                Err(err)
            }
        }
    }
}

fn parse_count(raw: &str) -> Result<u32, AppError> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation("counts must be whole numbers"))?;
    if value < 0 {
        return Err(AppError::Validation("counts cannot be negative"));
    }
    u32::try_from(value).map_err(|_| AppError::Validation("count is too large"))
}
