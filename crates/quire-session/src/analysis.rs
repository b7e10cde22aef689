//! Analysis workflow session
//!
//! Uploaded tables are edited one by one, merged into a single table, and
//! the merged table is handed to the text generator for summaries, answers
//! and chart programs. Chart programs only ever run inside the [`Sandbox`],
//! against a copy of the merged table.

use crate::config::AnalysisConfig;
use crate::download::{encode, Download};
use crate::error::{SessionError, SessionResult};
use crate::fence::extract_code;
use crate::generator::{Prompt, TextGenerator};
use crate::notice::Notice;
use crate::prompt;
use indexmap::IndexMap;
use quire_sandbox::{Bindings, Chart, Execution, Outcome, Sandbox, TABLE_NAME};
use quire_table::{Table, TableLoader, TableWriter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of the last visualization request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    pub request: String,
    /// Program that ran, or a comment line when none was generated
    pub code: String,
    pub chart: Option<Chart>,
    /// Text the program printed
    pub printed: String,
    /// Why no chart was produced
    pub error: Option<String>,
}

impl Visualization {
    fn failed(request: &str, code: String, error: String) -> Self {
        Self {
            request: request.to_string(),
            code,
            chart: None,
            printed: String::new(),
            error: Some(error),
        }
    }
}

/// Analysis workflow state
pub struct AnalysisSession {
    config: AnalysisConfig,
    sandbox: Sandbox,
    generator: Arc<dyn TextGenerator>,
    /// Edited uploads by name, in upload order
    uploads: IndexMap<String, Table>,
    merged: Option<Table>,
    summary: Option<String>,
    answer: Option<String>,
    visualization: Option<Visualization>,
}

impl AnalysisSession {
    /// Create session
    #[must_use]
    pub fn new(config: AnalysisConfig, sandbox: Sandbox, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            config,
            sandbox,
            generator,
            uploads: IndexMap::new(),
            merged: None,
            summary: None,
            answer: None,
            visualization: None,
        }
    }

    /// Uploaded tables with their edits applied, in upload order
    pub fn uploads(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.uploads.iter().map(|(name, table)| (name.as_str(), table))
    }

    /// Edited upload by name
    #[must_use]
    pub fn upload_named(&self, name: &str) -> Option<&Table> {
        self.uploads.get(name)
    }

    #[inline]
    #[must_use]
    pub fn merged(&self) -> Option<&Table> {
        self.merged.as_ref()
    }

    /// Last automatic summary
    #[inline]
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// Last answer to a free-text question
    #[inline]
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn visualization(&self) -> Option<&Visualization> {
        self.visualization.as_ref()
    }

    /// Parse a payload and add it under `name`
    pub fn upload(&mut self, name: &str, loader: &dyn TableLoader, bytes: &[u8]) -> Notice {
        match loader.parse(bytes) {
            Ok(table) => self.upload_table(name, table),
            Err(err) => {
                tracing::warn!("Upload '{}' rejected: {}", name, err);
                Notice::from(SessionError::from(err))
            }
        }
    }

    /// Add a table under `name`, replacing an earlier upload of that name
    pub fn upload_table(&mut self, name: &str, table: Table) -> Notice {
        let rows = table.len();
        let replaced = self.uploads.insert(name.to_string(), table).is_some();
        tracing::info!("Upload '{}' with {} rows", name, rows);
        if replaced {
            Notice::success(format!("Replaced '{name}' ({rows} rows)"))
        } else {
            Notice::success(format!("Added '{name}' ({rows} rows)"))
        }
    }

    /// Remove columns from one upload
    pub fn drop_columns(&mut self, name: &str, columns: &[String]) -> Notice {
        self.edit(name, |table| {
            table.drop_columns(columns)?;
            Ok(format!("Dropped {} columns from '{name}'", columns.len()))
        })
    }

    /// Remove rows (0-based) from one upload
    pub fn drop_rows(&mut self, name: &str, rows: &[usize]) -> Notice {
        self.edit(name, |table| {
            table.drop_rows(rows)?;
            Ok(format!("Dropped {} rows from '{name}'", rows.len()))
        })
    }

    fn edit<F>(&mut self, name: &str, f: F) -> Notice
    where
        F: FnOnce(&mut Table) -> SessionResult<String>,
    {
        let result = self
            .uploads
            .get_mut(name)
            .ok_or_else(|| SessionError::UnknownUpload(name.to_string()))
            .and_then(f);
        match result {
            Ok(message) => Notice::success(message),
            Err(err) => {
                tracing::warn!("Edit of '{}' failed: {}", name, err);
                err.into()
            }
        }
    }

    /// Stack all uploads into the merged table
    ///
    /// Replies derived from an earlier merge are discarded.
    pub fn merge(&mut self) -> Notice {
        if self.uploads.is_empty() {
            return SessionError::NothingToMerge.into();
        }
        let merged = Table::concat(self.uploads.values());
        tracing::info!(
            "Merged {} tables into {} rows x {} columns",
            self.uploads.len(),
            merged.len(),
            merged.columns().len()
        );
        let notice = Notice::success(format!(
            "Merged {} tables: {} rows, {} columns",
            self.uploads.len(),
            merged.len(),
            merged.columns().len()
        ));
        self.merged = Some(merged);
        self.summary = None;
        self.answer = None;
        self.visualization = None;
        notice
    }

    /// Encode the merged table for download
    ///
    /// # Errors
    /// Returns the failure as a notice before a merge or when encoding fails
    pub fn download(&self, writer: &dyn TableWriter) -> Result<Download, Notice> {
        let merged = self.merged.as_ref().ok_or_else(|| Notice::from(SessionError::NotMerged))?;
        encode(
            writer,
            merged,
            &self.config.merged_file_stem,
            &self.config.merged_sheet,
        )
        .map_err(Notice::from)
    }

    /// Ask the generator for an overview of the merged table
    pub async fn summarize(&mut self) -> Notice {
        let result = match self.merged_csv() {
            Ok(csv) => {
                self.generate(&prompt::summary(&csv, self.config.temperature))
                    .await
            }
            Err(err) => Err(err),
        };
        match result {
            Ok(reply) => {
                self.summary = Some(reply);
                Notice::success("Summary ready")
            }
            Err(err) => err.into(),
        }
    }

    /// Ask a free-text question about the merged table
    pub async fn ask(&mut self, question: &str) -> Notice {
        let result = match self.checked_request(question) {
            Ok(csv) => {
                self.generate(&prompt::question(&csv, question.trim(), self.config.temperature))
                    .await
            }
            Err(err) => Err(err),
        };
        match result {
            Ok(reply) => {
                self.answer = Some(reply);
                Notice::success("Answer ready")
            }
            Err(err) => err.into(),
        }
    }

    /// Generate a chart program for `request` and run it in the sandbox
    ///
    /// The outcome, chart or failure, replaces the previous visualization.
    pub async fn visualize(&mut self, request: &str) -> Notice {
        let csv = match self.checked_request(request) {
            Ok(csv) => csv,
            Err(err) => return err.into(),
        };
        let prompt = prompt::visualization(&csv, request.trim(), TABLE_NAME, self.config.temperature);
        let reply = match self.generate(&prompt).await {
            Ok(reply) => reply,
            Err(err) => {
                let message = err.to_string();
                self.visualization = Some(Visualization::failed(
                    request,
                    format!("# {message}"),
                    message,
                ));
                return err.into();
            }
        };

        let code = extract_code(&reply);
        let Some(merged) = self.merged.clone() else {
            return SessionError::NotMerged.into();
        };
        match self.run_program(&code, merged).await {
            Ok(execution) => {
                let (chart, error, notice) = match execution.outcome {
                    Outcome::Chart { chart, .. } => (Some(chart), None, Notice::success("Chart ready")),
                    Outcome::NoArtifact => {
                        let message = "the program ran but drew no chart".to_string();
                        let notice = Notice::warning(format!("No chart: {message}"));
                        (None, Some(message), notice)
                    }
                };
                self.visualization = Some(Visualization {
                    request: request.to_string(),
                    code,
                    chart,
                    printed: execution.printed,
                    error,
                });
                notice
            }
            Err(err) => {
                tracing::warn!("Generated program failed: {}", err);
                self.visualization = Some(Visualization::failed(request, code, err.to_string()));
                err.into()
            }
        }
    }

    /// Run `code` against its own copy of `merged` on the blocking pool
    async fn run_program(&self, code: &str, merged: Table) -> SessionResult<Execution> {
        let sandbox = self.sandbox.clone();
        let code = code.to_string();
        tokio::task::spawn_blocking(move || sandbox.execute(&code, &Bindings::standard(merged)))
            .await
            .map_err(|e| SessionError::Worker(e.to_string()))?
            .map_err(SessionError::from)
    }

    /// Forget uploads, the merged table and every reply
    pub fn reset(&mut self) -> Notice {
        self.uploads.clear();
        self.merged = None;
        self.summary = None;
        self.answer = None;
        self.visualization = None;
        tracing::info!("Analysis session reset");
        Notice::info("Session cleared")
    }

    fn merged_csv(&self) -> SessionResult<String> {
        self.merged
            .as_ref()
            .map(Table::to_csv)
            .ok_or(SessionError::NotMerged)
    }

    fn checked_request(&self, text: &str) -> SessionResult<String> {
        let csv = self.merged_csv()?;
        if text.trim().is_empty() {
            return Err(SessionError::EmptyQuestion);
        }
        Ok(csv)
    }

    async fn generate(&self, prompt: &Prompt) -> SessionResult<String> {
        tracing::info!("Requesting text generation ({} prompt bytes)", prompt.user.len());
        self.generator.complete(prompt).await.map_err(|err| {
            tracing::warn!("Text generation failed: {}", err);
            SessionError::Generation(err.to_string())
        })
    }
}

impl std::fmt::Debug for AnalysisSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisSession")
            .field("uploads", &self.uploads.keys().collect::<Vec<_>>())
            .field("merged_rows", &self.merged.as_ref().map(Table::len))
            .field("has_summary", &self.summary.is_some())
            .field("has_answer", &self.answer.is_some())
            .field("has_visualization", &self.visualization.is_some())
            .finish_non_exhaustive()
    }
}
