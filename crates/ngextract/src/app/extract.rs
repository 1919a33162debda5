//! The extraction pipeline: validate, derive names, synthesize, and rewire.
//!
//! [`Extractor::plan`] is pure and performs every validation up front, so a cancelled or
//! invalid request never reaches the host. [`Extractor::apply`] then drives the host's
//! primitives in order: create the file, swap the selection for the reference tag, and
//! finally replace the enclosing buffer with its rewired text.

use std::path::PathBuf;

use serde::Serialize;

use crate::app::naming::{self, NamingOptions};
use crate::app::rewrite::{self, RewriteOutcome};
use crate::app::scanner::BlockScan;
use crate::app::synthesize::{SynthesizeOptions, Synthesizer};
use crate::domain::errors::ExtractError;
use crate::domain::model::{ComponentNames, Identifier, SelectionSpan, SynthesizedFile, TextEdit};
use crate::infra::config::Config;
use crate::infra::host::{Host, Notification};

/// Knobs for one extraction, usually built from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    pub naming: NamingOptions,
    pub synthesize: SynthesizeOptions,
    /// Import the new component into the enclosing declaration.
    pub rewire_enclosing: bool,
    pub block_scan: BlockScan,
    /// Keep the prepended import line even when no declaration block was found.
    pub keep_import_without_block: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            naming: NamingOptions::default(),
            synthesize: SynthesizeOptions::default(),
            rewire_enclosing: true,
            block_scan: BlockScan::default(),
            keep_import_without_block: true,
        }
    }
}

impl ExtractOptions {
    /// Build options from configuration defaults.
    pub fn from_config(config: &Config) -> Self {
        Self {
            naming: NamingOptions {
                suffix: config.naming.suffix(),
                policy: config.naming.suffix_policy(),
                selector_prefix: config.naming.selector_prefix(),
                file_suffix: config.naming.file_suffix(),
                tag_style: config.naming.tag_style(),
            },
            synthesize: SynthesizeOptions {
                import_source: config.template.import_source(),
                template: config.template.name(),
                file_extension: config.template.file_extension(),
            },
            rewire_enclosing: config.rewrite.enabled(),
            block_scan: config.rewrite.block_scan(),
            keep_import_without_block: config.rewrite.keep_import_without_block(),
        }
    }
}

/// Everything the host supplied for one invocation.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    /// Location of the buffer; the new file is created next to it.
    pub enclosing_path: PathBuf,
    pub buffer: String,
    pub selection: Option<SelectionSpan>,
    /// Answer to the name prompt, `None` when dismissed.
    pub identifier: Option<String>,
}

/// Fully computed extraction, ready to be applied or shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionPlan {
    pub names: ComponentNames,
    pub module_path: String,
    pub file: SynthesizedFile,
    pub selection_edit: TextEdit,
    pub rewire: Option<RewirePlan>,
}

/// Rewrite of the enclosing buffer, computed against the buffer after the selection edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewirePlan {
    pub outcome: RewriteOutcome,
    pub keep_import_without_block: bool,
}

impl RewirePlan {
    /// Text that should replace the whole buffer, if any.
    pub fn replacement(&self) -> Option<&str> {
        match &self.outcome {
            RewriteOutcome::Rewritten { source, .. } => Some(source),
            RewriteOutcome::BlockNotFound { source_with_import } => self
                .keep_import_without_block
                .then_some(source_with_import.as_str()),
        }
    }
}

/// What happened to the enclosing declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewireStatus {
    Disabled,
    Rewired,
    /// The new component exists and is referenced but not imported.
    BlockNotFound { import_kept: bool },
}

/// Outcome of a successful (possibly partial) extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    pub names: ComponentNames,
    pub created: PathBuf,
    pub rewire: RewireStatus,
}

impl ExtractionReport {
    /// `true` when some requested step was skipped.
    pub fn is_partial(&self) -> bool {
        matches!(self.rewire, RewireStatus::BlockNotFound { .. })
    }
}

/// Runs extractions with a fixed set of options.
pub struct Extractor {
    options: ExtractOptions,
    synthesizer: Synthesizer,
}

impl Extractor {
    pub fn new(options: ExtractOptions) -> Result<Self, ExtractError> {
        Ok(Self {
            options,
            synthesizer: Synthesizer::new()?,
        })
    }

    /// Check that `selection` is present, non-empty, and matches `buffer`.
    pub fn validate_selection<'a>(
        buffer: &str,
        selection: Option<&'a SelectionSpan>,
    ) -> Result<&'a SelectionSpan, ExtractError> {
        let selection = selection
            .filter(|span| !span.text.is_empty())
            .ok_or(ExtractError::NoSelection)?;
        selection.validate_against(buffer)?;
        Ok(selection)
    }

    /// Compute every artifact of the extraction without side effects.
    pub fn plan(&self, request: &ExtractRequest) -> Result<ExtractionPlan, ExtractError> {
        let selection = Self::validate_selection(&request.buffer, request.selection.as_ref())?;
        let identifier = Identifier::parse(request.identifier.as_deref().unwrap_or_default())?;

        let names = naming::derive(&identifier, &self.options.naming);
        let module_path = naming::module_path(&names);
        tracing::debug!(
            identifier = %identifier,
            symbolic_name = %names.symbolic_name,
            selector = %names.selector,
            suffix_policy = self.options.naming.policy.as_str(),
            tag_style = self.options.naming.tag_style.as_str(),
            "derived component names"
        );

        let file = self.synthesizer.synthesize_file(
            &names,
            &selection.text,
            &request.enclosing_path,
            &self.options.synthesize,
        )?;

        let selection_edit = TextEdit {
            range: selection.range,
            replacement: names.reference_tag.clone(),
        };

        let rewire = self.options.rewire_enclosing.then(|| {
            let updated = selection_edit.apply_to(&request.buffer);
            RewirePlan {
                outcome: rewrite::rewrite(
                    &updated,
                    &names.symbolic_name,
                    &module_path,
                    self.options.block_scan,
                ),
                keep_import_without_block: self.options.keep_import_without_block,
            }
        });

        Ok(ExtractionPlan {
            names,
            module_path,
            file,
            selection_edit,
            rewire,
        })
    }

    /// Apply `plan` through the host's primitives.
    ///
    /// A failed file write stops before the buffer is touched. Once the file exists, a missing
    /// declaration block is reported as a warning and the extraction still succeeds.
    pub fn apply(
        &self,
        plan: ExtractionPlan,
        host: &mut dyn Host,
    ) -> Result<ExtractionReport, ExtractError> {
        let ExtractionPlan {
            names,
            file,
            selection_edit,
            rewire,
            ..
        } = plan;

        if let Err(source) = host.write_file(&file.path, &file.content) {
            let err = ExtractError::WriteFailure {
                path: file.path.clone(),
                source,
            };
            host.notify(Notification::Error(err.to_string()));
            return Err(err);
        }

        if let Err(err) = host.replace_range(selection_edit.range, &selection_edit.replacement) {
            let err = ExtractError::BufferEdit(err);
            host.notify(Notification::Error(err.to_string()));
            return Err(err);
        }

        let status = match rewire {
            None => RewireStatus::Disabled,
            Some(rewire) => {
                if let Some(text) = rewire.replacement() {
                    if let Err(err) = host.replace_all(text) {
                        let err = ExtractError::BufferEdit(err);
                        host.notify(Notification::Error(err.to_string()));
                        return Err(err);
                    }
                }
                match rewire.outcome {
                    RewriteOutcome::Rewritten { .. } => RewireStatus::Rewired,
                    RewriteOutcome::BlockNotFound { .. } => {
                        host.notify(Notification::Warning(
                            ExtractError::DeclarationBlockNotFound.to_string(),
                        ));
                        RewireStatus::BlockNotFound {
                            import_kept: rewire.keep_import_without_block,
                        }
                    }
                }
            }
        };

        host.open_document(&file.path);
        let message = match status {
            RewireStatus::Rewired => {
                format!("Component {} created and imported successfully!", names.identifier)
            }
            _ => format!("Component {} created successfully!", names.identifier),
        };
        host.notify(Notification::Info(message));
        tracing::debug!(path = %file.path.display(), ?status, "extraction finished");

        Ok(ExtractionReport {
            names,
            created: file.path,
            rewire: status,
        })
    }

    /// Plan and apply in one go, reporting validation failures through the host.
    pub fn run(
        &self,
        request: &ExtractRequest,
        host: &mut dyn Host,
    ) -> Result<ExtractionReport, ExtractError> {
        let plan = match self.plan(request) {
            Ok(plan) => plan,
            Err(err) => {
                if err.is_silent() {
                    tracing::debug!("extraction cancelled");
                } else {
                    host.notify(Notification::Error(err.to_string()));
                }
                return Err(err);
            }
        };
        self.apply(plan, host)
    }
}
