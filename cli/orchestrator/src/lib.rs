#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
//! Building blocks for the `clientgen` command line tool.

use std::path::{Path, PathBuf};

use config::{Config, GenerationSettings};
use pipeline::GenerationOutput;
use thiserror::Error;
use tracing::info;

/// Errors that can occur while running the command line tool.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or rendered.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// The code model could not be read.
    #[error("failed to load code model `{}`: {source}", path.display())]
    Input {
        /// Code model path
        path: PathBuf,
        /// Underlying load failure
        source: ir::LoadError,
    },
    /// A generation stage failed.
    #[error(transparent)]
    Pipeline(#[from] pipeline::PipelineError),
    /// Writing output failed.
    #[error("failed to write `{}`: {source}", path.display())]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
}

impl CliError {
    /// Identity path of the schema or operation that caused the failure
    pub fn model_path(&self) -> Option<&str> {
        match self {
            CliError::Pipeline(e) => e.path(),
            _ => None,
        }
    }
}

/// Result type alias for command line operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Switches that turn individual settings off for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Keep flattened objects nested
    pub no_flatten: bool,
    /// Leave optional constants as constants
    pub no_promote_constants: bool,
    /// Skip typed convenience methods
    pub no_convenience: bool,
    /// Skip `_async` methods
    pub no_async: bool,
}

impl Overrides {
    /// Apply the switches on top of `settings`
    pub fn apply(&self, settings: &mut GenerationSettings) {
        if self.no_flatten {
            settings.flatten_client_flattened_properties = false;
        }
        if self.no_promote_constants {
            settings.promote_optional_constants_to_enum = false;
        }
        if self.no_convenience {
            settings.generate_convenience_api = false;
        }
        if self.no_async {
            settings.generate_async_api = false;
        }
    }
}

/// Load `input` and run the pipeline with the settings of `config`
pub fn generate(input: &Path, config: &Config) -> Result<GenerationOutput> {
    let model = ir::CodeModel::from_file(input)
        .map_err(|source| CliError::Input { path: input.to_path_buf(), source })?;
    info!(input = %input.display(), model = %model.name, "loaded code model");
    Ok(pipeline::transform(model, &config.settings)?)
}

/// Write the rendered sources under `out_dir`; returns the number of files
pub fn write_output(output: &GenerationOutput, out_dir: &Path, rustfmt: bool) -> Result<usize> {
    codegen::write_generated(out_dir, &output.files, rustfmt)
        .map_err(|source| CliError::Write { path: out_dir.to_path_buf(), source })
}

/// Write the client model graph as JSON to `path`
pub fn write_graph(output: &GenerationOutput, path: &Path) -> Result<()> {
    let json = output.graph_json()?;
    std::fs::write(path, json).map_err(|source| CliError::Write { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_only_disable() {
        let mut settings = GenerationSettings { generate_async_api: false, ..Default::default() };
        Overrides { no_convenience: true, ..Default::default() }.apply(&mut settings);
        assert!(!settings.generate_convenience_api);
        assert!(!settings.generate_async_api);
        assert!(settings.flatten_client_flattened_properties);
        assert!(settings.promote_optional_constants_to_enum);
    }

    #[test]
    fn test_missing_input_reports_path() {
        let err = generate(Path::new("does/not/exist.json"), &Config::default()).expect_err("missing file");
        assert!(err.to_string().contains("does/not/exist.json"));
        assert!(err.model_path().is_none());
    }
}
