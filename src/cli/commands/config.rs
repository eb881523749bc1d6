//! Config command - show the loaded configuration

use std::path::Path;

use descil_mturk::ServiceConfig;
use descil_mturk::output::{ConfigInfo, OutputMode};

/// Print the configuration with the service key masked
pub fn show_config(path: &Path, config: &ServiceConfig, mode: OutputMode) {
    ConfigInfo {
        path: path.display().to_string(),
        key: config.masked_key(),
        project: config.project.clone(),
        uri: config.uri.as_ref().map(ToString::to_string),
        file: config.file.as_ref().map(|f| f.display().to_string()),
        timeout_secs: config.timeout.map(|t| t.as_secs()),
    }
    .render(mode);
}
