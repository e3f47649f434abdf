use clap::ValueEnum;
use imgseq_core::{OutputFormat as CoreOutputFormat, Preview};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PreviewArg {
    Table,
    Summary,
    Json,
    None,
}

impl PreviewArg {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(Self::Table),
            "summary" => Some(Self::Summary),
            "json" => Some(Self::Json),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

impl From<PreviewArg> for Preview {
    fn from(arg: PreviewArg) -> Self {
        match arg {
            PreviewArg::Table => Self::Table,
            PreviewArg::Summary => Self::Summary,
            PreviewArg::Json => Self::Json,
            PreviewArg::None => Self::None,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Summary,
    Json,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Summary => Self::Summary,
            OutputFormat::Json => Self::Json,
        }
    }
}

/// Pick the preview format: explicit flag, then config, then table.
/// JSON output never carries a human preview.
pub fn resolve_preview(arg: Option<PreviewArg>, config_default: &str, output: OutputFormat) -> Preview {
    if output == OutputFormat::Json {
        return Preview::None;
    }
    arg.or_else(|| PreviewArg::from_str(config_default))
        .unwrap_or(PreviewArg::Table)
        .into()
}
