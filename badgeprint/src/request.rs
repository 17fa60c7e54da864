//!
//! Print job requests
//!
use serde::{Deserialize, Serialize};

use crate::{
    error::PrintError,
    locator::DocumentLocator,
    model::{PrintTarget, TargetId},
};

/// Job title used when none is given
pub const DEFAULT_JOB_TITLE: &str = "Badge Printing";

/// Job source reported to the backend when none is given
pub const DEFAULT_JOB_SOURCE: &str = "Attendee Registration App";

/// Paper format used when the printer reports none
pub const DEFAULT_PAPER_FORMAT: &str = "A4";

/// Paper orientation
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Duplex mode
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Duplex {
    #[default]
    None,
    LongEdge,
    ShortEdge,
    /// The printer cannot print on both sides
    Unsupported,
}

/// Print quality tier; the only way to pick a resolution
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrintQuality {
    Standard,
    #[default]
    High,
}

impl PrintQuality {
    pub const STANDARD_DPI: u32 = 300;
    pub const HIGH_DPI: u32 = 600;

    pub fn from_high_quality(flag: bool) -> Self {
        if flag {
            PrintQuality::High
        } else {
            PrintQuality::Standard
        }
    }

    pub fn dpi(&self) -> u32 {
        match self {
            PrintQuality::Standard => Self::STANDARD_DPI,
            PrintQuality::High => Self::HIGH_DPI,
        }
    }
}

/// Job options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintOptions {
    pub copies: u32,
    pub color: bool,
    pub orientation: Orientation,
    pub quality: PrintQuality,
    pub paper_format: Option<String>,
    pub duplex: Duplex,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            copies: 1,
            color: true,
            orientation: Orientation::Portrait,
            quality: PrintQuality::High,
            paper_format: None,
            duplex: Duplex::None,
        }
    }
}

impl PrintOptions {
    /// Derive default options from the capabilities of a freshly selected target
    pub fn for_target(target: &PrintTarget, quality: PrintQuality) -> Self {
        let caps = &target.capabilities;
        PrintOptions {
            copies: 1,
            color: caps.supports_color,
            orientation: Orientation::Portrait,
            quality,
            paper_format: Some(
                caps.paper_formats
                    .iter()
                    .next()
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_PAPER_FORMAT.to_owned()),
            ),
            duplex: if caps.supports_duplex {
                Duplex::None
            } else {
                Duplex::Unsupported
            },
        }
    }

    /// Effective resolution in dots per inch
    pub fn resolution_dpi(&self) -> u32 {
        self.quality.dpi()
    }

    fn validate(&self) -> Result<(), PrintError> {
        if self.copies == 0 {
            return Err(PrintError::InvalidOptions("copies must be at least 1".to_owned()));
        }
        if matches!(&self.paper_format, Some(format) if format.trim().is_empty()) {
            return Err(PrintError::InvalidOptions("paper format must not be empty".to_owned()));
        }
        Ok(())
    }
}

/// One print attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJobRequest {
    locator: DocumentLocator,
    target: Option<TargetId>,
    options: PrintOptions,
    title: String,
    source: String,
}

impl PrintJobRequest {
    /// Create request builder for the document
    pub fn builder(locator: DocumentLocator) -> PrintJobRequestBuilder {
        PrintJobRequestBuilder::new(locator)
    }

    pub fn locator(&self) -> &DocumentLocator {
        &self.locator
    }

    /// Explicitly requested target, if any
    pub fn target(&self) -> Option<&TargetId> {
        self.target.as_ref()
    }

    pub fn options(&self) -> &PrintOptions {
        &self.options
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Builder to create print job requests
pub struct PrintJobRequestBuilder {
    locator: DocumentLocator,
    target: Option<TargetId>,
    options: PrintOptions,
    title: Option<String>,
    source: Option<String>,
}

impl PrintJobRequestBuilder {
    fn new(locator: DocumentLocator) -> Self {
        PrintJobRequestBuilder {
            locator,
            target: None,
            options: PrintOptions::default(),
            title: None,
            source: None,
        }
    }

    /// Print on this target instead of the selected one
    pub fn target<T>(mut self, target: T) -> Self
    where
        T: Into<TargetId>,
    {
        self.target = Some(target.into());
        self
    }

    /// Replace all job options
    pub fn options(mut self, options: PrintOptions) -> Self {
        self.options = options;
        self
    }

    /// Number of copies, must be at least 1
    pub fn copies(mut self, copies: u32) -> Self {
        self.options.copies = copies;
        self
    }

    pub fn color(mut self, color: bool) -> Self {
        self.options.color = color;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.options.orientation = orientation;
        self
    }

    /// Pick the high resolution tier when set, the standard one otherwise
    pub fn high_quality(mut self, flag: bool) -> Self {
        self.options.quality = PrintQuality::from_high_quality(flag);
        self
    }

    pub fn paper_format<S>(mut self, paper_format: S) -> Self
    where
        S: AsRef<str>,
    {
        self.options.paper_format = Some(paper_format.as_ref().to_owned());
        self
    }

    pub fn duplex(mut self, duplex: Duplex) -> Self {
        self.options.duplex = duplex;
        self
    }

    /// Job title shown in the backend's job list
    pub fn title<S>(mut self, title: S) -> Self
    where
        S: AsRef<str>,
    {
        self.title = Some(title.as_ref().to_owned());
        self
    }

    /// Application name reported as job source
    pub fn source<S>(mut self, source: S) -> Self
    where
        S: AsRef<str>,
    {
        self.source = Some(source.as_ref().to_owned());
        self
    }

    /// Validate and build the request
    pub fn build(self) -> Result<PrintJobRequest, PrintError> {
        self.options.validate()?;
        Ok(PrintJobRequest {
            locator: self.locator,
            target: self.target,
            options: self.options,
            title: self.title.unwrap_or_else(|| DEFAULT_JOB_TITLE.to_owned()),
            source: self.source.unwrap_or_else(|| DEFAULT_JOB_SOURCE.to_owned()),
        })
    }
}
