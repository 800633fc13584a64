use crate::error::ExtractError;

pub const DEFAULT_OCR_LANGUAGE: &str = "eng+spa";
pub const DEFAULT_OCR_CONFIG: &str = "--psm 6 --oem 3 -c preserve_interword_spaces=1";

pub const OCR_LANGUAGE_ENV: &str = "BANKCSV_OCR_LANG";
pub const OCR_CONFIG_ENV: &str = "BANKCSV_OCR_CONFIG";

/// Construction-time settings of a [`crate::DocumentProcessor`]; not overridable per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Tesseract language codes, `+`-joined (e.g. `eng+spa`).
    pub ocr_language: String,
    /// Extra engine arguments, shell-word split before being passed on.
    pub ocr_config: String,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            ocr_config: DEFAULT_OCR_CONFIG.to_string(),
        }
    }
}

impl ProcessorConfig {
    /// Defaults overridden by `BANKCSV_OCR_LANG` / `BANKCSV_OCR_CONFIG` when set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            ocr_language: lookup(OCR_LANGUAGE_ENV)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or(defaults.ocr_language),
            ocr_config: lookup(OCR_CONFIG_ENV).unwrap_or(defaults.ocr_config),
        }
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.ocr_language.trim().is_empty() {
            return Err(ExtractError::InvalidOption(
                "OCR language cannot be empty".to_string(),
            ));
        }
        if self
            .ocr_language
            .split('+')
            .any(|code| code.trim().is_empty())
        {
            return Err(ExtractError::InvalidOption(format!(
                "invalid OCR language list '{}'",
                self.ocr_language
            )));
        }
        if shlex::split(&self.ocr_config).is_none() {
            return Err(ExtractError::InvalidOption(format!(
                "OCR config has unbalanced quoting: '{}'",
                self.ocr_config
            )));
        }
        Ok(())
    }
}
