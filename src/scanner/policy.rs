//! Extension accept/reject policy

use std::path::Path;

/// How a file is treated by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionClass {
    Accepted,
    Rejected,
    Other,
}

/// Accepted and rejected extensions, lowercase with a leading dot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionPolicy {
    accept: Vec<String>,
    reject: Vec<String>,
}

impl ExtensionPolicy {
    pub fn new<I, J, S, T>(accept: I, reject: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            accept: normalize_list(accept),
            reject: normalize_list(reject),
        }
    }

    /// Build from comma-separated lists, the form used on the agent command line
    pub fn from_comma_lists(accept: &str, reject: &str) -> Self {
        Self::new(accept.split(','), reject.split(','))
    }

    pub fn accepted(&self) -> &[String] {
        &self.accept
    }

    pub fn rejected(&self) -> &[String] {
        &self.reject
    }

    pub fn accept_arg(&self) -> String {
        self.accept.join(",")
    }

    pub fn reject_arg(&self) -> String {
        self.reject.join(",")
    }

    /// Classify a file name, returning its normalized extension alongside
    ///
    /// Accept wins if an extension is listed on both sides.
    pub fn classify(&self, file_name: &str) -> (ExtensionClass, String) {
        let extension = extension_of(file_name);
        let class = if self.accept.contains(&extension) {
            ExtensionClass::Accepted
        } else if self.reject.contains(&extension) {
            ExtensionClass::Rejected
        } else {
            ExtensionClass::Other
        };
        (class, extension)
    }
}

/// Lowercase extension with leading dot, empty when the name has none
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

fn normalize_list<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for item in items {
        let trimmed = item.as_ref().trim().to_lowercase();
        if trimmed.is_empty() {
            continue;
        }
        let ext = if trimmed.starts_with('.') {
            trimmed
        } else {
            format!(".{}", trimmed)
        };
        if !normalized.contains(&ext) {
            normalized.push(ext);
        }
    }
    normalized
}
