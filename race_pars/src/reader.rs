use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ParsError, SourceKind};

const DEFAULT_SECTION: &str = "DEFAULT";

/// An INI-style parameter file in the configparser dialect.
///
/// Option names are lower-cased on read, section names are kept as written.
/// Indented lines continue the previous value, which is how multi-line JSON
/// payloads are embedded. Values of the `[DEFAULT]` section are visible from
/// every other section.
#[derive(Debug, Clone, Default)]
pub struct IniDocument {
    path: PathBuf,
    defaults: BTreeMap<String, String>,
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

struct OpenValue {
    section: Option<String>,
    key: String,
    indent: usize,
}

impl IniDocument {
    /// Reads and parses `path`. A file that cannot be read or holds no
    /// section at all is reported as unavailable.
    pub fn load(kind: SourceKind, path: &Path) -> Result<Self, ParsError> {
        let text = fs::read_to_string(path).map_err(|_| ParsError::SourceUnavailable {
            kind,
            path: path.to_path_buf(),
        })?;
        let doc = Self::parse(path, &text)?;
        if doc.is_empty() {
            return Err(ParsError::SourceUnavailable {
                kind,
                path: path.to_path_buf(),
            });
        }
        Ok(doc)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self, ParsError> {
        let mut doc = IniDocument {
            path: path.to_path_buf(),
            ..Default::default()
        };
        // None = no header seen yet, Some(None) = inside [DEFAULT]
        let mut current: Option<Option<String>> = None;
        let mut open: Option<OpenValue> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }
            let indent = raw.len() - raw.trim_start().len();

            if let Some(value) = open.as_ref().filter(|v| indent > v.indent) {
                let target = doc.section_mut(value.section.as_deref());
                if let Some(existing) = target.get_mut(&value.key) {
                    if !existing.is_empty() {
                        existing.push('\n');
                    }
                    existing.push_str(trimmed);
                }
                continue;
            }
            open = None;

            // `[name]` followed by anything, the header runs to the last `]`
            let header_end = trimmed.rfind(']').filter(|&end| trimmed.starts_with('[') && end > 1);
            if let Some(end) = header_end {
                let name = trimmed[1..end].trim().to_string();
                if name == DEFAULT_SECTION {
                    current = Some(None);
                    continue;
                }
                if doc.sections.contains_key(&name) {
                    return Err(doc.syntax(line_no, format!("section [{}] already exists", name)));
                }
                doc.sections.insert(name.clone(), BTreeMap::new());
                current = Some(Some(name));
                continue;
            }

            let section = match &current {
                Some(section) => section.clone(),
                None => {
                    return Err(doc.syntax(line_no, "option line before the first section header".into()))
                }
            };

            let split_at = match trimmed.find(|c: char| c == '=' || c == ':') {
                Some(pos) => pos,
                None => return Err(doc.syntax(line_no, format!("expected 'key = value', got '{}'", trimmed))),
            };
            let key = trimmed[..split_at].trim().to_lowercase();
            let value = trimmed[split_at + 1..].trim().to_string();
            if key.is_empty() {
                return Err(doc.syntax(line_no, "empty option name".into()));
            }

            let target = doc.section_mut(section.as_deref());
            if target.contains_key(&key) {
                return Err(doc.syntax(line_no, format!("option '{}' already exists", key)));
            }
            target.insert(key.clone(), value);
            open = Some(OpenValue {
                section,
                key,
                indent,
            });
        }

        Ok(doc)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.defaults.is_empty()
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.sections.contains_key(section)
    }

    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Raw option text, falling back to `[DEFAULT]`.
    pub fn get(&self, section: &str, key: &str) -> Result<&str, ParsError> {
        let options = self
            .sections
            .get(section)
            .ok_or_else(|| ParsError::MissingSection {
                section: section.to_string(),
            })?;
        let key = key.to_lowercase();
        options
            .get(&key)
            .or_else(|| self.defaults.get(&key))
            .map(String::as_str)
            .ok_or_else(|| ParsError::MissingKey {
                section: section.to_string(),
                key,
            })
    }

    /// Decodes the JSON payload stored under `section`/`key`.
    pub fn decode<T: DeserializeOwned>(&self, section: &str, key: &str) -> Result<T, ParsError> {
        let raw = self.get(section, key)?;
        serde_json::from_str(raw).map_err(|source| ParsError::Decode {
            section: section.to_string(),
            key: key.to_string(),
            source,
        })
    }

    fn section_mut(&mut self, section: Option<&str>) -> &mut BTreeMap<String, String> {
        match section {
            Some(name) => self.sections.entry(name.to_string()).or_default(),
            None => &mut self.defaults,
        }
    }

    fn syntax(&self, line: usize, message: String) -> ParsError {
        ParsError::Syntax {
            path: self.path.clone(),
            line,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> IniDocument {
        IniDocument::parse(Path::new("test.ini"), text).expect("should parse")
    }

    #[test]
    fn test_multiline_json_value() {
        let doc = parse(
            "[RACE_PARS]\nrace_pars = {\"season\": 2019,\n    \"tot_no_laps\": 56}\n",
        );
        let value: serde_json::Value = doc.decode("RACE_PARS", "race_pars").unwrap();
        assert_eq!(value["season"], 2019);
        assert_eq!(value["tot_no_laps"], 56);
    }

    #[test]
    fn test_option_names_are_case_insensitive() {
        let doc = parse("[TRACK_PARS]\nTrack_Pars: {\"name\": \"Shanghai\"}\n");
        assert!(doc.get("TRACK_PARS", "track_pars").is_ok());
        assert!(doc.get("TRACK_PARS", "TRACK_PARS").is_ok());
        assert!(matches!(
            doc.get("track_pars", "track_pars"),
            Err(ParsError::MissingSection { .. })
        ));
    }

    #[test]
    fn test_comments_and_defaults() {
        let doc = parse("# header\n[DEFAULT]\nshared = 1\n\n[A]\n; note\nown = 2\n");
        assert_eq!(doc.get("A", "own").unwrap(), "2");
        assert_eq!(doc.get("A", "shared").unwrap(), "1");
        assert_eq!(doc.sections().collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn test_trailing_text_after_section_header() {
        let doc = parse("[SEASON_2019] ; 2019 data\np_accident = {}\n[ALL_SEASONS]]\nx = 1\n");
        assert_eq!(doc.get("SEASON_2019", "p_accident").unwrap(), "{}");
        // the header runs to the last closing bracket
        assert!(doc.has_section("ALL_SEASONS]"));
    }

    #[test]
    fn test_missing_key_reported_with_section() {
        let doc = parse("[SEASON_2019]\np_accident = {}\n");
        match doc.get("SEASON_2019", "p_failure") {
            Err(ParsError::MissingKey { section, key }) => {
                assert_eq!(section, "SEASON_2019");
                assert_eq!(key, "p_failure");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_failure_names_section_and_key() {
        let doc = parse("[VSE_PARS]\nvse_pars = {not json}\n");
        let err = doc.decode::<serde_json::Value>("VSE_PARS", "vse_pars").unwrap_err();
        assert!(matches!(err, ParsError::Decode { ref section, ref key, .. }
            if section == "VSE_PARS" && key == "vse_pars"));
    }

    #[test]
    fn test_syntax_errors() {
        let path = Path::new("bad.ini");
        assert!(matches!(
            IniDocument::parse(path, "key = 1\n"),
            Err(ParsError::Syntax { line: 1, .. })
        ));
        assert!(matches!(
            IniDocument::parse(path, "[A]\nnot an option\n"),
            Err(ParsError::Syntax { line: 2, .. })
        ));
        assert!(matches!(
            IniDocument::parse(path, "[A]\nx = 1\nX = 2\n"),
            Err(ParsError::Syntax { line: 3, .. })
        ));
        assert!(matches!(
            IniDocument::parse(path, "[A]\n[A]\n"),
            Err(ParsError::Syntax { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_and_empty_files_are_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ini");
        assert!(matches!(
            IniDocument::load(SourceKind::Race, &missing),
            Err(ParsError::SourceUnavailable { kind: SourceKind::Race, .. })
        ));

        let empty = dir.path().join("empty.ini");
        fs::write(&empty, "# nothing here\n").unwrap();
        assert!(matches!(
            IniDocument::load(SourceKind::MonteCarlo, &empty),
            Err(ParsError::SourceUnavailable { kind: SourceKind::MonteCarlo, .. })
        ));
    }
}
