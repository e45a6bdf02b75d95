//! Report and export settings, read from `settings.json` in the app data
//! directory. Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::escpos::PaperWidth;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct StockSettings {
    /// Heading printed on every report.
    pub title: String,
    #[serde(alias = "store_name")]
    pub store_name: Option<String>,
    #[serde(alias = "paper_width_mm")]
    pub paper_width_mm: i32,
    /// Directory under the app data dir where report files are written.
    #[serde(alias = "export_dir_name")]
    pub export_dir_name: String,
}

impl Default for StockSettings {
    fn default() -> Self {
        Self {
            title: "Stock Report".to_string(),
            store_name: None,
            paper_width_mm: 80,
            export_dir_name: "reports".to_string(),
        }
    }
}

impl StockSettings {
    pub fn paper_width(&self) -> PaperWidth {
        PaperWidth::from_mm(self.paper_width_mm)
    }

    pub fn export_dir(&self, data_dir: &Path) -> PathBuf {
        let name = self.export_dir_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return data_dir.join(Self::default().export_dir_name);
        }
        data_dir.join(name)
    }

    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(SETTINGS_FILE);
        let Ok(raw) = fs::read_to_string(&path) else {
            return Self::default();
        };
        match serde_json::from_str::<Self>(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid settings file, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_keep_defaults() {
        let settings: StockSettings =
            serde_json::from_str(r#"{"store_name":"Bar do Zé","paperWidthMm":58}"#)
                .expect("parse settings");
        assert_eq!(settings.title, "Stock Report");
        assert_eq!(settings.store_name.as_deref(), Some("Bar do Zé"));
        assert_eq!(settings.paper_width().chars(), 32);
        assert_eq!(settings.export_dir_name, "reports");
    }

    #[test]
    fn export_dir_rejects_path_segments() {
        let base = Path::new("/data");
        let settings = StockSettings {
            export_dir_name: "../outside".into(),
            ..StockSettings::default()
        };
        assert_eq!(settings.export_dir(base), base.join("reports"));

        let settings = StockSettings {
            export_dir_name: "shift-sheets".into(),
            ..StockSettings::default()
        };
        assert_eq!(settings.export_dir(base), base.join("shift-sheets"));
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join(format!(
            "the-small-stock-settings-{}",
            uuid::Uuid::new_v4()
        ));
        assert_eq!(StockSettings::load(&dir), StockSettings::default());

        fs::create_dir_all(&dir).expect("create dir");
        fs::write(dir.join(SETTINGS_FILE), "not json").expect("write settings");
        assert_eq!(StockSettings::load(&dir), StockSettings::default());

        fs::write(dir.join(SETTINGS_FILE), r#"{"title":"Relatório de Estoque"}"#)
            .expect("write settings");
        assert_eq!(StockSettings::load(&dir).title, "Relatório de Estoque");
        let _ = fs::remove_dir_all(&dir);
    }
}
