// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer. Owns the data directory and the persisted config,
// and assembles scanners and pipelines for the commands to run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scanwerk_bridge::platform_bridge;
use scanwerk_core::config::ScannerConfig;
use scanwerk_core::error::Result;
use scanwerk_core::types::{BarcodeFormat, ImageReference};
use scanwerk_detect::QrDetector;
use scanwerk_session::persist;
use scanwerk_session::{SavedSession, ScanPipeline, Scanner};
use tracing::{info, warn};

use super::data_dir;

const CONFIG_FILE: &str = "config.json";
const SESSION_FILE: &str = "session.json";

/// Config changes requested on the command line. Unset fields are kept.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub formats: Vec<BarcodeFormat>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

/// Shared application services.
#[derive(Debug, Clone)]
pub struct AppServices {
    data_dir: PathBuf,
    config: ScannerConfig,
}

impl AppServices {
    /// Initialise against the platform data directory.
    pub fn init() -> Result<Self> {
        Self::with_data_dir(data_dir::data_dir())
    }

    /// Initialise against an explicit directory, creating it if needed.
    pub fn with_data_dir(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        info!(path = %dir.display(), "initialising app services");

        // Load persisted config or use defaults
        let config = load_config(&dir).unwrap_or_default();

        Ok(Self {
            data_dir: dir,
            config,
        })
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Update and persist the config.
    pub fn save_config(&mut self, config: ScannerConfig) -> Result<()> {
        persist_config(&self.data_dir, &config)?;
        self.config = config;
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Apply `overrides` and persist the result. Returns whether anything
    /// changed; an unchanged config is not rewritten.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<bool> {
        let mut config = self.config.clone();
        if !overrides.formats.is_empty() {
            config.formats = overrides.formats;
        }
        if let Some(width) = overrides.max_width {
            config.max_width = width;
        }
        if let Some(height) = overrides.max_height {
            config.max_height = height;
        }

        if config == self.config {
            return Ok(false);
        }
        info!(
            formats = ?config.formats,
            max_width = config.max_width,
            max_height = config.max_height,
            "config updated"
        );
        self.save_config(config)?;
        Ok(true)
    }

    /// Where the camera collaborator writes each photo.
    pub fn capture_target(&self) -> ImageReference {
        ImageReference::from_path(self.data_dir.join(&self.config.capture_file_name))
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }

    // -- Session persistence ---------------------------------------------------

    pub fn load_session(&self) -> Result<SavedSession> {
        persist::load(&self.session_path())
    }

    pub fn save_session(&self, saved: &SavedSession) -> Result<()> {
        persist::save(&self.session_path(), saved)
    }

    pub fn clear_session(&self) -> Result<()> {
        persist::clear(&self.session_path())?;
        info!("saved session cleared");
        Ok(())
    }

    // -- Assembly --------------------------------------------------------------

    pub fn pipeline(&self) -> ScanPipeline<QrDetector> {
        ScanPipeline::from_config(&self.config, QrDetector::from_config(&self.config))
    }

    /// Build a scanner that resumes the saved session.
    ///
    /// `photo` stands in for the camera; `grant_permission` overrides the
    /// configured answer to the permission prompt.
    pub fn scanner(&self, photo: Option<PathBuf>, grant_permission: bool) -> Result<Scanner<QrDetector>> {
        let bridge_config = ScannerConfig {
            auto_grant_permission: grant_permission,
            ..self.config.clone()
        };
        let bridge = Arc::from(platform_bridge(&bridge_config, photo));
        let saved = self.load_session()?;
        Ok(Scanner::resume(
            bridge,
            self.pipeline(),
            &self.config,
            self.capture_target(),
            saved,
        ))
    }
}

// -- Config file persistence -------------------------------------------------

fn load_config(data_dir: &Path) -> Option<ScannerConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable config");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &ScannerConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanwerk_core::config::SampleRounding;

    #[test]
    fn defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::with_data_dir(dir.path().join("scanwerk")).unwrap();
        assert_eq!(services.config(), &ScannerConfig::default());
        assert!(services.data_dir().is_dir());
    }

    #[test]
    fn config_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut services = AppServices::with_data_dir(dir.path().to_path_buf()).unwrap();
        services
            .save_config(ScannerConfig {
                max_width: 1024,
                sample_rounding: SampleRounding::PowerOfTwo,
                ..ScannerConfig::default()
            })
            .unwrap();

        let reopened = AppServices::with_data_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.config().max_width, 1024);
        assert_eq!(reopened.config().sample_rounding, SampleRounding::PowerOfTwo);
    }

    #[test]
    fn overrides_persist_and_keep_unset_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut services = AppServices::with_data_dir(dir.path().to_path_buf()).unwrap();

        let changed = services
            .apply_overrides(ConfigOverrides {
                formats: vec![BarcodeFormat::DataMatrix, BarcodeFormat::QrCode],
                max_height: Some(800),
                ..ConfigOverrides::default()
            })
            .unwrap();
        assert!(changed);

        let reopened = AppServices::with_data_dir(services.data_dir().to_path_buf()).unwrap();
        assert_eq!(
            reopened.config().formats,
            vec![BarcodeFormat::DataMatrix, BarcodeFormat::QrCode]
        );
        assert_eq!(reopened.config().max_height, 800);
        assert_eq!(reopened.config().max_width, 600);
    }

    #[test]
    fn empty_overrides_leave_config_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut services = AppServices::with_data_dir(dir.path().to_path_buf()).unwrap();
        assert!(!services.apply_overrides(ConfigOverrides::default()).unwrap());
        assert!(!dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn corrupt_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        let services = AppServices::with_data_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(services.config(), &ScannerConfig::default());
    }

    #[test]
    fn capture_target_lives_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::with_data_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            services.capture_target().to_path(),
            dir.path().join("picture.jpg")
        );
    }

    #[test]
    fn session_round_trip_through_services() {
        let dir = tempfile::tempdir().unwrap();
        let services = AppServices::with_data_dir(dir.path().to_path_buf()).unwrap();
        let saved = SavedSession {
            uri: Some("file:///photo.jpg".into()),
            result: Some(" http://example.com".into()),
            phase: None,
        };
        services.save_session(&saved).unwrap();
        assert_eq!(services.load_session().unwrap(), saved);
        services.clear_session().unwrap();
        assert_eq!(services.load_session().unwrap(), SavedSession::default());
    }
}
