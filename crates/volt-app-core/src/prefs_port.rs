// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Prefs port shared across Volt tools (CLI, hosts).

use crate::config::{ConfigError, ConfigService, ConfigStore};
use crate::prefs::{SimPrefs, PREFS_KEY};

/// Load/save seam for [`SimPrefs`].
pub trait PrefsPort {
    /// Stored prefs, or defaults when none were saved yet.
    fn load_prefs(&self) -> Result<SimPrefs, ConfigError>;
    /// Persist `prefs`.
    fn save_prefs(&self, prefs: &SimPrefs) -> Result<(), ConfigError>;
}

impl<S> PrefsPort for ConfigService<S>
where
    S: ConfigStore,
{
    fn load_prefs(&self) -> Result<SimPrefs, ConfigError> {
        self.load_or_default(PREFS_KEY)
    }

    fn save_prefs(&self, prefs: &SimPrefs) -> Result<(), ConfigError> {
        self.save(PREFS_KEY, prefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigStore;

    #[test]
    fn fresh_store_yields_defaults() {
        let service = ConfigService::new(MemoryConfigStore::new());
        assert_eq!(service.load_prefs().expect("load"), SimPrefs::default());
    }

    #[test]
    fn saved_prefs_live_under_the_sim_key() {
        let service = ConfigService::new(MemoryConfigStore::new());
        let mut prefs = SimPrefs::default();
        prefs.oscillator.refresh_rate_ms = 5;
        prefs.waveform_window_ms = 250;
        service.save_prefs(&prefs).expect("save");
        assert_eq!(service.load_prefs().expect("load"), prefs);
        assert!(service.store().load_raw("sim").is_ok());
    }
}
