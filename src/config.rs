//! Named parameter profiles loaded from TOML.
//!
//! Different platforms (a small robot, a spacecraft, a booster) want
//! different window sizes and thresholds. Those live in a profile file rather
//! than in code:
//!
//! ```toml
//! default_profile = "robot"
//!
//! [profiles.robot]
//! window = 50
//! reset_threshold = 0.05
//! micro_steps = 10
//! cooldown_secs = 1.0
//!
//! [profiles.spacecraft]
//! window = 200
//! reset_threshold = 0.02
//! micro_steps = 20
//! cooldown_secs = 30.0
//! cooldown_clock = "wall-clock"
//! min_net_rotation_deg = 0.5
//! ```

use std::{collections::BTreeMap, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{ConfigError, CooldownClock, ResetParameters};

/// A single named profile, as written in the profile file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Window capacity in samples.
    pub window: usize,
    /// Trigger threshold on the resetability residual.
    pub reset_threshold: f64,
    /// Micro-steps per increment.
    pub micro_steps: usize,
    /// Cooldown after a command, in seconds.
    pub cooldown_secs: f64,
    /// Clock the cooldown is measured on.
    #[serde(default)]
    pub cooldown_clock: CooldownClock,
    /// Minimum net rotation to trigger, in degrees. `0` (off) if omitted.
    #[serde(default = "default_min_net_rotation_deg")]
    pub min_net_rotation_deg: f64,
}

fn default_min_net_rotation_deg() -> f64 {
    ResetParameters::default().min_net_rotation.to_degrees()
}

impl TryFrom<&Profile> for ResetParameters {
    type Error = ConfigError;

    fn try_from(profile: &Profile) -> Result<Self, Self::Error> {
        let cooldown = Duration::try_from_secs_f64(profile.cooldown_secs)
            .map_err(|_| ConfigError::InvalidCooldown(profile.cooldown_secs))?;

        let parameters = Self {
            window_capacity: profile.window,
            reset_threshold: profile.reset_threshold,
            micro_steps: profile.micro_steps,
            cooldown,
            cooldown_clock: profile.cooldown_clock,
            min_net_rotation: profile.min_net_rotation_deg.to_radians(),
        };
        parameters.validate()?;
        Ok(parameters)
    }
}

/// The contents of a profile file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSet {
    /// Profile used by [`Self::default_parameters`].
    pub default_profile: Option<String>,
    /// All profiles by name.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl ProfileSet {
    /// Parses a profile file from its TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `contents` does not match the
    /// profile schema.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Loads a profile file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not a valid profile file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let profiles = Self::parse(&contents)?;
        info!(?path, count = profiles.profiles.len(), "loaded reset profiles");
        Ok(profiles)
    }

    /// Validated parameters of the profile called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownProfile`] if there is no such profile,
    /// or the validation error of its parameters.
    pub fn parameters(&self, name: &str) -> Result<ResetParameters, ConfigError> {
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_owned()))?;
        ResetParameters::try_from(profile)
    }

    /// Parameters of the default profile, or [`ResetParameters::default`] if
    /// the file does not name one.
    ///
    /// # Errors
    ///
    /// Same as [`Self::parameters`].
    pub fn default_parameters(&self) -> Result<ResetParameters, ConfigError> {
        match &self.default_profile {
            Some(name) => self.parameters(name),
            None => {
                info!("no default profile, using built-in parameters");
                Ok(ResetParameters::default())
            }
        }
    }
}
