use std::{fmt::Display, str::FromStr, time::Duration};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("A load profile needs at least one stage")]
    NoStages,
    #[error("Stage {0:?} is not in the <duration>:<target> format")]
    InvalidStage(String),
    #[error("Invalid stage duration {value:?}: {reason}")]
    InvalidDuration { value: String, reason: String },
    #[error("Invalid stage target {0:?}")]
    InvalidTarget(String),
    #[error("Stage target {target} is above the limit of {} virtual users", MAX_TARGET)]
    TargetTooHigh { target: usize },
    #[error("The stages add up to more time than can be represented")]
    DurationOverflow,
}

/// Upper bound on the concurrency a single stage may ask for.
pub const MAX_TARGET: usize = 100_000;

/// Concurrency moves linearly from the previous stage's target to `target` over `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: usize,
}

impl Stage {
    #[must_use]
    pub const fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }
}

impl FromStr for Stage {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (duration, target) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| ProfileError::InvalidStage(s.to_string()))?;

        let duration = humantime::parse_duration(duration.trim()).map_err(|error| {
            ProfileError::InvalidDuration {
                value: duration.to_string(),
                reason: error.to_string(),
            }
        })?;
        let target = target
            .trim()
            .parse()
            .map_err(|_| ProfileError::InvalidTarget(target.to_string()))?;

        Ok(Self { duration, target })
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}",
            humantime::format_duration(self.duration),
            self.target
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProfile {
    stages: Vec<Stage>,
    total: Duration,
}

impl Default for LoadProfile {
    /// Ramp up to 100 users over 30s, hold for 2 minutes, then ramp down over 30s.
    fn default() -> Self {
        Self {
            stages: vec![
                Stage::new(Duration::from_secs(30), 100),
                Stage::new(Duration::from_secs(120), 100),
                Stage::new(Duration::from_secs(30), 0),
            ],
            total: Duration::from_secs(180),
        }
    }
}

impl LoadProfile {
    pub fn new(stages: Vec<Stage>) -> Result<Self, ProfileError> {
        if stages.is_empty() {
            return Err(ProfileError::NoStages);
        }

        let mut total = Duration::ZERO;

        for stage in &stages {
            if stage.target > MAX_TARGET {
                return Err(ProfileError::TargetTooHigh {
                    target: stage.target,
                });
            }

            total = total
                .checked_add(stage.duration)
                .ok_or(ProfileError::DurationOverflow)?;
        }

        Ok(Self { stages, total })
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[must_use]
    pub const fn total_duration(&self) -> Duration {
        self.total
    }

    #[must_use]
    pub fn max_target(&self) -> usize {
        self.stages
            .iter()
            .map(|stage| stage.target)
            .max()
            .unwrap_or(0)
    }

    /// How many virtual users should be running `elapsed` into the test, rounded down. `None`
    /// once the profile is over.
    #[must_use]
    pub fn target_at(&self, elapsed: Duration) -> Option<usize> {
        let mut stage_start = Duration::ZERO;
        let mut previous_target = 0;

        for stage in &self.stages {
            // never overflows, every partial sum is at most `total`
            let stage_end = stage_start + stage.duration;

            if elapsed < stage_end {
                let progress = (elapsed - stage_start).as_secs_f64() / stage.duration.as_secs_f64();

                return Some(interpolate(previous_target, stage.target, progress));
            }

            stage_start = stage_end;
            previous_target = stage.target;
        }

        None
    }
}

#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn interpolate(from: usize, to: usize, progress: f64) -> usize {
    let from = from as f64;
    let to = to as f64;

    (from + (to - from) * progress).floor() as usize
}

impl FromStr for LoadProfile {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stages = s
            .split(',')
            .filter(|stage| !stage.trim().is_empty())
            .map(Stage::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(stages)
    }
}

impl Display for LoadProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, stage) in self.stages.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }

            write!(f, "{stage}")?;
        }

        Ok(())
    }
}
