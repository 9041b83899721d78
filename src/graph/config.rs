//! Layout parameters and their validation.

use super::types::Vec2;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Force-directed layout parameters.
///
/// Defaults reproduce the citation explorer's tuning: a 2400x1800 world with a
/// 120 unit margin, slow cooling and fairly light damping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Repulsion charge for nodes without their own (negative repels)
    pub strength: f64,
    /// Barnes-Hut threshold: larger is faster but coarser
    pub theta: f64,
    /// Separation below which force magnitude stops growing
    pub distance_min: f64,
    /// Separation beyond which direct pairs stop interacting (None = unbounded)
    pub distance_max: Option<f64>,
    /// Fraction of alpha lost per step
    pub alpha_decay: f64,
    /// Alpha below which the layout counts as converged
    pub alpha_min: f64,
    /// Velocity retained after each step (1.0 = frictionless)
    pub velocity_decay: f64,
    /// Point every node is gently pulled toward
    pub center: Vec2,
    /// Centering force strength
    pub center_strength: f64,
    /// Spring stiffness along edges
    pub attraction: f64,
    /// Rest length of a full-weight edge
    pub rest_length: f64,
    /// Extra rest length added as edge weight falls to zero
    pub rest_length_spread: f64,
    pub boundary_margin: f64,
    pub width: f64,
    pub height: f64,
    /// Fraction of velocity kept (and reversed) when a node hits the boundary
    pub bounce: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            strength: -30.0,
            theta: 0.9,
            distance_min: 1.0,
            distance_max: None,
            alpha_decay: 0.003,
            alpha_min: 0.002,
            velocity_decay: 0.65,
            center: Vec2::new(1200.0, 900.0),
            center_strength: 0.0001,
            attraction: 0.06 * 0.015,
            rest_length: 150.0,
            rest_length_spread: 300.0,
            boundary_margin: 120.0,
            width: 2400.0,
            height: 1800.0,
            bounce: 0.4,
        }
    }
}

impl LayoutConfig {
    /// Check every parameter range, reporting the first violation.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let finite = [
            ("strength", self.strength),
            ("center.x", self.center.x),
            ("center.y", self.center.y),
            ("center_strength", self.center_strength),
            ("attraction", self.attraction),
            ("rest_length", self.rest_length),
            ("rest_length_spread", self.rest_length_spread),
            ("boundary_margin", self.boundary_margin),
            ("width", self.width),
            ("height", self.height),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ConfigurationError::NonFinite { name, value });
            }
        }

        let non_negative = [
            ("center_strength", self.center_strength),
            ("attraction", self.attraction),
            ("rest_length", self.rest_length),
            ("rest_length_spread", self.rest_length_spread),
            ("boundary_margin", self.boundary_margin),
        ];
        for (name, value) in non_negative {
            if value < 0.0 {
                return Err(ConfigurationError::Negative { name, value });
            }
        }

        if !(self.theta.is_finite() && self.theta > 0.0) {
            return Err(ConfigurationError::Theta(self.theta));
        }
        if !(self.distance_min.is_finite() && self.distance_min >= 0.0) {
            return Err(ConfigurationError::DistanceMin(self.distance_min));
        }
        if let Some(max) = self.distance_max {
            // NaN fails the comparison and lands here too
            if !(max > self.distance_min) {
                return Err(ConfigurationError::DistanceRange {
                    min: self.distance_min,
                    max,
                });
            }
        }
        if !(self.alpha_decay > 0.0 && self.alpha_decay < 1.0) {
            return Err(ConfigurationError::AlphaDecay(self.alpha_decay));
        }
        if !(self.alpha_min > 0.0 && self.alpha_min < 1.0) {
            return Err(ConfigurationError::AlphaMin(self.alpha_min));
        }
        if !(0.0..=1.0).contains(&self.velocity_decay) {
            return Err(ConfigurationError::VelocityDecay(self.velocity_decay));
        }
        if !(self.bounce >= 0.0 && self.bounce < 1.0) {
            return Err(ConfigurationError::Bounce(self.bounce));
        }
        if self.width <= 2.0 * self.boundary_margin || self.height <= 2.0 * self.boundary_margin {
            return Err(ConfigurationError::Boundary {
                margin: self.boundary_margin,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Check a restart value for `reheat`.
    pub fn validate_alpha(alpha: f64) -> Result<(), ConfigurationError> {
        if alpha.is_finite() && alpha > 0.0 && alpha <= 1.0 {
            Ok(())
        } else {
            Err(ConfigurationError::Alpha(alpha))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(LayoutConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_non_positive_theta() {
        let config = LayoutConfig {
            theta: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigurationError::Theta(0.0)));

        let config = LayoutConfig {
            theta: -0.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigurationError::Theta(-0.5)));
    }

    #[test]
    fn test_rejects_inverted_distance_range() {
        let config = LayoutConfig {
            distance_min: 10.0,
            distance_max: Some(10.0),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::DistanceRange { min: 10.0, max: 10.0 })
        );

        let config = LayoutConfig {
            distance_min: -1.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigurationError::DistanceMin(-1.0)));
    }

    #[test]
    fn test_rejects_decay_outside_unit_interval() {
        for alpha_decay in [0.0, 1.0, 1.5, f64::NAN] {
            let config = LayoutConfig {
                alpha_decay,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigurationError::AlphaDecay(_))
            ));
        }
        for velocity_decay in [-0.1, 1.01] {
            let config = LayoutConfig {
                velocity_decay,
                ..Default::default()
            };
            assert_eq!(
                config.validate(),
                Err(ConfigurationError::VelocityDecay(velocity_decay))
            );
        }
        // Both ends of the damping range are allowed
        for velocity_decay in [0.0, 1.0] {
            let config = LayoutConfig {
                velocity_decay,
                ..Default::default()
            };
            assert_eq!(config.validate(), Ok(()));
        }
    }

    #[test]
    fn test_rejects_boundary_without_interior() {
        let config = LayoutConfig {
            boundary_margin: 50.0,
            width: 100.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::Boundary { .. })
        ));
    }

    #[test]
    fn test_rejects_elastic_bounce() {
        let config = LayoutConfig {
            bounce: 1.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigurationError::Bounce(1.0)));
    }

    #[test]
    fn test_validate_alpha() {
        assert!(LayoutConfig::validate_alpha(0.5).is_ok());
        assert!(LayoutConfig::validate_alpha(1.0).is_ok());
        assert!(LayoutConfig::validate_alpha(0.0).is_err());
        assert!(LayoutConfig::validate_alpha(f64::INFINITY).is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LayoutConfig = serde_json::from_str(r#"{"theta": 0.5}"#).unwrap();
        assert_eq!(config.theta, 0.5);
        assert_eq!(config.alpha_decay, LayoutConfig::default().alpha_decay);
    }
}
