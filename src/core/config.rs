use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub planner: PlannerConfig,
}

/// Tunables for the assignment run.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Maximum points per route when a collector does not declare a capacity.
    pub max_points_per_route: u32,
    /// Pending points dated within this many days of the run date are eligible.
    pub planning_horizon_days: u32,
    /// Assumed collection time per point, used for route duration estimates.
    pub minutes_per_point: u32,
    /// Assumed average driving speed for duration estimates, in km/h.
    pub average_speed_kmh: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            planner: PlannerConfig::from_env()?,
        })
    }
}

impl PlannerConfig {
    const DEFAULT_MAX_POINTS_PER_ROUTE: u32 = 20;
    const DEFAULT_PLANNING_HORIZON_DAYS: u32 = 7;
    const DEFAULT_MINUTES_PER_POINT: u32 = 15;
    const DEFAULT_AVERAGE_SPEED_KMH: f64 = 30.0;

    pub fn from_env() -> Result<Self, String> {
        let max_points_per_route = env::var("PLANNER_MAX_POINTS_PER_ROUTE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_POINTS_PER_ROUTE.to_string())
            .parse::<u32>()
            .map_err(|e| format!("Invalid PLANNER_MAX_POINTS_PER_ROUTE: {}", e))?;

        let planning_horizon_days = env::var("PLANNER_HORIZON_DAYS")
            .unwrap_or_else(|_| Self::DEFAULT_PLANNING_HORIZON_DAYS.to_string())
            .parse::<u32>()
            .map_err(|e| format!("Invalid PLANNER_HORIZON_DAYS: {}", e))?;

        let minutes_per_point = env::var("PLANNER_MINUTES_PER_POINT")
            .unwrap_or_else(|_| Self::DEFAULT_MINUTES_PER_POINT.to_string())
            .parse::<u32>()
            .map_err(|e| format!("Invalid PLANNER_MINUTES_PER_POINT: {}", e))?;

        let average_speed_kmh = env::var("PLANNER_AVERAGE_SPEED_KMH")
            .unwrap_or_else(|_| Self::DEFAULT_AVERAGE_SPEED_KMH.to_string())
            .parse::<f64>()
            .map_err(|e| format!("Invalid PLANNER_AVERAGE_SPEED_KMH: {}", e))?;

        if max_points_per_route == 0 {
            return Err("PLANNER_MAX_POINTS_PER_ROUTE must be at least 1".to_string());
        }
        if average_speed_kmh <= 0.0 {
            return Err("PLANNER_AVERAGE_SPEED_KMH must be positive".to_string());
        }

        Ok(PlannerConfig {
            max_points_per_route,
            planning_horizon_days,
            minutes_per_point,
            average_speed_kmh,
        })
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            max_points_per_route: Self::DEFAULT_MAX_POINTS_PER_ROUTE,
            planning_horizon_days: Self::DEFAULT_PLANNING_HORIZON_DAYS,
            minutes_per_point: Self::DEFAULT_MINUTES_PER_POINT,
            average_speed_kmh: Self::DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_planner_config_is_valid() {
        let config = PlannerConfig::default();
        assert!(config.max_points_per_route >= 1);
        assert!(config.average_speed_kmh > 0.0);
    }
}
