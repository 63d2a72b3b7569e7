//! Static routing table: risk level → department, priority, expected wait.

use serde::Serialize;

use super::types::{Department, Priority, RiskLevel};

pub const EMERGENCY_WAIT: &str = "10 mins";
pub const STANDARD_WAIT: &str = "45 mins";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub department: Department,
    pub priority: Priority,
    pub wait_time: &'static str,
}

/// Route a final risk level. A department chosen by a safety override is
/// kept as-is; priority and wait always follow the risk level.
pub fn resolve(risk_level: RiskLevel, override_department: Option<Department>) -> Route {
    let (department, priority, wait_time) = match risk_level {
        RiskLevel::High => (Department::Cardiology, Priority::Emergency, EMERGENCY_WAIT),
        RiskLevel::Medium => (Department::InternalMedicine, Priority::Normal, STANDARD_WAIT),
        RiskLevel::Low => (Department::GeneralPractice, Priority::Normal, STANDARD_WAIT),
    };

    Route {
        department: override_department.unwrap_or(department),
        priority,
        wait_time,
    }
}
