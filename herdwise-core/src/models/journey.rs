use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Ordered top-level sections of a journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Herd,
    Grazing,
    LandUseChange,
    Energy,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Herd,
        Phase::Grazing,
        Phase::LandUseChange,
        Phase::Energy,
    ];

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Option<Phase> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<Phase> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn is_last(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Herd => write!(f, "herd"),
            Phase::Grazing => write!(f, "grazing"),
            Phase::LandUseChange => write!(f, "land-use-change"),
            Phase::Energy => write!(f, "energy"),
        }
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "herd" | "rebanho" => Ok(Phase::Herd),
            "grazing" | "pastagem" => Ok(Phase::Grazing),
            "land-use-change" | "mudanca-uso-solo" => Ok(Phase::LandUseChange),
            "energy" | "energia" => Ok(Phase::Energy),
            _ => Err(format!(
                "Invalid phase '{}'. Valid options: herd, grazing, land-use-change, energy",
                s
            )),
        }
    }
}

/// Sub-tabs of the Herd phase, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HerdTab {
    Information,
    Nutrition,
    Management,
}

impl HerdTab {
    pub const ALL: [HerdTab; 3] = [
        HerdTab::Information,
        HerdTab::Nutrition,
        HerdTab::Management,
    ];

    pub fn next(self) -> Option<HerdTab> {
        match self {
            HerdTab::Information => Some(HerdTab::Nutrition),
            HerdTab::Nutrition => Some(HerdTab::Management),
            HerdTab::Management => None,
        }
    }

    pub fn previous(self) -> Option<HerdTab> {
        match self {
            HerdTab::Information => None,
            HerdTab::Nutrition => Some(HerdTab::Information),
            HerdTab::Management => Some(HerdTab::Nutrition),
        }
    }

    /// Label shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            HerdTab::Information => "Informações",
            HerdTab::Nutrition => "Nutrição",
            HerdTab::Management => "Manejo",
        }
    }
}

impl fmt::Display for HerdTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HerdTab::Information => write!(f, "information"),
            HerdTab::Nutrition => write!(f, "nutrition"),
            HerdTab::Management => write!(f, "management"),
        }
    }
}

impl FromStr for HerdTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "information" | "informacoes" | "informações" => Ok(HerdTab::Information),
            "nutrition" | "nutricao" | "nutrição" => Ok(HerdTab::Nutrition),
            "management" | "manejo" => Ok(HerdTab::Management),
            _ => Err(format!(
                "Invalid tab '{}'. Valid options: information, nutrition, management",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyStatus {
    Draft,
    InProgress,
    Completed,
}

impl fmt::Display for JourneyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JourneyStatus::Draft => write!(f, "draft"),
            JourneyStatus::InProgress => write!(f, "in progress"),
            JourneyStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Journey {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
    pub current_phase: Phase,
    pub herd_tab: HerdTab,
    pub completed_phases: BTreeSet<Phase>,
    pub status: JourneyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Journey {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            name: name.into(),
            current_phase: Phase::Herd,
            herd_tab: HerdTab::Information,
            completed_phases: BTreeSet::new(),
            status: JourneyStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_phase_complete(&self, phase: Phase) -> bool {
        self.completed_phases.contains(&phase)
    }

    /// True when every phase before `phase` has been completed.
    pub fn is_phase_unlocked(&self, phase: Phase) -> bool {
        Phase::ALL[..phase.index()]
            .iter()
            .all(|p| self.is_phase_complete(*p))
    }

    /// Marks `phase` complete and moves the pointer past it.
    pub fn complete_phase(&mut self, phase: Phase) {
        self.completed_phases.insert(phase);
        if let Some(next) = phase.next() {
            self.current_phase = next;
        }
        self.status = if Phase::ALL.iter().all(|p| self.is_phase_complete(*p)) {
            JourneyStatus::Completed
        } else {
            JourneyStatus::InProgress
        };
        self.updated_at = Utc::now();
    }
}

impl fmt::Display for Journey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.chars().count()))?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Phase: {}", self.current_phase)?;
        if self.current_phase == Phase::Herd {
            writeln!(f, "Tab: {}", self.herd_tab.label())?;
        }
        for phase in Phase::ALL {
            let mark = if self.is_phase_complete(phase) { "x" } else { " " };
            writeln!(f, "  [{}] {}", mark, phase)?;
        }
        Ok(())
    }
}
