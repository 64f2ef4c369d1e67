//! Simulation scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// SIM-001: lock every matching pwner column until all are chosen
    PwnerSweep,

    /// SIM-002: lock columns until one row remains, then commit it
    Deduction,

    /// SIM-003: commit a random row without using the pwner
    BlindGuess,

    /// SIM-004: feed malformed and out-of-range commands
    GarbageInput,

    /// SIM-005: hundreds of ticks with some columns chosen
    ChosenDrift,

    /// SIM-006: the full session loop over a virtual clock
    SessionLoop,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::PwnerSweep,
            ScenarioId::Deduction,
            ScenarioId::BlindGuess,
            ScenarioId::GarbageInput,
            ScenarioId::ChosenDrift,
            ScenarioId::SessionLoop,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::PwnerSweep => "pwner_sweep",
            ScenarioId::Deduction => "deduction",
            ScenarioId::BlindGuess => "blind_guess",
            ScenarioId::GarbageInput => "garbage_input",
            ScenarioId::ChosenDrift => "chosen_drift",
            ScenarioId::SessionLoop => "session_loop",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::PwnerSweep => "Lock every Active pwner column; win by full lock-in or stall on the last column",
            ScenarioId::Deduction => "Narrow the matrix through lock-ins, commit the last selectable row",
            ScenarioId::BlindGuess => "Commit a random selectable row; Won iff it was the key",
            ScenarioId::GarbageInput => "Malformed and out-of-range commands never change the game",
            ScenarioId::ChosenDrift => "Chosen columns keep their fragment across hundreds of ticks",
            ScenarioId::SessionLoop => "GameSession over a virtual clock and scripted input reaches Won",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pwner_sweep" | "pwnersweep" | "sim-001" => Ok(ScenarioId::PwnerSweep),
            "deduction" | "sim-002" => Ok(ScenarioId::Deduction),
            "blind_guess" | "blindguess" | "sim-003" => Ok(ScenarioId::BlindGuess),
            "garbage_input" | "garbageinput" | "sim-004" => Ok(ScenarioId::GarbageInput),
            "chosen_drift" | "chosendrift" | "sim-005" => Ok(ScenarioId::ChosenDrift),
            "session_loop" | "sessionloop" | "sim-006" => Ok(ScenarioId::SessionLoop),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
