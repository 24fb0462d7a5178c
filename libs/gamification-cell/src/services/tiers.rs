//! One generic tier table serves both pin families. Thresholds are strictly
//! increasing and the first entry is always the base tier at 0, which never
//! fires an unlock.

use crate::models::PinType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    pub threshold: u32,
    pub name: &'static str,
    pub image: &'static str,
}

#[derive(Debug, Clone)]
pub struct TierTable {
    pin_type: PinType,
    tiers: &'static [Tier],
}

const HYDRATION_TIERS: &[Tier] = &[
    Tier { threshold: 0, name: "first-drop", image: "pins/hydration/first_drop.png" },
    Tier { threshold: 5, name: "bronze-drop", image: "pins/hydration/bronze_drop.png" },
    Tier { threshold: 15, name: "silver-stream", image: "pins/hydration/silver_stream.png" },
    Tier { threshold: 30, name: "golden-wave", image: "pins/hydration/golden_wave.png" },
    Tier { threshold: 60, name: "crystal-cascade", image: "pins/hydration/crystal_cascade.png" },
];

const TASK_TIERS: &[Tier] = &[
    Tier { threshold: 0, name: "getting-started", image: "pins/tasks/getting_started.png" },
    Tier { threshold: 1, name: "full-week", image: "pins/tasks/full_week.png" },
    Tier { threshold: 5, name: "habit-builder", image: "pins/tasks/habit_builder.png" },
    Tier { threshold: 10, name: "routine-master", image: "pins/tasks/routine_master.png" },
    Tier { threshold: 25, name: "lifestyle-champion", image: "pins/tasks/lifestyle_champion.png" },
];

impl TierTable {
    pub fn hydration() -> Self {
        Self {
            pin_type: PinType::Hydration,
            tiers: HYDRATION_TIERS,
        }
    }

    pub fn tasks() -> Self {
        Self {
            pin_type: PinType::Task,
            tiers: TASK_TIERS,
        }
    }

    pub fn pin_type(&self) -> PinType {
        self.pin_type
    }

    pub fn base(&self) -> &'static Tier {
        &self.tiers[0]
    }

    /// The last tier whose threshold does not exceed the counter; the base
    /// tier when nothing else qualifies.
    pub fn highest_for(&self, counter: u32) -> &'static Tier {
        self.tiers
            .iter()
            .rev()
            .find(|tier| tier.threshold <= counter)
            .unwrap_or_else(|| self.base())
    }

    pub fn tiers(&self) -> &'static [Tier] {
        self.tiers
    }
}
